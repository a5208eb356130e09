//! Threshold gate: the publish/discard decision.

use psynews_core::EvaluatedArticle;

/// Accept iff `total_score >= threshold`.
///
/// A pure predicate with no memory of prior runs. The display banding
/// (gold/silver/bronze) is independent of this decision.
#[must_use]
pub fn passes_threshold(article: &EvaluatedArticle, threshold: u8) -> bool {
    article.total_score >= threshold
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use psynews_core::{EvidenceLevel, ExtractedFeatures, RawArticle, StudyDesign};

    use super::*;

    fn evaluated(total_score: u8) -> EvaluatedArticle {
        EvaluatedArticle {
            raw: RawArticle {
                title: "t".to_string(),
                source: "s".to_string(),
                url: "https://example.org/a".to_string(),
                category: "research".to_string(),
                body: String::new(),
                published_date: chrono::NaiveDate::from_ymd_opt(2025, 6, 1),
                sample_size: None,
                effect_size: None,
            },
            features: ExtractedFeatures {
                study_design: StudyDesign::Unknown,
                sample_size: None,
                effect_size: None,
                recency_days: 0,
                future_dated: false,
                safety_flags: vec![],
                practical_applicability: 0,
            },
            total_score,
            score_breakdown: BTreeMap::new(),
            evidence_level: EvidenceLevel::from_score(total_score),
        }
    }

    #[test]
    fn accepts_at_and_above_threshold() {
        assert!(passes_threshold(&evaluated(70), 70));
        assert!(passes_threshold(&evaluated(100), 70));
    }

    #[test]
    fn rejects_one_point_below_threshold() {
        assert!(!passes_threshold(&evaluated(69), 70));
    }

    #[test]
    fn zero_threshold_accepts_everything() {
        assert!(passes_threshold(&evaluated(0), 0));
    }

    #[test]
    fn bronze_article_passes_a_low_threshold() {
        let article = evaluated(55);
        assert_eq!(article.evidence_level, EvidenceLevel::Bronze);
        assert!(passes_threshold(&article, 50));
    }
}
