//! Pure scoring: extracted features in, bounded score and tier out.
//!
//! All cutoffs and point values come from the [`Rubric`]; nothing here
//! reads a clock or any other external state, so identical features always
//! produce identical scores.

use std::collections::BTreeMap;

use psynews_core::{EvaluatedArticle, EvidenceLevel, ExtractedFeatures, RawArticle, Rubric};

/// Criterion keys used in the score breakdown, in rubric priority order.
/// When a sum exceeds 100 the overflow is trimmed from the end of this
/// list backwards, so the breakdown always sums to the clamped total.
const CRITERIA: &[&str] = &[
    "study_design",
    "sample_size",
    "effect_size",
    "practical_applicability",
    "safety",
    "recency",
];

/// Score extracted features against the rubric and assemble the immutable
/// [`EvaluatedArticle`].
#[must_use]
pub fn evaluate(raw: RawArticle, features: ExtractedFeatures, rubric: &Rubric) -> EvaluatedArticle {
    let (total_score, score_breakdown, evidence_level) = score_features(&features, rubric);
    EvaluatedArticle {
        raw,
        features,
        total_score,
        score_breakdown,
        evidence_level,
    }
}

/// Compute the per-criterion breakdown, the clamped total, and the fixed
/// display banding. The breakdown always sums to the returned total.
#[must_use]
pub fn score_features(
    features: &ExtractedFeatures,
    rubric: &Rubric,
) -> (u8, BTreeMap<String, u8>, EvidenceLevel) {
    let mut points: BTreeMap<&str, u8> = BTreeMap::new();
    points.insert("study_design", rubric.design.for_design(features.study_design));
    points.insert("sample_size", sample_size_points(features.sample_size, rubric));
    points.insert("effect_size", effect_size_points(features.effect_size, rubric));
    points.insert(
        "practical_applicability",
        features
            .practical_applicability
            .min(rubric.applicability_max),
    );
    points.insert("safety", safety_points(&features.safety_flags, rubric));
    points.insert("recency", recency_points(features.recency_days, rubric));

    let mut total: u16 = points.values().map(|&p| u16::from(p)).sum();

    // The rubric maxima sum past 100 by design; trim any overflow from the
    // lowest-priority criteria so the breakdown still sums to the total.
    if total > 100 {
        let mut overflow = total - 100;
        for key in CRITERIA.iter().rev() {
            if overflow == 0 {
                break;
            }
            let value = points.get_mut(key).expect("criterion key");
            let cut = overflow.min(u16::from(*value));
            *value -= u8::try_from(cut).expect("cut <= u8 value");
            overflow -= cut;
        }
        total = 100;
    }

    #[allow(clippy::cast_possible_truncation)]
    let total = total as u8;
    let breakdown = points
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    (total, breakdown, EvidenceLevel::from_score(total))
}

fn sample_size_points(sample_size: Option<u32>, rubric: &Rubric) -> u8 {
    let Some(n) = sample_size else { return 0 };
    rubric
        .sample_size_bands
        .iter()
        .rev()
        .find(|band| n >= band.min_n)
        .map_or(0, |band| band.points.min(rubric.sample_size_max))
}

fn effect_size_points(effect_size: Option<f64>, rubric: &Rubric) -> u8 {
    let Some(d) = effect_size else { return 0 };
    let magnitude = d.abs();
    rubric
        .effect_size_bands
        .iter()
        .rev()
        .find(|band| magnitude >= band.min_magnitude)
        .map_or(0, |band| band.points.min(rubric.effect_size_max))
}

fn safety_points(flags: &[String], rubric: &Rubric) -> u8 {
    let penalty = rubric
        .safety_penalty_per_flag
        .saturating_mul(u8::try_from(flags.len()).unwrap_or(u8::MAX));
    rubric.safety_max.saturating_sub(penalty)
}

fn recency_points(recency_days: i64, rubric: &Rubric) -> u8 {
    if recency_days > rubric.recency_horizon_days {
        return 0;
    }
    rubric
        .recency_bands
        .iter()
        .find(|band| recency_days <= band.max_days)
        .map_or(0, |band| band.points.min(rubric.recency_max))
}

#[cfg(test)]
mod tests {
    use psynews_core::StudyDesign;

    use super::*;

    fn features(design: StudyDesign) -> ExtractedFeatures {
        ExtractedFeatures {
            study_design: design,
            sample_size: None,
            effect_size: None,
            recency_days: 10,
            future_dated: false,
            safety_flags: vec![],
            practical_applicability: 0,
        }
    }

    #[test]
    fn breakdown_always_sums_to_total() {
        let rubric = Rubric::default();
        let mut f = features(StudyDesign::MetaAnalysis);
        f.sample_size = Some(50_000);
        f.effect_size = Some(1.5);
        f.practical_applicability = 15;
        let (total, breakdown, _) = score_features(&f, &rubric);
        let sum: u16 = breakdown.values().map(|&v| u16::from(v)).sum();
        assert_eq!(u16::from(total), sum, "breakdown {breakdown:?} must sum to {total}");
        assert!(total <= 100);
    }

    #[test]
    fn overflow_is_trimmed_to_exactly_100() {
        let rubric = Rubric::default();
        // Maximum on every criterion: 40 + 15 + 20 + 15 + 10 + 10 = 110.
        let mut f = features(StudyDesign::MetaAnalysis);
        f.sample_size = Some(50_000);
        f.effect_size = Some(2.0);
        f.practical_applicability = 15;
        let (total, breakdown, level) = score_features(&f, &rubric);
        assert_eq!(total, 100);
        assert_eq!(level, EvidenceLevel::Gold);
        // Overflow (10) is trimmed from recency first.
        assert_eq!(breakdown["recency"], 0);
        assert_eq!(breakdown["safety"], 10);
    }

    #[test]
    fn gold_scenario_rct_with_strong_stats() {
        // RCT, n = 342, d = 0.82, 10 days old, no safety flags.
        let rubric = Rubric::default();
        let mut f = features(StudyDesign::Rct);
        f.sample_size = Some(342);
        f.effect_size = Some(0.82);
        let (total, breakdown, level) = score_features(&f, &rubric);
        assert_eq!(breakdown["study_design"], 35);
        assert_eq!(breakdown["sample_size"], 12);
        assert_eq!(breakdown["effect_size"], 18);
        assert_eq!(breakdown["safety"], 10);
        assert_eq!(breakdown["recency"], 10);
        assert_eq!(total, 85);
        assert_eq!(level, EvidenceLevel::Gold);
    }

    #[test]
    fn unknown_everything_cannot_leave_bronze() {
        let rubric = Rubric::default();
        let mut f = features(StudyDesign::Unknown);
        f.practical_applicability = 15;
        let (total, breakdown, level) = score_features(&f, &rubric);
        assert_eq!(breakdown["study_design"], 0);
        assert_eq!(breakdown["sample_size"], 0);
        assert_eq!(breakdown["effect_size"], 0);
        // Safety + recency + applicability top out at 35 — bronze by construction.
        assert_eq!(total, 35);
        assert_eq!(level, EvidenceLevel::Bronze);
    }

    #[test]
    fn effect_size_uses_magnitude() {
        let rubric = Rubric::default();
        let mut f = features(StudyDesign::Unknown);
        f.effect_size = Some(-0.82);
        let (_, breakdown, _) = score_features(&f, &rubric);
        assert_eq!(breakdown["effect_size"], 18);
    }

    #[test]
    fn trivial_effect_scores_zero() {
        let rubric = Rubric::default();
        let mut f = features(StudyDesign::Unknown);
        f.effect_size = Some(0.01);
        let (_, breakdown, _) = score_features(&f, &rubric);
        assert_eq!(breakdown["effect_size"], 0);
    }

    #[test]
    fn tiny_sample_scores_zero() {
        let rubric = Rubric::default();
        let mut f = features(StudyDesign::Unknown);
        f.sample_size = Some(5);
        let (_, breakdown, _) = score_features(&f, &rubric);
        assert_eq!(breakdown["sample_size"], 0);
    }

    #[test]
    fn safety_penalty_floors_at_zero() {
        let rubric = Rubric::default();
        let mut f = features(StudyDesign::Unknown);
        f.safety_flags = vec![
            "invasive".to_string(),
            "experimental-drug".to_string(),
            "adverse-events".to_string(),
        ];
        let (_, breakdown, _) = score_features(&f, &rubric);
        assert_eq!(breakdown["safety"], 0);
    }

    #[test]
    fn one_safety_flag_halves_safety_points() {
        let rubric = Rubric::default();
        let mut f = features(StudyDesign::Unknown);
        f.safety_flags = vec!["invasive".to_string()];
        let (_, breakdown, _) = score_features(&f, &rubric);
        assert_eq!(breakdown["safety"], 5);
    }

    #[test]
    fn recency_beyond_horizon_scores_zero() {
        let rubric = Rubric::default();
        let mut f = features(StudyDesign::Unknown);
        f.recency_days = rubric.recency_horizon_days + 1;
        let (_, breakdown, _) = score_features(&f, &rubric);
        assert_eq!(breakdown["recency"], 0);
    }

    #[test]
    fn recency_decays_with_age() {
        let rubric = Rubric::default();
        let ages = [0_i64, 100, 500, 1_500, 2_000];
        let mut last = u8::MAX;
        for age in ages {
            let mut f = features(StudyDesign::Unknown);
            f.recency_days = age;
            let (_, breakdown, _) = score_features(&f, &rubric);
            let points = breakdown["recency"];
            assert!(points <= last, "recency must not increase with age");
            last = points;
        }
    }

    #[test]
    fn scoring_is_deterministic() {
        let rubric = Rubric::default();
        let mut f = features(StudyDesign::Rct);
        f.sample_size = Some(342);
        f.effect_size = Some(0.82);
        let a = score_features(&f, &rubric);
        let b = score_features(&f, &rubric);
        assert_eq!(a, b);
    }
}
