use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A raw article record as produced by a collector.
///
/// Immutable once collected; the pipeline never edits these fields, it only
/// derives new structures from them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawArticle {
    pub title: String,
    /// Human-readable source name, e.g. `"PsyPost"` or `"PubMed"`.
    pub source: String,
    pub url: String,
    /// Site category assigned by the collector, e.g. `"research"`.
    pub category: String,
    /// Abstract or summary text. Headline statistics are expected near the
    /// start of this field.
    pub body: String,
    pub published_date: Option<NaiveDate>,
    /// Sample size when the source provides it as structured metadata.
    pub sample_size: Option<u32>,
    /// Stated effect size (Cohen's d scale) when provided as metadata.
    pub effect_size: Option<f64>,
}

impl RawArticle {
    /// Whether the record carries the minimum fields the pipeline requires.
    ///
    /// Articles missing a title, source, or publication date are skipped
    /// before scoring and reported as a skipped-input count.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        !self.title.trim().is_empty()
            && !self.source.trim().is_empty()
            && self.published_date.is_some()
    }
}

/// Study-design category, ordered from most to least rigorous.
///
/// The derived `Ord` follows declaration order, so `MetaAnalysis` compares
/// smallest. When several design patterns match the same text, the smallest
/// (most rigorous) variant wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StudyDesign {
    MetaAnalysis,
    Rct,
    Cohort,
    CrossSectional,
    CaseStudy,
    Unknown,
}

impl std::fmt::Display for StudyDesign {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StudyDesign::MetaAnalysis => "meta-analysis",
            StudyDesign::Rct => "rct",
            StudyDesign::Cohort => "cohort",
            StudyDesign::CrossSectional => "cross-sectional",
            StudyDesign::CaseStudy => "case-study",
            StudyDesign::Unknown => "unknown",
        };
        write!(f, "{name}")
    }
}

/// Structured signals derived from one [`RawArticle`].
///
/// Produced by the feature extractor and consumed read-only by the scoring
/// engine. Fields that could not be confidently extracted are `None` /
/// `Unknown` rather than errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedFeatures {
    pub study_design: StudyDesign,
    pub sample_size: Option<u32>,
    /// Effect size normalized to Cohen's d (r and odds ratios are converted).
    pub effect_size: Option<f64>,
    /// Article age in days at evaluation time. Never negative.
    pub recency_days: i64,
    /// Set when the publication date was in the future and the age was
    /// clamped to zero. Flagged for review, not treated as an error.
    pub future_dated: bool,
    /// Concern tags such as `"invasive"` or `"experimental-drug"`.
    pub safety_flags: Vec<String>,
    /// Raw actionable-advice keyword score; the rubric caps the points
    /// actually awarded.
    pub practical_applicability: u8,
}

/// Display banding for article quality.
///
/// This banding is fixed (gold >= 85, silver 70-84, bronze < 70) and is
/// independent of the configurable publish threshold: a bronze article can
/// still be published when the threshold is set below 70.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceLevel {
    Gold,
    Silver,
    Bronze,
}

impl EvidenceLevel {
    #[must_use]
    pub fn from_score(score: u8) -> Self {
        match score {
            85.. => EvidenceLevel::Gold,
            70..=84 => EvidenceLevel::Silver,
            _ => EvidenceLevel::Bronze,
        }
    }
}

impl std::fmt::Display for EvidenceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EvidenceLevel::Gold => "gold",
            EvidenceLevel::Silver => "silver",
            EvidenceLevel::Bronze => "bronze",
        };
        write!(f, "{name}")
    }
}

/// A scored article: the raw record, its extracted features, and the rubric
/// outcome. Immutable once created by the scoring engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluatedArticle {
    pub raw: RawArticle,
    pub features: ExtractedFeatures,
    /// Total quality score in `[0, 100]`. Always equals the sum of
    /// `score_breakdown` values.
    pub total_score: u8,
    /// Points awarded per rubric criterion.
    pub score_breakdown: BTreeMap<String, u8>,
    pub evidence_level: EvidenceLevel,
}
