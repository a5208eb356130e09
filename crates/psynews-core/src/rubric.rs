use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::article::StudyDesign;

#[derive(Debug, Error)]
pub enum RubricError {
    #[error("failed to read rubric file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse rubric file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("invalid rubric: {0}")]
    Invalid(String),
}

/// Points per study design, keyed by rigor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignPoints {
    pub meta_analysis: u8,
    pub rct: u8,
    pub cohort: u8,
    pub cross_sectional: u8,
    pub case_study: u8,
    pub unknown: u8,
}

impl Default for DesignPoints {
    fn default() -> Self {
        Self {
            meta_analysis: 40,
            rct: 35,
            cohort: 25,
            cross_sectional: 15,
            case_study: 5,
            unknown: 0,
        }
    }
}

impl DesignPoints {
    #[must_use]
    pub fn for_design(&self, design: StudyDesign) -> u8 {
        match design {
            StudyDesign::MetaAnalysis => self.meta_analysis,
            StudyDesign::Rct => self.rct,
            StudyDesign::Cohort => self.cohort,
            StudyDesign::CrossSectional => self.cross_sectional,
            StudyDesign::CaseStudy => self.case_study,
            StudyDesign::Unknown => self.unknown,
        }
    }
}

/// One step of the sample-size function: sizes of at least `min_n` earn
/// `points` (unless a later band with a larger `min_n` also matches).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleBand {
    pub min_n: u32,
    pub points: u8,
}

/// One step of the effect-size function over `|d|`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectBand {
    pub min_magnitude: f64,
    pub points: u8,
}

/// One step of the recency decay: ages up to `max_days` earn `points`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecencyBand {
    pub max_days: i64,
    pub points: u8,
}

/// The evidence-quality rubric: every cutoff and point value the scoring
/// engine uses, as data. The `Default` impl encodes the documented bands;
/// a YAML file can override any field.
///
/// Band tables are ordered ascending by their cutoff and must be monotonic:
/// a larger sample or effect never scores fewer points, and an older article
/// never scores more. [`Rubric::validate`] enforces this on overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Rubric {
    pub design: DesignPoints,
    pub sample_size_bands: Vec<SampleBand>,
    pub sample_size_max: u8,
    pub effect_size_bands: Vec<EffectBand>,
    pub effect_size_max: u8,
    pub applicability_max: u8,
    pub safety_max: u8,
    pub safety_penalty_per_flag: u8,
    pub recency_bands: Vec<RecencyBand>,
    pub recency_max: u8,
    /// Articles older than this score zero recency points.
    pub recency_horizon_days: i64,
}

impl Default for Rubric {
    fn default() -> Self {
        Self {
            design: DesignPoints::default(),
            sample_size_bands: vec![
                SampleBand { min_n: 10, points: 4 },
                SampleBand { min_n: 50, points: 6 },
                SampleBand { min_n: 100, points: 9 },
                SampleBand { min_n: 300, points: 12 },
                SampleBand { min_n: 1_000, points: 14 },
                SampleBand { min_n: 10_000, points: 15 },
            ],
            sample_size_max: 15,
            effect_size_bands: vec![
                EffectBand { min_magnitude: 0.05, points: 4 },
                EffectBand { min_magnitude: 0.2, points: 9 },
                EffectBand { min_magnitude: 0.5, points: 14 },
                EffectBand { min_magnitude: 0.8, points: 18 },
                EffectBand { min_magnitude: 1.2, points: 20 },
            ],
            effect_size_max: 20,
            applicability_max: 15,
            safety_max: 10,
            safety_penalty_per_flag: 5,
            recency_bands: vec![
                RecencyBand { max_days: 30, points: 10 },
                RecencyBand { max_days: 365, points: 8 },
                RecencyBand { max_days: 1_095, points: 5 },
                RecencyBand { max_days: 1_825, points: 2 },
            ],
            recency_max: 10,
            recency_horizon_days: 1_825,
        }
    }
}

impl Rubric {
    /// Load a rubric from a YAML file, falling back to defaults for any
    /// omitted field, then validate it.
    ///
    /// # Errors
    ///
    /// Returns `RubricError` on I/O failure, malformed YAML, or a rubric
    /// that violates the monotonicity/cap rules.
    pub fn load(path: &Path) -> Result<Self, RubricError> {
        let raw = std::fs::read_to_string(path).map_err(|source| RubricError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let rubric: Rubric = serde_yaml::from_str(&raw).map_err(|source| RubricError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        rubric.validate()?;
        Ok(rubric)
    }

    /// Checks the structural rules the scoring engine relies on.
    ///
    /// # Errors
    ///
    /// Returns `RubricError::Invalid` naming the first violated rule.
    pub fn validate(&self) -> Result<(), RubricError> {
        let d = &self.design;
        let rigor_order = [
            d.meta_analysis,
            d.rct,
            d.cohort,
            d.cross_sectional,
            d.case_study,
            d.unknown,
        ];
        if rigor_order.windows(2).any(|w| w[0] < w[1]) {
            return Err(RubricError::Invalid(
                "design points must not increase as rigor decreases".to_string(),
            ));
        }

        check_bands(
            "sample_size_bands",
            self.sample_size_bands.iter().map(|b| (f64::from(b.min_n), b.points)),
            self.sample_size_max,
        )?;
        check_bands(
            "effect_size_bands",
            self.effect_size_bands.iter().map(|b| (b.min_magnitude, b.points)),
            self.effect_size_max,
        )?;

        // Recency bands run the other way: points decay as max_days grows.
        let mut prev: Option<(i64, u8)> = None;
        for band in &self.recency_bands {
            if let Some((prev_days, prev_points)) = prev {
                if band.max_days <= prev_days {
                    return Err(RubricError::Invalid(
                        "recency_bands must be ordered by ascending max_days".to_string(),
                    ));
                }
                if band.points > prev_points {
                    return Err(RubricError::Invalid(
                        "recency points must not increase with age".to_string(),
                    ));
                }
            }
            if band.points > self.recency_max {
                return Err(RubricError::Invalid(format!(
                    "recency band exceeds recency_max ({} > {})",
                    band.points, self.recency_max
                )));
            }
            prev = Some((band.max_days, band.points));
        }
        if let Some((last_days, _)) = prev {
            if last_days > self.recency_horizon_days {
                return Err(RubricError::Invalid(
                    "recency_bands extend past recency_horizon_days".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// Shared monotonicity check for ascending-cutoff band tables.
fn check_bands<I>(name: &str, bands: I, max: u8) -> Result<(), RubricError>
where
    I: Iterator<Item = (f64, u8)>,
{
    let mut prev: Option<(f64, u8)> = None;
    for (cutoff, points) in bands {
        if let Some((prev_cutoff, prev_points)) = prev {
            if cutoff <= prev_cutoff {
                return Err(RubricError::Invalid(format!(
                    "{name} must be ordered by ascending cutoff"
                )));
            }
            if points < prev_points {
                return Err(RubricError::Invalid(format!(
                    "{name} points must not decrease as the cutoff grows"
                )));
            }
        }
        if points > max {
            return Err(RubricError::Invalid(format!(
                "{name} band exceeds its criterion maximum ({points} > {max})"
            )));
        }
        prev = Some((cutoff, points));
    }
    Ok(())
}
