//! Feature extraction: structured signals from free text and metadata.
//!
//! Extraction never fails. Any signal that cannot be confidently pulled out
//! of the text is marked unknown (`None` / `StudyDesign::Unknown`) so the
//! scoring engine always receives a complete structure.

use chrono::{DateTime, Utc};
use regex::Regex;

use psynews_core::{ExtractedFeatures, RawArticle, StudyDesign};

/// Leading segment of the body treated as the abstract/summary region.
/// Authors report headline statistics (n, d, r) up front, so numeric
/// extraction only looks here.
const ABSTRACT_REGION_CHARS: usize = 1_200;

/// Sample sizes outside this range are treated as parser noise.
const SAMPLE_SIZE_MIN: u32 = 10;
const SAMPLE_SIZE_MAX: u32 = 10_000_000;

/// Raw applicability score ceiling; the rubric applies its own cap as well.
const APPLICABILITY_CAP: u8 = 15;

/// Study-design classification rules, most rigorous first. The first rule
/// whose pattern matches wins, so when several patterns match the same text
/// the more rigorous design takes the tie.
const DESIGN_RULES: &[(StudyDesign, &str)] = &[
    (
        StudyDesign::MetaAnalysis,
        r"meta-?analys[ie]s|meta analysis|systematic review",
    ),
    (
        StudyDesign::Rct,
        r"randomi[sz]ed controlled trial|\brct\b|randomi[sz]ed (?:clinical )?trial|controlled trial",
    ),
    (
        StudyDesign::Cohort,
        r"cohort study|prospective study|longitudinal study",
    ),
    (
        StudyDesign::CrossSectional,
        r"cross-?sectional|survey study",
    ),
    (StudyDesign::CaseStudy, r"case report|case study"),
];

/// Concern keywords mapped to safety flags. Each flag is emitted at most
/// once per article.
const SAFETY_RULES: &[(&str, &str)] = &[
    ("invasive", "invasive"),
    ("experimental drug", "experimental-drug"),
    ("investigational drug", "experimental-drug"),
    ("adverse event", "adverse-events"),
    ("adverse effect", "adverse-events"),
    ("side effect", "adverse-events"),
    ("contraindicat", "contraindication"),
    ("serious risk", "risk"),
    ("high risk", "risk"),
];

/// Actionable-content keyword groups; each matched group adds points.
const APPLICABILITY_GROUPS: &[&[&str]] = &[
    &["immediate", "instant", "quick", "simple", "easy"],
    &["accessible", "free", "no cost", "low cost"],
    &["protocol", "procedure", "step-by-step", "guide", "method"],
    &["measure", "assess", "evaluate", "track", "monitor"],
];

/// Adoption barriers; each match subtracts points.
const APPLICABILITY_BARRIERS: &[&str] = &[
    "expensive",
    "complex",
    "professional only",
    "clinical setting",
    "specialized",
];

/// Intervention language earns a small bonus — these articles describe
/// something a reader can actually do.
const INTERVENTION_TERMS: &[&str] = &["intervention", "treatment", "therapy", "training"];

/// Extracts [`ExtractedFeatures`] from raw articles. Owns its compiled
/// regexes; build once and reuse across a run.
pub struct FeatureExtractor {
    design_rules: Vec<(StudyDesign, Regex)>,
    sample_patterns: Vec<Regex>,
    d_patterns: Vec<Regex>,
    r_pattern: Regex,
    or_pattern: Regex,
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureExtractor {
    /// Compile the extraction rule set.
    ///
    /// # Panics
    ///
    /// Panics if a built-in pattern fails to compile, which would be a bug
    /// caught by the test suite, not a runtime condition.
    #[must_use]
    pub fn new() -> Self {
        let compile = |p: &str| Regex::new(&format!("(?i){p}")).expect("built-in pattern");
        Self {
            design_rules: DESIGN_RULES
                .iter()
                .map(|&(design, pattern)| (design, compile(pattern)))
                .collect(),
            sample_patterns: vec![
                compile(r"\bn\s*=\s*(\d[\d,]*)"),
                compile(r"(\d[\d,]*)\s*participants?\b"),
                compile(r"(\d[\d,]*)\s*subjects?\b"),
                compile(r"sample of\s*(\d[\d,]*)"),
                compile(r"total of\s*(\d[\d,]*)"),
                compile(r"recruited\s*(\d[\d,]*)"),
            ],
            d_patterns: vec![
                compile(r"(?:cohen'?s?\s*d|hedges?'?s?\s*g)\s*=\s*(-?\d+\.?\d*)"),
                compile(r"\bd\s*=\s*(-?\d+\.?\d*)"),
                compile(r"\bg\s*=\s*(-?\d+\.?\d*)"),
            ],
            r_pattern: compile(r"\br\s*=\s*(-?\d+\.?\d*)"),
            or_pattern: compile(r"odds ratio[^\d-]{0,20}(\d+\.?\d*)"),
        }
    }

    /// Derive structured signals from one article at evaluation time `now`.
    ///
    /// Identical input always yields identical output; `now` is the only
    /// time source.
    #[must_use]
    pub fn extract(&self, article: &RawArticle, now: DateTime<Utc>) -> ExtractedFeatures {
        let text = format!("{} {}", article.title, article.body).to_lowercase();
        let region = abstract_region(&article.body).to_lowercase();

        let (recency_days, future_dated) = match article.published_date {
            Some(date) => {
                let age = (now.date_naive() - date).num_days();
                if age < 0 {
                    tracing::warn!(
                        title = %article.title,
                        published = %date,
                        "future-dated article, clamping age to 0 for review"
                    );
                    (0, true)
                } else {
                    (age, false)
                }
            }
            None => (0, false),
        };

        ExtractedFeatures {
            study_design: self.classify_design(&text),
            sample_size: article.sample_size.or_else(|| self.extract_sample_size(&region)),
            effect_size: article.effect_size.or_else(|| self.extract_effect_size(&region)),
            recency_days,
            future_dated,
            safety_flags: extract_safety_flags(&text),
            practical_applicability: applicability_score(&text),
        }
    }

    fn classify_design(&self, text: &str) -> StudyDesign {
        for (design, pattern) in &self.design_rules {
            if pattern.is_match(text) {
                return *design;
            }
        }
        StudyDesign::Unknown
    }

    /// First plausible sample-size mention in the abstract region, by text
    /// position across all patterns.
    fn extract_sample_size(&self, region: &str) -> Option<u32> {
        let mut best: Option<(usize, u32)> = None;
        for pattern in &self.sample_patterns {
            for caps in pattern.captures_iter(region) {
                let m = caps.get(1)?;
                let Ok(n) = m.as_str().replace(',', "").parse::<u32>() else {
                    continue;
                };
                if !(SAMPLE_SIZE_MIN..=SAMPLE_SIZE_MAX).contains(&n) {
                    continue;
                }
                if best.is_none_or(|(pos, _)| m.start() < pos) {
                    best = Some((m.start(), n));
                }
            }
        }
        best.map(|(_, n)| n)
    }

    /// First effect-size mention, normalized to Cohen's d.
    ///
    /// Priority: an explicit d (or g) beats a correlation, which beats an
    /// odds ratio. r is converted via `2r / sqrt(1 - r^2)` and OR via
    /// `ln(OR) * sqrt(3) / pi`.
    fn extract_effect_size(&self, region: &str) -> Option<f64> {
        let mut best: Option<(usize, f64)> = None;
        for pattern in &self.d_patterns {
            if let Some(caps) = pattern.captures(region) {
                let m = caps.get(1)?;
                if let Ok(d) = m.as_str().parse::<f64>() {
                    if best.is_none_or(|(pos, _)| m.start() < pos) {
                        best = Some((m.start(), d));
                    }
                }
            }
        }
        if let Some((_, d)) = best {
            return Some(d);
        }

        if let Some(caps) = self.r_pattern.captures(region) {
            if let Ok(r) = caps.get(1)?.as_str().parse::<f64>() {
                if (-0.99..=0.99).contains(&r) {
                    return Some(2.0 * r / (1.0 - r * r).sqrt());
                }
            }
        }

        if let Some(caps) = self.or_pattern.captures(region) {
            if let Ok(or) = caps.get(1)?.as_str().parse::<f64>() {
                if or > 0.0 {
                    return Some(or.ln() * 3.0_f64.sqrt() / std::f64::consts::PI);
                }
            }
        }

        None
    }
}

/// Leading segment of the body where headline statistics are reported.
fn abstract_region(body: &str) -> &str {
    match body.char_indices().nth(ABSTRACT_REGION_CHARS) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

fn extract_safety_flags(text: &str) -> Vec<String> {
    let mut flags: Vec<String> = Vec::new();
    for &(keyword, flag) in SAFETY_RULES {
        if text.contains(keyword) && !flags.iter().any(|f| f == flag) {
            flags.push(flag.to_string());
        }
    }
    flags
}

/// Actionable-advice keyword density, bounded to `[0, APPLICABILITY_CAP]`.
fn applicability_score(text: &str) -> u8 {
    let mut score: i32 = 0;
    for group in APPLICABILITY_GROUPS {
        if group.iter().any(|kw| text.contains(kw)) {
            score += 4;
        }
    }
    for barrier in APPLICABILITY_BARRIERS {
        if text.contains(barrier) {
            score -= 3;
        }
    }
    if INTERVENTION_TERMS.iter().any(|kw| text.contains(kw)) {
        score += 3;
    }
    u8::try_from(score.clamp(0, i32::from(APPLICABILITY_CAP))).unwrap_or(0)
}
