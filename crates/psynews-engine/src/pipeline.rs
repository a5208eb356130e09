//! Run orchestration: one ordered pass over the collected articles.
//!
//! Extractor → scorer → threshold gate → deduplicator → merger, single
//! threaded, no I/O. Every input article is accounted for in the returned
//! summary; nothing is silently dropped.

use chrono::{DateTime, Utc};

use psynews_core::{ContentStore, EvaluatedArticle, RawArticle, Rubric};

use crate::dedup::{Deduplicator, DuplicateReason};
use crate::error::EngineError;
use crate::extract::FeatureExtractor;
use crate::fingerprint::slug_for;
use crate::gate::passes_threshold;
use crate::merge::merge;
use crate::score::evaluate;

/// Why one input article did not reach the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// Missing title, source, or publication date.
    Malformed,
    BelowThreshold { score: u8 },
    Duplicate(DuplicateReason),
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::Malformed => write!(f, "malformed input"),
            RejectReason::BelowThreshold { score } => write!(f, "below threshold (score {score})"),
            RejectReason::Duplicate(reason) => write!(f, "duplicate: {reason}"),
        }
    }
}

/// One rejected input, kept for the run report.
#[derive(Debug, Clone)]
pub struct Rejection {
    pub title: String,
    pub reason: RejectReason,
}

/// Accepted-vs-rejected accounting for one run, consumed by the
/// orchestration layer.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub accepted: usize,
    pub rejected_below_threshold: usize,
    pub rejected_duplicate: usize,
    pub skipped_malformed: usize,
    pub rejections: Vec<Rejection>,
}

impl RunSummary {
    fn reject(&mut self, title: &str, reason: RejectReason) {
        match reason {
            RejectReason::Malformed => self.skipped_malformed += 1,
            RejectReason::BelowThreshold { .. } => self.rejected_below_threshold += 1,
            RejectReason::Duplicate(_) => self.rejected_duplicate += 1,
        }
        self.rejections.push(Rejection {
            title: title.to_string(),
            reason,
        });
    }
}

/// Everything one pipeline run produces.
#[derive(Debug)]
pub struct PipelineOutcome {
    /// The updated store value; the caller persists it atomically.
    pub store: ContentStore,
    pub accepted: Vec<EvaluatedArticle>,
    pub summary: RunSummary,
}

/// Run the full engine over one batch of collected articles.
///
/// The store is taken and returned by value; `now` is the only time source,
/// so a run is reproducible. Articles are processed in input order, which
/// makes within-run deduplication deterministic.
///
/// # Errors
///
/// Returns [`EngineError::InvalidStore`] if the incoming store violates its
/// structural invariants — merging into a store we cannot trust is the one
/// thing this function refuses to do.
pub fn run_pipeline(
    store: ContentStore,
    articles: Vec<RawArticle>,
    rubric: &Rubric,
    threshold: u8,
    now: DateTime<Utc>,
) -> Result<PipelineOutcome, EngineError> {
    store.validate()?;

    let extractor = FeatureExtractor::new();
    let mut dedup = Deduplicator::for_store(&store);
    let mut summary = RunSummary::default();
    let mut accepted: Vec<EvaluatedArticle> = Vec::new();

    tracing::info!(
        input = articles.len(),
        threshold,
        stored = store.total_articles,
        "pipeline run starting"
    );

    for article in articles {
        if !article.is_well_formed() {
            tracing::debug!(title = %article.title, "skipping malformed input");
            summary.reject(&article.title, RejectReason::Malformed);
            continue;
        }

        let features = extractor.extract(&article, now);
        let evaluated = evaluate(article, features, rubric);

        if !passes_threshold(&evaluated, threshold) {
            tracing::debug!(
                title = %evaluated.raw.title,
                score = evaluated.total_score,
                "rejected below threshold"
            );
            summary.reject(
                &evaluated.raw.title,
                RejectReason::BelowThreshold {
                    score: evaluated.total_score,
                },
            );
            continue;
        }

        // Well-formedness guarantees the date is present past this point.
        let Some(date) = evaluated.raw.published_date else {
            summary.reject(&evaluated.raw.title, RejectReason::Malformed);
            continue;
        };
        let slug = slug_for(date, &evaluated.raw.title);
        if let Err(reason) = dedup.admit(&slug, &evaluated.raw.url) {
            tracing::debug!(title = %evaluated.raw.title, %slug, %reason, "rejected duplicate");
            summary.reject(&evaluated.raw.title, RejectReason::Duplicate(reason));
            continue;
        }

        tracing::debug!(
            title = %evaluated.raw.title,
            score = evaluated.total_score,
            level = %evaluated.evidence_level,
            "accepted"
        );
        summary.accepted += 1;
        accepted.push(evaluated);
    }

    let store = merge(store, &accepted, now);
    debug_assert!(store.validate().is_ok());

    tracing::info!(
        accepted = summary.accepted,
        below_threshold = summary.rejected_below_threshold,
        duplicates = summary.rejected_duplicate,
        malformed = summary.skipped_malformed,
        total = store.total_articles,
        "pipeline run complete"
    );

    Ok(PipelineOutcome {
        store,
        accepted,
        summary,
    })
}
