//! Evidence-quality scoring and deduplication engine.
//!
//! Turns raw psychology-research articles into scored, tiered records and
//! folds the survivors into the persisted content store: extraction →
//! scoring → threshold gate → fingerprint dedup → store merge. The store is
//! a value passed in and returned, so the whole engine runs against
//! in-memory stores in tests; file I/O lives in [`persist`] alone.

pub mod dedup;
pub mod error;
pub mod extract;
pub mod fingerprint;
pub mod gate;
pub mod merge;
pub mod persist;
pub mod pipeline;
pub mod score;

pub use dedup::{Deduplicator, DuplicateReason};
pub use error::EngineError;
pub use extract::FeatureExtractor;
pub use fingerprint::{normalize_title, slug_for, Fingerprint};
pub use gate::passes_threshold;
pub use persist::{load_store, save_store};
pub use pipeline::{run_pipeline, PipelineOutcome, RejectReason, Rejection, RunSummary};
