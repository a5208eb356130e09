//! Shared domain types and configuration for the psynews pipeline.
//!
//! Everything downstream crates agree on lives here: the raw and evaluated
//! article shapes, the persisted content-store document, the scoring rubric,
//! and environment-driven application configuration.

pub mod article;
pub mod config;
pub mod rubric;
pub mod store;

pub use article::{
    EvaluatedArticle, EvidenceLevel, ExtractedFeatures, RawArticle, StudyDesign,
};
pub use config::{load_app_config, load_app_config_from_env, AppConfig, ConfigError, FeedConfig};
pub use rubric::{Rubric, RubricError};
pub use store::{ArticleRecord, CategoryEntry, ContentStore, DailyEntry, ResearchDetails};
