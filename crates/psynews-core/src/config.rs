use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read feeds file {path}: {source}")]
    FeedsRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse feeds file {path}: {source}")]
    FeedsParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

/// Application configuration, resolved from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Path of the persisted content-store document.
    pub data_path: PathBuf,
    /// Publish threshold in `[0, 100]`; articles scoring below it are rejected.
    pub score_threshold: u8,
    /// Optional YAML override for the scoring rubric bands.
    pub rubric_path: Option<PathBuf>,
    /// Optional YAML feed list; built-in defaults apply when absent.
    pub feeds_path: Option<PathBuf>,
    pub log_level: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    /// Maximum raw articles to collect per run.
    pub collect_limit: usize,
    pub pubmed_api_key: Option<String>,
    /// Contact email sent to NCBI E-utilities, per their usage policy.
    pub pubmed_email: String,
}

/// One RSS feed to collect from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedConfig {
    pub name: String,
    pub url: String,
    pub category: String,
}

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value fails to parse or validate.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the
/// process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for
/// testing or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if a value fails to parse or validate.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual
/// environment so it can be tested with a pure `HashMap` lookup — no
/// `set_var`/`remove_var` needed.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let data_path = PathBuf::from(or_default("PSYNEWS_DATA_PATH", "./data/articles.json"));

    let threshold_raw = or_default("PSYNEWS_SCORE_THRESHOLD", "70");
    let score_threshold =
        threshold_raw
            .parse::<u8>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: "PSYNEWS_SCORE_THRESHOLD".to_string(),
                reason: e.to_string(),
            })?;
    if score_threshold > 100 {
        return Err(ConfigError::InvalidEnvVar {
            var: "PSYNEWS_SCORE_THRESHOLD".to_string(),
            reason: format!("must be in 0..=100, got {score_threshold}"),
        });
    }

    let rubric_path = lookup("PSYNEWS_RUBRIC_PATH").ok().map(PathBuf::from);
    let feeds_path = lookup("PSYNEWS_FEEDS_PATH").ok().map(PathBuf::from);
    let log_level = or_default("PSYNEWS_LOG_LEVEL", "info");
    let request_timeout_secs = parse_u64("PSYNEWS_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("PSYNEWS_USER_AGENT", "psynews/0.1 (research-digest)");
    let collect_limit = parse_usize("PSYNEWS_COLLECT_LIMIT", "20")?;
    let pubmed_api_key = lookup("PUBMED_API_KEY").ok();
    let pubmed_email = or_default("PSYNEWS_PUBMED_EMAIL", "user@example.com");

    Ok(AppConfig {
        data_path,
        score_threshold,
        rubric_path,
        feeds_path,
        log_level,
        request_timeout_secs,
        user_agent,
        collect_limit,
        pubmed_api_key,
        pubmed_email,
    })
}

/// Built-in psychology feeds used when no feeds file is configured.
#[must_use]
pub fn default_feeds() -> Vec<FeedConfig> {
    vec![
        FeedConfig {
            name: "PsyPost".to_string(),
            url: "https://www.psypost.org/feed".to_string(),
            category: "research".to_string(),
        },
        FeedConfig {
            name: "American Psychological Association".to_string(),
            url: "https://www.apa.org/news/rss/index.aspx".to_string(),
            category: "research".to_string(),
        },
        FeedConfig {
            name: "Psychology Today".to_string(),
            url: "https://www.psychologytoday.com/rss".to_string(),
            category: "general".to_string(),
        },
    ]
}

/// Load the feed list from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError::FeedsRead` on I/O failure and
/// `ConfigError::FeedsParse` on malformed YAML.
pub fn load_feeds(path: &Path) -> Result<Vec<FeedConfig>, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::FeedsRead {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&raw).map_err(|source| ConfigError::FeedsParse {
        path: path.to_path_buf(),
        source,
    })
}
