use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::article::EvidenceLevel;

/// An invariant violation found in a [`ContentStore`].
///
/// A persisted store that fails validation is treated as corrupt: the run
/// aborts without attempting a merge rather than guessing at a partial
/// structure.
#[derive(Debug, Error)]
pub enum StoreViolation {
    #[error("index '{index}' references slug '{slug}' that is not in articles")]
    DanglingSlug { index: &'static str, slug: String },

    #[error("total_articles is {recorded} but articles holds {actual} entries")]
    CountMismatch { recorded: usize, actual: usize },
}

/// Study metadata surfaced on the rendered article page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchDetails {
    pub study_design: String,
    pub sample_size: Option<u32>,
    pub effect_size: Option<f64>,
    pub total_score: u8,
    pub score_breakdown: BTreeMap<String, u8>,
}

/// Display record for one published article, keyed by slug in the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub title: String,
    /// Short excerpt lines shown on listing pages.
    pub summary_points: Vec<String>,
    pub evidence_level: EvidenceLevel,
    pub research_details: ResearchDetails,
    pub category: String,
    pub published_date: NaiveDate,
    pub source: String,
    pub url: String,
}

/// Entry in a per-category listing, most-recent-first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryEntry {
    pub slug: String,
    pub title: String,
    pub date: NaiveDate,
}

/// Entry in the per-day listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyEntry {
    pub slug: String,
    pub title: String,
    pub category: String,
}

/// The persisted content store consumed by the static-site renderer.
///
/// These five top-level fields are the whole interface: do not add fields
/// without updating the renderer. `BTreeMap` keeps the serialized document
/// stable across runs so it diffs cleanly in the site repo.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentStore {
    pub articles: BTreeMap<String, ArticleRecord>,
    /// Category name -> slugs, most-recent-first.
    pub categories: BTreeMap<String, Vec<CategoryEntry>>,
    /// ISO date -> slugs published that day.
    pub daily_index: BTreeMap<String, Vec<DailyEntry>>,
    /// ISO-8601 timestamp of the last merge. Empty on a fresh store.
    pub last_updated: String,
    pub total_articles: usize,
}

impl ContentStore {
    /// Checks the structural invariants: every indexed slug resolves to an
    /// article, and `total_articles` matches the primary mapping size.
    ///
    /// # Errors
    ///
    /// Returns the first [`StoreViolation`] found.
    pub fn validate(&self) -> Result<(), StoreViolation> {
        for entries in self.categories.values() {
            for entry in entries {
                if !self.articles.contains_key(&entry.slug) {
                    return Err(StoreViolation::DanglingSlug {
                        index: "categories",
                        slug: entry.slug.clone(),
                    });
                }
            }
        }
        for entries in self.daily_index.values() {
            for entry in entries {
                if !self.articles.contains_key(&entry.slug) {
                    return Err(StoreViolation::DanglingSlug {
                        index: "daily_index",
                        slug: entry.slug.clone(),
                    });
                }
            }
        }
        if self.total_articles != self.articles.len() {
            return Err(StoreViolation::CountMismatch {
                recorded: self.total_articles,
                actual: self.articles.len(),
            });
        }
        Ok(())
    }

    /// Whether any stored article has exactly this source URL.
    #[must_use]
    pub fn contains_url(&self, url: &str) -> bool {
        self.articles.values().any(|a| a.url == url)
    }
}
