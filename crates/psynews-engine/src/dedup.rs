//! Fingerprint deduplication against the store and within a run.
//!
//! Two independent signals mark an article as already represented: its
//! computed slug is taken, or its source URL exactly matches a stored one.
//! URL equality catches syndicated copies whose titles drifted too far for
//! the fingerprint to match. Within a run the same rule applies with the
//! first occurrence winning, so results are order-dependent but
//! deterministic for a fixed input order.

use std::collections::HashSet;

use psynews_core::ContentStore;

/// Why an article was rejected as a duplicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateReason {
    /// The computed slug is already present (stored or earlier in this run).
    SlugTaken,
    /// The source URL exactly matches a known article's URL.
    UrlSeen,
}

impl std::fmt::Display for DuplicateReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DuplicateReason::SlugTaken => write!(f, "slug already present"),
            DuplicateReason::UrlSeen => write!(f, "url already seen"),
        }
    }
}

/// Tracks known slugs and URLs for one pipeline run.
///
/// Seeded from the store, then grows as fresh articles are admitted, which
/// is what deduplicates articles against each other within the run.
pub struct Deduplicator {
    known_slugs: HashSet<String>,
    known_urls: HashSet<String>,
}

impl Deduplicator {
    /// Snapshot the store's slugs and URLs.
    #[must_use]
    pub fn for_store(store: &ContentStore) -> Self {
        Self {
            known_slugs: store.articles.keys().cloned().collect(),
            known_urls: store.articles.values().map(|a| a.url.clone()).collect(),
        }
    }

    /// Admit a candidate or name the duplicate signal that rejects it.
    ///
    /// Admitted candidates are registered, so a later candidate with the
    /// same slug or URL is rejected — first occurrence wins.
    pub fn admit(&mut self, slug: &str, url: &str) -> Result<(), DuplicateReason> {
        if self.known_slugs.contains(slug) {
            return Err(DuplicateReason::SlugTaken);
        }
        if !url.is_empty() && self.known_urls.contains(url) {
            return Err(DuplicateReason::UrlSeen);
        }
        self.known_slugs.insert(slug.to_string());
        if !url.is_empty() {
            self.known_urls.insert(url.to_string());
        }
        Ok(())
    }
}
