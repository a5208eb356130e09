//! Store merger: fold accepted articles into the content store.
//!
//! The store is a value: current store in, updated store out. Persistence
//! is the caller's job. The deduplicator runs before the merger, which is
//! what makes re-merging the same article a no-op at the pipeline level.

use chrono::{DateTime, Utc};

use psynews_core::{
    ArticleRecord, CategoryEntry, ContentStore, DailyEntry, EvaluatedArticle, ResearchDetails,
};

use crate::fingerprint::slug_for;

/// How many leading sentences of the body become the display excerpt.
const SUMMARY_SENTENCES: usize = 3;

/// Merge accepted articles into the store.
///
/// Per article: assign the slug, insert the display record, prepend to the
/// category and daily indices (creating buckets as needed — an unknown
/// category is never an error), then refresh `total_articles` and
/// `last_updated`. A slug that is somehow already present is skipped
/// without overwriting; the deduplicator should have caught it.
#[must_use]
pub fn merge(
    mut store: ContentStore,
    accepted: &[EvaluatedArticle],
    merged_at: DateTime<Utc>,
) -> ContentStore {
    let mut merged = 0usize;
    for article in accepted {
        let Some(date) = article.raw.published_date else {
            // Well-formedness is checked before scoring; this is a guard,
            // not an expected path.
            tracing::warn!(title = %article.raw.title, "accepted article without a date, skipping");
            continue;
        };
        let slug = slug_for(date, &article.raw.title);
        if store.articles.contains_key(&slug) {
            tracing::warn!(%slug, "slug already present at merge time, keeping the stored article");
            continue;
        }

        let record = display_record(article, date);
        store
            .categories
            .entry(record.category.clone())
            .or_default()
            .insert(
                0,
                CategoryEntry {
                    slug: slug.clone(),
                    title: record.title.clone(),
                    date,
                },
            );
        store
            .daily_index
            .entry(date.format("%Y-%m-%d").to_string())
            .or_default()
            .insert(
                0,
                DailyEntry {
                    slug: slug.clone(),
                    title: record.title.clone(),
                    category: record.category.clone(),
                },
            );
        store.articles.insert(slug, record);
        merged += 1;
    }

    if merged > 0 {
        store.last_updated = merged_at.to_rfc3339();
    }
    store.total_articles = store.articles.len();
    tracing::debug!(merged, total = store.total_articles, "store merge complete");
    store
}

fn display_record(article: &EvaluatedArticle, date: chrono::NaiveDate) -> ArticleRecord {
    ArticleRecord {
        title: article.raw.title.clone(),
        summary_points: summary_points(&article.raw.body),
        evidence_level: article.evidence_level,
        research_details: ResearchDetails {
            study_design: article.features.study_design.to_string(),
            sample_size: article.features.sample_size,
            effect_size: article.features.effect_size,
            total_score: article.total_score,
            score_breakdown: article.score_breakdown.clone(),
        },
        category: article.raw.category.clone(),
        published_date: date,
        source: article.raw.source.clone(),
        url: article.raw.url.clone(),
    }
}

/// Leading sentences of the body, trimmed, as listing-page excerpt lines.
fn summary_points(body: &str) -> Vec<String> {
    body.split_inclusive(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .take(SUMMARY_SENTENCES)
        .map(ToString::to_string)
        .collect()
}
