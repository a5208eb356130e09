//! Article collectors for the psynews pipeline.
//!
//! Pulls raw article records from psychology RSS feeds and the PubMed
//! E-utilities API. Collectors are external collaborators of the scoring
//! engine: they fetch and shape, the engine decides. Individual source
//! failures are logged and skipped so one dead feed never sinks a run.

pub mod error;
pub mod pubmed;
pub mod rss;

pub use error::CollectError;
pub use pubmed::PubMedClient;
pub use rss::{collect_feeds, fetch_feed, parse_feed};

use psynews_core::{AppConfig, FeedConfig, RawArticle};

/// Build the shared HTTP client from application config.
///
/// # Errors
///
/// Returns [`CollectError::Http`] if the client cannot be constructed.
pub fn build_client(config: &AppConfig) -> Result<reqwest::Client, CollectError> {
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
        .user_agent(config.user_agent.clone())
        .build()?;
    Ok(client)
}

/// Collect raw articles from every configured source.
///
/// Continues past individual source failures, logging warnings. Returns an
/// empty `Vec` if every source fails. The result is capped at
/// `config.collect_limit` in input order.
pub async fn collect_articles(
    config: &AppConfig,
    feeds: &[FeedConfig],
    now: chrono::DateTime<chrono::Utc>,
) -> Result<Vec<RawArticle>, CollectError> {
    let client = build_client(config)?;
    let per_feed = (config.collect_limit / (feeds.len() + 1)).max(1);

    let mut articles = collect_feeds(&client, feeds, per_feed).await;

    let pubmed = PubMedClient::new(
        client,
        config.pubmed_api_key.clone(),
        config.pubmed_email.clone(),
    );
    match pubmed.collect(per_feed, now).await {
        Ok(papers) => {
            tracing::debug!(count = papers.len(), "collected PubMed papers");
            articles.extend(papers);
        }
        Err(e) => {
            tracing::warn!(source = "pubmed", error = %e, "PubMed collection failed");
        }
    }

    articles.truncate(config.collect_limit);
    tracing::info!(count = articles.len(), "collection complete");
    Ok(articles)
}
