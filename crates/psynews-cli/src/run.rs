//! The `run` subcommand: one full collection cycle.
//!
//! Collect → pipeline → persist. The store file is read in full before the
//! run and replaced atomically after it, so a run either lands completely
//! or not at all.

use chrono::{NaiveDate, NaiveTime, Utc};

use psynews_collect::collect_articles;
use psynews_core::{config, AppConfig, Rubric};
use psynews_engine::{load_store, run_pipeline, save_store, RunSummary};

pub async fn run(
    config: &AppConfig,
    limit: Option<usize>,
    dry_run: bool,
    as_of: Option<NaiveDate>,
) -> anyhow::Result<()> {
    let rubric = match &config.rubric_path {
        Some(path) => Rubric::load(path)?,
        None => Rubric::default(),
    };
    let feeds = match &config.feeds_path {
        Some(path) => config::load_feeds(path)?,
        None => config::default_feeds(),
    };

    let mut config = config.clone();
    if let Some(limit) = limit {
        config.collect_limit = limit;
    }

    let now = match as_of {
        Some(date) => date.and_time(NaiveTime::MIN).and_utc(),
        None => Utc::now(),
    };
    let articles = collect_articles(&config, &feeds, now).await?;

    // Load before, save after: the store is a value the pipeline transforms.
    let store = load_store(&config.data_path)?;
    let outcome = run_pipeline(store, articles, &rubric, config.score_threshold, now)?;

    print_summary(&outcome.summary, outcome.store.total_articles);

    if dry_run {
        tracing::info!("dry run, store not persisted");
    } else {
        save_store(&config.data_path, &outcome.store)?;
        tracing::info!(path = %config.data_path.display(), "store persisted");
    }
    Ok(())
}

fn print_summary(summary: &RunSummary, total_articles: usize) {
    println!("{}", format_summary(summary, total_articles));
    for rejection in &summary.rejections {
        tracing::debug!(title = %rejection.title, reason = %rejection.reason, "rejected");
    }
}

fn format_summary(summary: &RunSummary, total_articles: usize) -> String {
    format!(
        "accepted {} | below threshold {} | duplicates {} | malformed {} | store total {}",
        summary.accepted,
        summary.rejected_below_threshold,
        summary.rejected_duplicate,
        summary.skipped_malformed,
        total_articles
    )
}
