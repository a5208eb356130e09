//! The `report` subcommand: aggregate statistics for the persisted store.

use std::collections::BTreeMap;

use psynews_core::{AppConfig, ContentStore};
use psynews_engine::load_store;

pub fn report(config: &AppConfig) -> anyhow::Result<()> {
    let store = load_store(&config.data_path)?;
    print!("{}", render_report(&store));
    Ok(())
}

fn render_report(store: &ContentStore) -> String {
    let mut out = String::new();
    out.push_str(&format!("total articles: {}\n", store.total_articles));
    let last_updated = if store.last_updated.is_empty() {
        "never"
    } else {
        &store.last_updated
    };
    out.push_str(&format!("last updated:   {last_updated}\n"));

    if !store.categories.is_empty() {
        out.push_str("\nby category:\n");
        for (category, entries) in &store.categories {
            out.push_str(&format!("  {category}: {}\n", entries.len()));
        }
    }

    let levels = level_counts(store);
    if !levels.is_empty() {
        out.push_str("\nby evidence level:\n");
        for (level, count) in &levels {
            out.push_str(&format!("  {level}: {count}\n"));
        }
    }
    out
}

fn level_counts(store: &ContentStore) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for record in store.articles.values() {
        *counts.entry(record.evidence_level.to_string()).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::NaiveDate;
    use psynews_core::{ArticleRecord, EvidenceLevel, ResearchDetails};

    use super::*;

    fn record(level: EvidenceLevel, category: &str) -> ArticleRecord {
        ArticleRecord {
            title: "Sleep study".to_string(),
            summary_points: vec![],
            evidence_level: level,
            research_details: ResearchDetails {
                study_design: "rct".to_string(),
                sample_size: Some(100),
                effect_size: Some(0.5),
                total_score: 80,
                score_breakdown: BTreeMap::new(),
            },
            category: category.to_string(),
            published_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            source: "PsyPost".to_string(),
            url: "https://example.org/sleep".to_string(),
        }
    }

    #[test]
    fn empty_store_reports_never_updated() {
        let rendered = render_report(&ContentStore::default());
        assert!(rendered.contains("total articles: 0"), "got: {rendered}");
        assert!(rendered.contains("last updated:   never"), "got: {rendered}");
        assert!(!rendered.contains("by category"), "got: {rendered}");
    }

    #[test]
    fn level_counts_group_by_evidence_level() {
        let mut store = ContentStore::default();
        store
            .articles
            .insert("a".to_string(), record(EvidenceLevel::Gold, "research"));
        store
            .articles
            .insert("b".to_string(), record(EvidenceLevel::Gold, "research"));
        store
            .articles
            .insert("c".to_string(), record(EvidenceLevel::Bronze, "wellness"));
        store.total_articles = 3;

        let counts = level_counts(&store);
        assert_eq!(counts.get("gold"), Some(&2));
        assert_eq!(counts.get("bronze"), Some(&1));
        assert_eq!(counts.get("silver"), None);
    }
}
