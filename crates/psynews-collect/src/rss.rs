//! RSS feed collector for psychology media sources.

use chrono::NaiveDate;
use quick_xml::events::Event;
use quick_xml::Reader;

use psynews_core::{FeedConfig, RawArticle};

use crate::error::CollectError;

/// Collect from every feed, isolating per-feed failures.
///
/// A feed that fails to fetch or parse is logged at warn level and skipped;
/// the remaining feeds still contribute.
pub async fn collect_feeds(
    client: &reqwest::Client,
    feeds: &[FeedConfig],
    per_feed_limit: usize,
) -> Vec<RawArticle> {
    let mut articles = Vec::new();
    for feed in feeds {
        match fetch_feed(client, feed, per_feed_limit).await {
            Ok(items) => {
                tracing::debug!(feed = %feed.name, count = items.len(), "collected feed items");
                articles.extend(items);
            }
            Err(e) => {
                tracing::warn!(feed = %feed.name, error = %e, "feed collection failed");
            }
        }
    }
    articles
}

/// Fetch one RSS feed and parse up to `max_items` articles from it.
///
/// # Errors
///
/// Returns [`CollectError::Http`] on network failure or
/// [`CollectError::Xml`] on malformed RSS.
pub async fn fetch_feed(
    client: &reqwest::Client,
    feed: &FeedConfig,
    max_items: usize,
) -> Result<Vec<RawArticle>, CollectError> {
    let body = client.get(&feed.url).send().await?.text().await?;
    parse_feed(&body, feed, max_items)
}

/// Parse an RSS feed XML body into [`RawArticle`]s.
///
/// Extracts `<item>` elements, pulling `<title>`, `<link>`, `<description>`,
/// and `<pubDate>`. HTML tags in descriptions are stripped. Items without a
/// link are dropped; a missing or unparsable date is kept as `None` and
/// handled downstream as a malformed input.
///
/// # Errors
///
/// Returns [`CollectError::Xml`] if the XML is malformed.
pub fn parse_feed(
    xml: &str,
    feed: &FeedConfig,
    max_items: usize,
) -> Result<Vec<RawArticle>, CollectError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut articles = Vec::new();
    let mut in_item = false;
    let mut current_tag = String::new();
    let mut title = String::new();
    let mut link = String::new();
    let mut description = String::new();
    let mut pub_date = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = std::str::from_utf8(e.name().as_ref())
                    .unwrap_or("")
                    .to_string();
                if name == "item" {
                    in_item = true;
                    title.clear();
                    link.clear();
                    description.clear();
                    pub_date.clear();
                }
                current_tag = name;
            }
            Ok(Event::End(e)) => {
                let raw = e.name();
                let name = std::str::from_utf8(raw.as_ref()).unwrap_or("");
                if name == "item" && in_item {
                    in_item = false;
                    if !link.is_empty() {
                        articles.push(RawArticle {
                            title: title.clone(),
                            source: feed.name.clone(),
                            url: link.clone(),
                            category: feed.category.clone(),
                            body: description.clone(),
                            published_date: parse_date(&pub_date),
                            sample_size: None,
                            effect_size: None,
                        });
                        if articles.len() >= max_items {
                            break;
                        }
                    }
                }
            }
            Ok(Event::Text(e)) => {
                if in_item {
                    let text = e.unescape().unwrap_or_default().into_owned();
                    assign_field(&current_tag, &text, &mut title, &mut link, &mut description, &mut pub_date);
                }
            }
            Ok(Event::CData(e)) => {
                if in_item {
                    let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                    assign_field(&current_tag, &text, &mut title, &mut link, &mut description, &mut pub_date);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(CollectError::Xml(e)),
            _ => {}
        }
    }

    Ok(articles)
}

fn assign_field(
    tag: &str,
    text: &str,
    title: &mut String,
    link: &mut String,
    description: &mut String,
    pub_date: &mut String,
) {
    match tag {
        "title" => *title = text.to_string(),
        "link" => *link = text.to_string(),
        "description" => *description = strip_html(text),
        "pubDate" => *pub_date = text.to_string(),
        _ => {}
    }
}

/// Parse the date formats feeds actually emit: RFC 2822 (`pubDate`),
/// RFC 3339, and bare ISO dates.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc2822(raw) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// Strip HTML tags from a string, returning plain text.
fn strip_html(html: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(ch),
            _ => {}
        }
    }
    result.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed() -> FeedConfig {
        FeedConfig {
            name: "PsyPost".to_string(),
            url: "https://www.psypost.org/feed".to_string(),
            category: "research".to_string(),
        }
    }

    const SAMPLE_RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>PsyPost</title>
    <item>
      <title>Mindfulness practice linked to lower stress</title>
      <link>https://example.com/mindfulness</link>
      <description>&lt;p&gt;A randomized controlled trial with n = 342 participants.&lt;/p&gt;</description>
      <pubDate>Thu, 05 Jun 2025 09:30:00 GMT</pubDate>
    </item>
    <item>
      <title>Sleep and memory consolidation</title>
      <link>https://example.com/sleep</link>
      <description><![CDATA[<p>A cohort study followed 1,200 adults.</p>]]></description>
      <pubDate>Wed, 04 Jun 2025 08:00:00 GMT</pubDate>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn parses_items_with_metadata() {
        let articles = parse_feed(SAMPLE_RSS, &feed(), 20).expect("should parse valid RSS");
        assert_eq!(articles.len(), 2, "expected 2 articles, got {}", articles.len());

        let first = &articles[0];
        assert_eq!(first.title, "Mindfulness practice linked to lower stress");
        assert_eq!(first.source, "PsyPost");
        assert_eq!(first.category, "research");
        assert_eq!(first.url, "https://example.com/mindfulness");
        assert_eq!(
            first.published_date,
            NaiveDate::from_ymd_opt(2025, 6, 5)
        );
        assert!(
            first.body.contains("n = 342"),
            "description should survive HTML stripping: {}",
            first.body
        );
        assert!(!first.body.contains('<'), "HTML tags must be stripped");
    }

    #[test]
    fn cdata_descriptions_are_handled() {
        let articles = parse_feed(SAMPLE_RSS, &feed(), 20).unwrap();
        assert!(articles[1].body.contains("cohort study"));
        assert!(!articles[1].body.contains("<p>"));
    }

    #[test]
    fn item_cap_is_respected() {
        let articles = parse_feed(SAMPLE_RSS, &feed(), 1).unwrap();
        assert_eq!(articles.len(), 1);
    }

    #[test]
    fn items_without_links_are_dropped() {
        let xml = r#"<rss><channel><item><title>No link</title></item></channel></rss>"#;
        let articles = parse_feed(xml, &feed(), 20).unwrap();
        assert!(articles.is_empty());
    }

    #[test]
    fn empty_feed_returns_empty_vec() {
        let xml = r#"<?xml version="1.0"?><rss version="2.0"><channel></channel></rss>"#;
        let articles = parse_feed(xml, &feed(), 20).unwrap();
        assert!(articles.is_empty());
    }

    #[test]
    fn unparsable_dates_become_none() {
        let xml = r#"<rss><channel><item>
            <title>Odd date</title>
            <link>https://example.com/odd</link>
            <pubDate>sometime last week</pubDate>
        </item></channel></rss>"#;
        let articles = parse_feed(xml, &feed(), 20).unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].published_date, None);
    }

    #[test]
    fn parse_date_accepts_common_formats() {
        assert_eq!(
            parse_date("Thu, 05 Jun 2025 09:30:00 GMT"),
            NaiveDate::from_ymd_opt(2025, 6, 5)
        );
        assert_eq!(
            parse_date("2025-06-05T09:30:00Z"),
            NaiveDate::from_ymd_opt(2025, 6, 5)
        );
        assert_eq!(parse_date("2025-06-05"), NaiveDate::from_ymd_opt(2025, 6, 5));
        assert_eq!(parse_date(""), None);
    }
}
