//! PubMed collector: NCBI E-utilities esearch + efetch.
//!
//! Searches psychology MeSH terms filtered to the study types worth
//! scoring, then fetches abstracts. IDs come back as JSON (`retmode=json`);
//! article records come back as XML and are parsed with the same event
//! reader the RSS path uses.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;

use psynews_core::RawArticle;

use crate::error::CollectError;

const EUTILS_BASE: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

/// How far back the esearch date window reaches.
const SEARCH_WINDOW_DAYS: i64 = 730;

const MESH_TERMS: &[&str] = &[
    "psychology[MeSH]",
    "psychological phenomena[MeSH]",
    "behavior[MeSH]",
    "mental health[MeSH]",
];

const STUDY_TYPE_FILTERS: &[&str] = &[
    "randomized controlled trial[PT]",
    "meta-analysis[PT]",
    "systematic review[PT]",
    "clinical trial[PT]",
];

#[derive(Debug, Deserialize)]
struct EsearchResponse {
    esearchresult: EsearchResult,
}

#[derive(Debug, Deserialize)]
struct EsearchResult {
    #[serde(default)]
    idlist: Vec<String>,
}

/// Client for the PubMed E-utilities endpoints.
pub struct PubMedClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    email: String,
}

impl PubMedClient {
    #[must_use]
    pub fn new(client: reqwest::Client, api_key: Option<String>, email: String) -> Self {
        Self {
            client,
            base_url: EUTILS_BASE.to_string(),
            api_key,
            email,
        }
    }

    /// Point the client at a different base URL. For tests.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Search and fetch up to `limit` recent psychology papers.
    ///
    /// # Errors
    ///
    /// Returns [`CollectError`] on HTTP failure, a malformed esearch
    /// response, or malformed efetch XML.
    pub async fn collect(
        &self,
        limit: usize,
        now: DateTime<Utc>,
    ) -> Result<Vec<RawArticle>, CollectError> {
        let ids = self.search_ids(limit, now).await?;
        if ids.is_empty() {
            tracing::debug!("PubMed search returned no ids");
            return Ok(Vec::new());
        }
        self.fetch_details(&ids).await
    }

    async fn search_ids(
        &self,
        limit: usize,
        now: DateTime<Utc>,
    ) -> Result<Vec<String>, CollectError> {
        let query = build_query(now);
        let encoded = utf8_percent_encode(&query, NON_ALPHANUMERIC).to_string();
        let mut url = format!(
            "{}/esearch.fcgi?db=pubmed&term={encoded}&retmax={limit}&sort=relevance&retmode=json&email={}",
            self.base_url, self.email
        );
        if let Some(key) = &self.api_key {
            url.push_str("&api_key=");
            url.push_str(key);
        }

        let response: EsearchResponse = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()
            .map_err(CollectError::Http)?
            .json()
            .await
            .map_err(|e| CollectError::PubMed(format!("esearch response: {e}")))?;

        Ok(response.esearchresult.idlist)
    }

    async fn fetch_details(&self, ids: &[String]) -> Result<Vec<RawArticle>, CollectError> {
        let url = format!(
            "{}/efetch.fcgi?db=pubmed&id={}&retmode=xml&rettype=abstract",
            self.base_url,
            ids.join(",")
        );
        let xml = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()
            .map_err(CollectError::Http)?
            .text()
            .await?;
        parse_efetch(&xml)
    }
}

/// Build the esearch term: psychology MeSH headings, restricted to the
/// study types the rubric can reward, within the date window, in English.
fn build_query(now: DateTime<Utc>) -> String {
    let since = (now - Duration::days(SEARCH_WINDOW_DAYS)).format("%Y/%m/%d");
    format!(
        "({}) AND ({}) AND (\"{}\"[PDAT] : \"3000\"[PDAT]) AND English[lang]",
        MESH_TERMS.join(" OR "),
        STUDY_TYPE_FILTERS.join(" OR "),
        since
    )
}

/// Parse an efetch XML document into [`RawArticle`]s.
///
/// Pulls `PMID`, `ArticleTitle`, `AbstractText` (sections concatenated),
/// and the `PubDate` components per `PubmedArticle`. Articles without a
/// title are dropped.
///
/// # Errors
///
/// Returns [`CollectError::Xml`] if the XML is malformed.
pub fn parse_efetch(xml: &str) -> Result<Vec<RawArticle>, CollectError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut articles = Vec::new();
    let mut pmid = String::new();
    let mut title = String::new();
    let mut abstract_text = String::new();
    let mut year = String::new();
    let mut month = String::new();
    let mut day = String::new();

    let mut in_pmid = false;
    let mut in_title = false;
    let mut in_abstract = false;
    let mut in_pub_date = false;
    let mut date_tag = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                match e.name().as_ref() {
                    b"PubmedArticle" => {
                        pmid.clear();
                        title.clear();
                        abstract_text.clear();
                        year.clear();
                        month.clear();
                        day.clear();
                    }
                    // CommentsCorrections carry PMIDs too; keep the first.
                    b"PMID" if pmid.is_empty() => in_pmid = true,
                    b"ArticleTitle" => in_title = true,
                    b"AbstractText" => in_abstract = true,
                    b"PubDate" => in_pub_date = true,
                    name if in_pub_date => {
                        date_tag = String::from_utf8_lossy(name).into_owned();
                    }
                    _ => {}
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"PMID" => in_pmid = false,
                b"ArticleTitle" => in_title = false,
                b"AbstractText" => in_abstract = false,
                b"PubDate" => {
                    in_pub_date = false;
                    date_tag.clear();
                }
                b"PubmedArticle" => {
                    if !title.is_empty() {
                        articles.push(RawArticle {
                            title: title.clone(),
                            source: "PubMed".to_string(),
                            url: if pmid.is_empty() {
                                String::new()
                            } else {
                                format!("https://pubmed.ncbi.nlm.nih.gov/{pmid}/")
                            },
                            category: "research".to_string(),
                            body: abstract_text.trim().to_string(),
                            published_date: assemble_date(&year, &month, &day),
                            sample_size: None,
                            effect_size: None,
                        });
                    }
                }
                _ => {}
            },
            Ok(Event::Text(e)) => {
                let text = e.unescape().unwrap_or_default();
                if in_pmid && pmid.is_empty() {
                    pmid = text.trim().to_string();
                } else if in_title {
                    title.push_str(&text);
                } else if in_abstract {
                    if !abstract_text.is_empty() {
                        abstract_text.push(' ');
                    }
                    abstract_text.push_str(&text);
                } else if in_pub_date {
                    match date_tag.as_str() {
                        "Year" => year = text.trim().to_string(),
                        "Month" => month = text.trim().to_string(),
                        "Day" => day = text.trim().to_string(),
                        _ => {}
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(CollectError::Xml(e)),
            _ => {}
        }
    }

    Ok(articles)
}

/// Assemble a date from PubMed's Year/Month/Day components. Month names
/// and numbers are both accepted; missing components default to January 1.
fn assemble_date(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    let year: i32 = year.parse().ok()?;
    let month = month_number(month).unwrap_or(1);
    let day: u32 = day.parse().unwrap_or(1);
    NaiveDate::from_ymd_opt(year, month, day)
        .or_else(|| NaiveDate::from_ymd_opt(year, month, 1))
}

fn month_number(month: &str) -> Option<u32> {
    if let Ok(n) = month.parse::<u32>() {
        return (1..=12).contains(&n).then_some(n);
    }
    let lower = month.to_lowercase();
    let n = match lower.get(..3).unwrap_or(lower.as_str()) {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(n)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    const SAMPLE_EFETCH: &str = r#"<?xml version="1.0" ?>
<PubmedArticleSet>
  <PubmedArticle>
    <MedlineCitation>
      <PMID Version="1">39012345</PMID>
      <Article>
        <Journal>
          <JournalIssue>
            <PubDate><Year>2025</Year><Month>Jun</Month><Day>5</Day></PubDate>
          </JournalIssue>
        </Journal>
        <ArticleTitle>Mindfulness-based intervention for stress: a randomized controlled trial</ArticleTitle>
        <Abstract>
          <AbstractText Label="METHODS">A randomized controlled trial with n = 342 participants.</AbstractText>
          <AbstractText Label="RESULTS">The intervention reduced stress, d = 0.82.</AbstractText>
        </Abstract>
      </Article>
    </MedlineCitation>
  </PubmedArticle>
  <PubmedArticle>
    <MedlineCitation>
      <PMID Version="1">39099999</PMID>
      <Article>
        <Journal>
          <JournalIssue>
            <PubDate><Year>2024</Year><Month>12</Month></PubDate>
          </JournalIssue>
        </Journal>
        <ArticleTitle>Sleep quality in adolescents: a meta-analysis</ArticleTitle>
        <Abstract>
          <AbstractText>Pooled across 24 studies.</AbstractText>
        </Abstract>
      </Article>
    </MedlineCitation>
  </PubmedArticle>
</PubmedArticleSet>"#;

    #[test]
    fn parses_articles_with_abstract_sections_joined() {
        let articles = parse_efetch(SAMPLE_EFETCH).expect("should parse efetch XML");
        assert_eq!(articles.len(), 2, "expected 2 articles, got {}", articles.len());

        let first = &articles[0];
        assert_eq!(
            first.title,
            "Mindfulness-based intervention for stress: a randomized controlled trial"
        );
        assert_eq!(first.source, "PubMed");
        assert_eq!(first.url, "https://pubmed.ncbi.nlm.nih.gov/39012345/");
        assert_eq!(first.published_date, NaiveDate::from_ymd_opt(2025, 6, 5));
        assert!(first.body.contains("n = 342"));
        assert!(first.body.contains("d = 0.82"), "sections must be joined: {}", first.body);
    }

    #[test]
    fn numeric_month_and_missing_day_default_sensibly() {
        let articles = parse_efetch(SAMPLE_EFETCH).unwrap();
        assert_eq!(articles[1].published_date, NaiveDate::from_ymd_opt(2024, 12, 1));
    }

    #[test]
    fn empty_document_yields_no_articles() {
        let articles = parse_efetch("<PubmedArticleSet></PubmedArticleSet>").unwrap();
        assert!(articles.is_empty());
    }

    #[test]
    fn assemble_date_handles_partial_components() {
        assert_eq!(assemble_date("2025", "Jun", "5"), NaiveDate::from_ymd_opt(2025, 6, 5));
        assert_eq!(assemble_date("2025", "", ""), NaiveDate::from_ymd_opt(2025, 1, 1));
        assert_eq!(assemble_date("", "Jun", "5"), None);
    }

    #[test]
    fn month_number_accepts_names_and_numbers() {
        assert_eq!(month_number("Jan"), Some(1));
        assert_eq!(month_number("December"), Some(12));
        assert_eq!(month_number("7"), Some(7));
        assert_eq!(month_number("13"), None);
        assert_eq!(month_number("???"), None);
    }

    #[test]
    fn build_query_includes_filters_and_window() {
        let now = Utc.with_ymd_and_hms(2025, 6, 15, 0, 0, 0).unwrap();
        let query = build_query(now);
        assert!(query.contains("psychology[MeSH]"));
        assert!(query.contains("randomized controlled trial[PT]"));
        assert!(query.contains("2023/06/16"), "date window start missing: {query}");
        assert!(query.contains("English[lang]"));
    }
}
