//! Article identity: normalized-title fingerprints and store slugs.
//!
//! Two raw articles describing the same publication must land on the same
//! fingerprint even with minor textual variation (trailing punctuation,
//! HTML entities, case, stray whitespace), so everything identity-related
//! goes through [`normalize_title`] first.

use chrono::NaiveDate;
use sha2::{Digest, Sha256};

/// Longest slug fragment kept after the date prefix.
const SLUG_FRAGMENT_MAX: usize = 60;

/// Deterministic identity for one article: SHA-256 over the normalized
/// title, normalized source, and ISO publication date.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    hex: String,
}

impl Fingerprint {
    #[must_use]
    pub fn compute(title: &str, source: &str, date: NaiveDate) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(normalize_title(title));
        hasher.update(b"\n");
        hasher.update(normalize_title(source));
        hasher.update(b"\n");
        hasher.update(date.format("%Y-%m-%d").to_string());
        let digest = hasher.finalize();
        let mut hex = String::with_capacity(64);
        for byte in digest {
            use std::fmt::Write;
            let _ = write!(hex, "{byte:02x}");
        }
        Fingerprint { hex }
    }

    #[must_use]
    pub fn as_hex(&self) -> &str {
        &self.hex
    }
}

/// Normalize free text for identity comparison: unescape common HTML
/// entities, case-fold, strip punctuation, collapse whitespace.
#[must_use]
pub fn normalize_title(title: &str) -> String {
    let unescaped = unescape_entities(title);
    let mut out = String::with_capacity(unescaped.len());
    let mut last_was_space = true;
    for c in unescaped.chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
            last_was_space = false;
        } else if !last_was_space {
            out.push(' ');
            last_was_space = true;
        }
    }
    while out.ends_with(' ') {
        out.pop();
    }
    out
}

/// Stable identifier for a published article: `YYYYMMDD-` date prefix plus a
/// hyphenated fragment of the normalized title.
///
/// Deterministic by construction, so reprocessing the same article yields
/// the same slug. Distinct articles that still collide are handled upstream
/// as duplicate-rejects; the first stored article is never overwritten.
#[must_use]
pub fn slug_for(date: NaiveDate, title: &str) -> String {
    let normalized = normalize_title(title);
    let mut fragment = String::with_capacity(SLUG_FRAGMENT_MAX);
    for word in normalized.split(' ') {
        if word.is_empty() {
            continue;
        }
        if !fragment.is_empty() {
            if fragment.len() + 1 + word.len() > SLUG_FRAGMENT_MAX {
                break;
            }
            fragment.push('-');
        } else if word.len() > SLUG_FRAGMENT_MAX {
            fragment.extend(word.chars().take(SLUG_FRAGMENT_MAX));
            break;
        }
        fragment.push_str(word);
    }
    if fragment.is_empty() {
        fragment.push_str("untitled");
    }
    format!("{}-{fragment}", date.format("%Y%m%d"))
}

/// Unescape the HTML entities that commonly survive in feed titles.
///
/// Handles the named set (`&amp;` `&lt;` `&gt;` `&quot;` `&apos;` `&nbsp;`)
/// plus decimal and hex numeric references. Unknown entities pass through
/// unchanged.
fn unescape_entities(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        match tail.find(';') {
            // Entities are short; anything longer is not one.
            Some(semi) if semi <= 10 => {
                let entity = &tail[1..semi];
                match decode_entity(entity) {
                    Some(c) => out.push(c),
                    None => out.push_str(&tail[..=semi]),
                }
                rest = &tail[semi + 1..];
            }
            _ => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let code = if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else if let Some(dec) = entity.strip_prefix('#') {
                dec.parse::<u32>().ok()?
            } else {
                return None;
            };
            char::from_u32(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn normalize_strips_punctuation_and_case() {
        assert_eq!(
            normalize_title("Mindfulness Reduces Stress!"),
            "mindfulness reduces stress"
        );
        assert_eq!(
            normalize_title("  Mindfulness   reduces — stress...  "),
            "mindfulness reduces stress"
        );
    }

    #[test]
    fn normalize_unescapes_html_entities() {
        assert_eq!(
            normalize_title("Sleep &amp; Memory"),
            normalize_title("Sleep & Memory")
        );
        assert_eq!(
            normalize_title("Don&#39;t Worry"),
            normalize_title("Don't Worry")
        );
        assert_eq!(
            normalize_title("Don&#x27;t Worry"),
            normalize_title("Don't Worry")
        );
    }

    #[test]
    fn trailing_punctuation_does_not_change_fingerprint() {
        let d = date(2025, 6, 1);
        let a = Fingerprint::compute("Mindfulness reduces stress.", "PsyPost", d);
        let b = Fingerprint::compute("Mindfulness reduces stress", "PsyPost", d);
        assert_eq!(a, b);
    }

    #[test]
    fn different_source_changes_fingerprint() {
        let d = date(2025, 6, 1);
        let a = Fingerprint::compute("Mindfulness reduces stress", "PsyPost", d);
        let b = Fingerprint::compute("Mindfulness reduces stress", "APA", d);
        assert_ne!(a, b);
    }

    #[test]
    fn different_date_changes_fingerprint() {
        let a = Fingerprint::compute("Mindfulness reduces stress", "PsyPost", date(2025, 6, 1));
        let b = Fingerprint::compute("Mindfulness reduces stress", "PsyPost", date(2025, 6, 2));
        assert_ne!(a, b);
    }

    #[test]
    fn slug_has_date_prefix_and_title_fragment() {
        let slug = slug_for(date(2025, 6, 1), "Mindfulness Reduces Stress!");
        assert_eq!(slug, "20250601-mindfulness-reduces-stress");
    }

    #[test]
    fn slug_is_deterministic_across_variants() {
        let d = date(2025, 6, 1);
        let a = slug_for(d, "Sleep &amp; Memory...");
        let b = slug_for(d, "Sleep & Memory");
        assert_eq!(a, b);
    }

    #[test]
    fn slug_fragment_is_truncated_at_word_boundary() {
        let long = "a very long headline about the surprising effects of daily mindfulness practice on working memory";
        let slug = slug_for(date(2025, 6, 1), long);
        let fragment = slug.strip_prefix("20250601-").unwrap();
        assert!(fragment.len() <= SLUG_FRAGMENT_MAX, "fragment too long: {fragment}");
        assert!(!fragment.ends_with('-'));
    }

    #[test]
    fn empty_title_gets_placeholder_fragment() {
        assert_eq!(slug_for(date(2025, 6, 1), "!!!"), "20250601-untitled");
    }
}
