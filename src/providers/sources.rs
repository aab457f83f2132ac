//! Citation extraction from answer text

use once_cell::sync::Lazy;
use regex::Regex;

use crate::conversation::Source;

static URL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://[^\s]+").expect("URL pattern is valid"));

const FALLBACK_TITLE: &str = "Research Link";

/// Every URL in the text as a source, titled by its last path segment
pub fn scrape_url_sources(text: &str) -> Vec<Source> {
    let sources = URL_PATTERN
        .find_iter(text)
        .map(|m| {
            let url = m.as_str();
            let title = url.rsplit('/').next().unwrap_or_default();
            Source {
                url: url.to_string(),
                title: if title.is_empty() {
                    FALLBACK_TITLE.to_string()
                } else {
                    title.to_string()
                },
            }
        })
        .collect();

    dedup_sources(sources)
}

/// Drop repeated URLs, keeping the first occurrence
pub fn dedup_sources(sources: Vec<Source>) -> Vec<Source> {
    let mut unique: Vec<Source> = Vec::with_capacity(sources.len());
    for source in sources {
        if !unique.iter().any(|s| s.url == source.url) {
            unique.push(source);
        }
    }
    unique
}
