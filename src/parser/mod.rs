//! HTML result page parser
//!
//! Extracts organic results from a rendered SearXNG page. Markup comes from
//! third-party instances and is treated as untrusted: a container that does
//! not follow the expected layout is skipped, never fatal.
//!
//! Expected layout of one result container:
//!
//! ```html
//! <article class="result">
//!   <h3><a href="https://example.com/">Title</a></h3>
//!   <p class="content">Description</p>
//!   <div class="engines"><span>google</span><a href="...">cached</a></div>
//! </article>
//! ```

use crate::results::SearchResult;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

fn selector(css: &'static str) -> Selector {
    Selector::parse(css).expect("static selector")
}

static RESULT: Lazy<Selector> = Lazy::new(|| selector("article.result"));
static HEADING: Lazy<Selector> = Lazy::new(|| selector("h3"));
static LINK: Lazy<Selector> = Lazy::new(|| selector("a"));
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| selector("p"));
static ENGINES: Lazy<Selector> = Lazy::new(|| selector("div.engines"));
static ENGINE: Lazy<Selector> = Lazy::new(|| selector("span"));
static CACHED: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)cached").expect("static regex"));

/// Why a result container was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingHeading,
    MissingLink,
    EmptyTitle,
    EmptyUrl,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingHeading => write!(f, "no heading"),
            Self::MissingLink => write!(f, "no link in heading"),
            Self::EmptyTitle => write!(f, "empty title"),
            Self::EmptyUrl => write!(f, "empty URL"),
        }
    }
}

/// Parse every result container on a page.
///
/// Positions count only containers that produced a result, in document
/// order. An empty vector means the page had no results, which callers
/// treat as the end of pagination.
pub fn parse(markup: &str, page_number: u32) -> Vec<SearchResult> {
    let document = Html::parse_document(markup);
    let mut results = Vec::new();

    for (index, container) in document.select(&RESULT).enumerate() {
        let position = results.len() as u32 + 1;
        match parse_container(container, position, page_number) {
            Ok(result) => results.push(result),
            Err(reason) => debug!(
                page = page_number,
                container = index + 1,
                "Skipping result container: {}",
                reason
            ),
        }
    }

    debug!("Parsed {} results from page {}", results.len(), page_number);
    results
}

fn parse_container(
    container: ElementRef<'_>,
    position: u32,
    page_number: u32,
) -> Result<SearchResult, SkipReason> {
    let heading = container
        .select(&HEADING)
        .next()
        .ok_or(SkipReason::MissingHeading)?;
    let link = heading.select(&LINK).next().ok_or(SkipReason::MissingLink)?;

    let title = collapse_text(link);
    if title.is_empty() {
        return Err(SkipReason::EmptyTitle);
    }

    let url = link.value().attr("href").map(str::trim).unwrap_or_default();
    if url.is_empty() {
        return Err(SkipReason::EmptyUrl);
    }

    let description = container
        .select(&PARAGRAPH)
        .next()
        .map(collapse_text)
        .unwrap_or_default();

    let engines = container
        .select(&ENGINES)
        .next()
        .map(|group| {
            group
                .select(&ENGINE)
                .map(collapse_text)
                .filter(|name| !name.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let cached_url = container
        .select(&LINK)
        .find(|a| CACHED.is_match(&a.text().collect::<String>()))
        .and_then(|a| a.value().attr("href"))
        .map(str::to_string);

    Ok(SearchResult::new(title, url.to_string(), position, page_number)
        .with_description(description)
        .with_engines(engines)
        .with_cached_url(cached_url))
}

fn collapse_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::FileKind;

    const FULL_RESULT: &str = r#"
        <article class="result result-default category-general">
          <a href="https://example.com/a" class="url_header">example.com › a</a>
          <h3><a href="https://example.com/a">  First
              <span class="highlight">hit</span> </a></h3>
          <p class="content">A   description
             over lines</p>
          <div class="engines">
            <span>google</span><span>bing</span>
            <a href="https://web.archive.org/web/https://example.com/a" class="cache_link">Cached</a>
          </div>
        </article>
    "#;

    #[test]
    fn test_no_containers() {
        let html = "<html><body><div id='results'><p>No results</p></div></body></html>";
        assert!(parse(html, 3).is_empty());
        assert!(parse("", 1).is_empty());
    }

    #[test]
    fn test_full_result() {
        let html = format!("<html><body>{}</body></html>", FULL_RESULT);
        let results = parse(&html, 2);

        assert_eq!(results.len(), 1);
        let r = &results[0];
        assert_eq!(r.title, "First hit");
        assert_eq!(r.url, "https://example.com/a");
        assert_eq!(r.description, "A description over lines");
        assert_eq!(r.domain, "example.com");
        assert_eq!(r.engines, vec!["google", "bing"]);
        assert_eq!(
            r.cached_url.as_deref(),
            Some("https://web.archive.org/web/https://example.com/a")
        );
        assert_eq!(r.position, 1);
        assert_eq!(r.page_number, 2);
        assert!(!r.is_file);
    }

    #[test]
    fn test_malformed_container_consumes_no_position() {
        let html = r#"
            <article class="result"><p>no heading at all</p></article>
            <article class="result">
              <h3><a href="https://files.example.org/manual.pdf">Manual</a></h3>
            </article>
        "#;
        let results = parse(html, 1);

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].position, 1);
        assert_eq!(results[0].file_kind, Some(FileKind::Pdf));
        assert_eq!(results[0].description, "");
        assert!(results[0].engines.is_empty());
        assert!(results[0].cached_url.is_none());
    }

    #[test]
    fn test_positions_skip_bad_containers() {
        let html = r#"
            <article class="result"><h3><a href="https://a.example/">A</a></h3></article>
            <article class="result"><h3>heading without link</h3></article>
            <article class="result"><h3><a href="">No URL</a></h3></article>
            <article class="result"><h3><a href="https://b.example/">   </a></h3></article>
            <article class="result"><h3><a href="https://c.example/">C</a></h3></article>
        "#;
        let results = parse(html, 1);

        let titles: Vec<_> = results.iter().map(|r| (r.title.as_str(), r.position)).collect();
        assert_eq!(titles, vec![("A", 1), ("C", 2)]);
    }

    #[test]
    fn test_other_articles_ignored() {
        let html = r#"
            <article class="infobox"><h3><a href="https://wiki.example/">Infobox</a></h3></article>
            <article class="result"><h3><a href="https://a.example/">A</a></h3></article>
        "#;
        let results = parse(html, 1);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "A");
    }

    #[test]
    fn test_skip_reason_display() {
        assert_eq!(SkipReason::MissingLink.to_string(), "no link in heading");
    }
}
