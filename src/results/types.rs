//! Result type definitions

use super::classify::{classify, Classification, FileKind};
use serde::{Deserialize, Serialize};

/// A single organic search hit scraped from an instance
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    /// The title of the result
    pub title: String,
    /// The URL of the result
    pub url: String,
    /// Content snippet
    pub description: String,
    /// Authority of `url` as written, empty for relative links
    pub domain: String,
    /// Engines the instance credited for this hit
    pub engines: Vec<String>,
    /// Link to the cached copy, if the instance offered one
    pub cached_url: Option<String>,
    /// 1-based position within its page
    pub position: u32,
    /// Page the result was found on
    pub page_number: u32,
    pub is_file: bool,
    pub file_kind: Option<FileKind>,
    pub is_cloud_doc: bool,
    pub is_cloud_drive: bool,
    /// Name of the instance that returned the result
    pub instance: Option<String>,
}

impl SearchResult {
    /// Create a result; domain and classification are derived here once
    pub fn new(title: String, url: String, position: u32, page_number: u32) -> Self {
        let domain = domain_of(&url);
        let Classification {
            is_file,
            file_kind,
            is_cloud_doc,
            is_cloud_drive,
        } = classify(&url, &title);

        Self {
            title,
            url,
            description: String::new(),
            domain,
            engines: Vec::new(),
            cached_url: None,
            position,
            page_number,
            is_file,
            file_kind,
            is_cloud_doc,
            is_cloud_drive,
            instance: None,
        }
    }

    /// Add the content snippet
    pub fn with_description(mut self, description: String) -> Self {
        self.description = description;
        self
    }

    /// Add the contributing engines
    pub fn with_engines(mut self, engines: Vec<String>) -> Self {
        self.engines = engines;
        self
    }

    /// Add the cached-copy link
    pub fn with_cached_url(mut self, cached_url: Option<String>) -> Self {
        self.cached_url = cached_url;
        self
    }

    /// Tag the result with the instance that produced it
    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }
}

/// Authority part of an absolute or protocol-relative URL, verbatim.
///
/// Userinfo, letter case and any explicit port are kept as they appear.
fn domain_of(url: &str) -> String {
    let rest = if let Some(rest) = url.strip_prefix("//") {
        rest
    } else {
        match url.split_once("://") {
            Some((scheme, rest)) if is_scheme(scheme) => rest,
            _ => return String::new(),
        }
    };

    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    rest[..end].to_string()
}

fn is_scheme(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_fields() {
        let result = SearchResult::new(
            "Datasheet".to_string(),
            "https://files.example.com:8443/datasheet.pdf".to_string(),
            1,
            2,
        );
        assert_eq!(result.domain, "files.example.com:8443");
        assert!(result.is_file);
        assert_eq!(result.file_kind, Some(FileKind::Pdf));
        assert_eq!(result.page_number, 2);
    }

    #[test]
    fn test_unparseable_url_has_empty_domain() {
        let result = SearchResult::new("Relative".to_string(), "/relative/link".to_string(), 1, 1);
        assert_eq!(result.domain, "");
        assert!(!result.is_file);

        let result = SearchResult::new("Odd".to_string(), "not a url://x".to_string(), 1, 1);
        assert_eq!(result.domain, "");
    }

    #[test]
    fn test_domain_is_authority_verbatim() {
        assert_eq!(domain_of("https://user@a.com:443/x"), "user@a.com:443");
        assert_eq!(domain_of("https://A.COM/x"), "A.COM");
        assert_eq!(domain_of("//cdn.example.com/f.pdf"), "cdn.example.com");
        assert_eq!(domain_of("http://example.com?q=1"), "example.com");
        assert_eq!(domain_of("http://example.com#top"), "example.com");
        assert_eq!(domain_of("ftp://mirror.example.org"), "mirror.example.org");
    }

    #[test]
    fn test_serializes_for_storage() {
        let result = SearchResult::new(
            "Doc".to_string(),
            "https://docs.google.com/document/d/1".to_string(),
            3,
            1,
        )
        .with_instance("priv_au");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["file_kind"], "google_doc");
        assert_eq!(json["is_cloud_drive"], true);
        assert_eq!(json["instance"], "priv_au");
        assert_eq!(json["domain"], "docs.google.com");
    }
}
