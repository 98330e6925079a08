//! Search query model
//!
//! Turns a user search request into the exact parameter sets a SearXNG
//! instance expects: URL parameters for the first page and a form body for
//! every later page.

use crate::config::ScraperSettings;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A search request, shaped for SearXNG
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchQuery {
    /// Free-text search terms
    pub query: String,
    /// Language code
    pub language: String,
    /// Safe search level (0, 1, 2)
    pub safesearch: u8,
    /// Time range filter
    pub time_range: Option<TimeRange>,
    /// Category filter
    #[serde(default)]
    pub categories: Vec<String>,
    /// Engine filter
    #[serde(default)]
    pub engines: Vec<String>,
    /// Page number (1-indexed)
    pub pageno: u32,
}

impl SearchQuery {
    /// Create a query with default language and safe search
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            language: "en".to_string(),
            safesearch: 1,
            time_range: None,
            categories: Vec::new(),
            engines: Vec::new(),
            pageno: 1,
        }
    }

    /// Create a query using the configured defaults
    pub fn from_settings(query: impl Into<String>, settings: &ScraperSettings) -> Self {
        Self::new(query)
            .with_language(settings.default_language.clone())
            .with_safesearch(settings.default_safesearch)
    }

    /// Set language
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Set safe search
    pub fn with_safesearch(mut self, level: u8) -> Self {
        self.safesearch = level.min(2);
        self
    }

    /// Set time range
    pub fn with_time_range(mut self, range: TimeRange) -> Self {
        self.time_range = Some(range);
        self
    }

    /// Restrict to categories
    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    /// Restrict to engines
    pub fn with_engines<I, S>(mut self, engines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.engines = engines.into_iter().map(Into::into).collect();
        self
    }

    /// Set page number
    pub fn with_page(mut self, page: u32) -> Self {
        self.pageno = page.max(1);
        self
    }

    fn time_range_str(&self) -> &'static str {
        self.time_range.map(|r| r.as_str()).unwrap_or("")
    }

    /// URL parameters of a first-page GET request.
    ///
    /// `time_range` is always present, empty when unset.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("q".to_string(), self.query.clone()),
            ("language".to_string(), self.language.clone()),
            ("safesearch".to_string(), self.safesearch.to_string()),
            ("pageno".to_string(), self.pageno.to_string()),
            ("time_range".to_string(), self.time_range_str().to_string()),
            ("category_general".to_string(), "1".to_string()),
            ("theme".to_string(), "simple".to_string()),
        ];

        if !self.categories.is_empty() {
            params.push(("categories".to_string(), self.categories.join(",")));
        }

        if !self.engines.is_empty() {
            params.push(("engines".to_string(), self.engines.join(",")));
        }

        params
    }

    /// Form body of a "load more" POST request, using the current page number
    pub fn to_form_fields(&self) -> Vec<(String, String)> {
        vec![
            ("q".to_string(), self.query.clone()),
            ("category_general".to_string(), "1".to_string()),
            ("pageno".to_string(), self.pageno.to_string()),
            ("language".to_string(), self.language.clone()),
            ("time_range".to_string(), self.time_range_str().to_string()),
            ("safesearch".to_string(), self.safesearch.to_string()),
            ("theme".to_string(), "simple".to_string()),
        ]
    }
}

/// Time range filter for search results
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TimeRange {
    Day,
    Week,
    Month,
    Year,
}

impl TimeRange {
    /// Get the string representation for API calls
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }
}

impl std::fmt::Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TimeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            other => Err(format!("unknown time range: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(pairs: &[(String, String)]) -> Vec<&str> {
        pairs.iter().map(|(k, _)| k.as_str()).collect()
    }

    #[test]
    fn test_params_order_and_empty_time_range() {
        let query = SearchQuery::new("open directory");
        let params = query.to_params();

        assert_eq!(
            keys(&params),
            vec!["q", "language", "safesearch", "pageno", "time_range", "category_general", "theme"]
        );
        assert_eq!(params[4], ("time_range".to_string(), String::new()));
        assert_eq!(params[3].1, "1");
    }

    #[test]
    fn test_params_filters() {
        let query = SearchQuery::new("rust")
            .with_time_range(TimeRange::Week)
            .with_categories(["general", "files"])
            .with_engines(["bing"]);
        let params = query.to_params();

        assert_eq!(params[4].1, "week");
        assert_eq!(params[7], ("categories".to_string(), "general,files".to_string()));
        assert_eq!(params[8], ("engines".to_string(), "bing".to_string()));
    }

    #[test]
    fn test_form_fields_follow_page() {
        let mut query = SearchQuery::new("s");
        query.pageno = 4;
        let form = query.to_form_fields();

        assert_eq!(
            keys(&form),
            vec!["q", "category_general", "pageno", "language", "time_range", "safesearch", "theme"]
        );
        assert_eq!(form[2].1, "4");
        assert_eq!(form[4].1, "");
    }

    #[test]
    fn test_builder_clamps() {
        let query = SearchQuery::new("x").with_safesearch(9).with_page(0);
        assert_eq!(query.safesearch, 2);
        assert_eq!(query.pageno, 1);
    }

    #[test]
    fn test_from_settings() {
        let settings = ScraperSettings {
            default_language: "de".to_string(),
            default_safesearch: 0,
            ..Default::default()
        };
        let query = SearchQuery::from_settings("x", &settings);
        assert_eq!(query.language, "de");
        assert_eq!(query.safesearch, 0);
    }

    #[test]
    fn test_time_range_parse() {
        assert_eq!("Month".parse::<TimeRange>(), Ok(TimeRange::Month));
        assert!("decade".parse::<TimeRange>().is_err());
    }
}
