//! SearXNG instance snapshots
//!
//! An [`Instance`] is a read-only description of one SearXNG front end.
//! The registry that owns these records lives outside this crate; the
//! harvester only ever receives clones.

mod health;

pub use health::{probe, probe_all, InstanceHealth};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

/// One SearXNG front end
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Instance {
    /// Display name, unique within a registry
    pub name: String,
    /// Base URL, e.g. `https://search.example.org`
    pub url: String,
    /// Inactive instances are never contacted
    #[serde(alias = "active")]
    pub is_active: bool,
    pub description: Option<String>,
    /// Per-request timeout in seconds
    pub timeout: f64,
    /// Retry budget. Kept for the registry; pagination never retries a page.
    pub max_retries: u32,
    /// Pause between consecutive pages, in seconds
    pub rate_limit_delay: f64,
    /// Headers layered over the built-in request headers
    pub custom_headers: HashMap<String, String>,
    /// Higher number = searched earlier
    pub priority: i32,
    pub tags: Vec<String>,
}

impl Default for Instance {
    fn default() -> Self {
        Self {
            name: String::new(),
            url: String::new(),
            is_active: true,
            description: None,
            timeout: crate::DEFAULT_TIMEOUT,
            max_retries: 3,
            rate_limit_delay: 1.0,
            custom_headers: HashMap::new(),
            priority: 1,
            tags: Vec::new(),
        }
    }
}

impl Instance {
    /// Create an active instance with default limits
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set the per-request timeout in seconds
    pub fn with_timeout(mut self, seconds: f64) -> Self {
        self.timeout = seconds;
        self
    }

    /// Set the delay between pages in seconds
    pub fn with_rate_limit_delay(mut self, seconds: f64) -> Self {
        self.rate_limit_delay = seconds;
        self
    }

    /// Mark the instance active or inactive
    pub fn with_active(mut self, active: bool) -> Self {
        self.is_active = active;
        self
    }

    /// Set the priority
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Add a custom header
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_headers.insert(key.into(), value.into());
        self
    }

    /// Key used for per-instance statistics
    pub fn key(&self) -> String {
        format!("{}_{}", self.name, self.url)
    }

    /// Absolute URL of the search endpoint
    pub fn search_url(&self) -> Result<Url, url::ParseError> {
        self.endpoint("/search")
    }

    /// Absolute URL of an endpoint path on this instance
    pub fn endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        Url::parse(&self.url)?.join(path)
    }

    /// Serialized origin, sent as the `Origin` header of in-page requests
    pub fn origin(&self) -> String {
        Url::parse(&self.url)
            .map(|u| u.origin().ascii_serialization())
            .unwrap_or_else(|_| self.url.trim_end_matches('/').to_string())
    }

    /// Effective request timeout, clamped to a sane range
    pub fn request_timeout(&self) -> Duration {
        let seconds = if self.timeout > 0.0 {
            self.timeout.min(crate::MAX_TIMEOUT)
        } else {
            crate::DEFAULT_TIMEOUT
        };
        Duration::from_secs_f64(seconds)
    }

    /// Effective delay between pages; invalid values mean no delay
    pub fn rate_limit(&self) -> Duration {
        Duration::try_from_secs_f64(self.rate_limit_delay).unwrap_or(Duration::ZERO)
    }
}
