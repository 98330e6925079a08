//! Settings structures for harvester configuration

use crate::instances::Instance;
use crate::network::DEFAULT_USER_AGENT;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Main settings structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub scraper: ScraperSettings,
    pub outgoing: OutgoingSettings,
    pub logging: LoggingSettings,
    pub instances: Vec<Instance>,
}

impl Settings {
    /// Load settings from a YAML file, or JSON when the extension is `.json`
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let settings = if is_json {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };
        Ok(settings)
    }

    /// Merge with environment variables
    pub fn merge_env(&mut self) {
        if let Ok(val) = std::env::var("SCRAPER_DELAY") {
            if let Ok(delay) = val.parse() {
                self.scraper.default_delay = delay;
            }
        }
        if let Ok(val) = std::env::var("SCRAPER_MAX_PAGES") {
            if let Ok(pages) = val.parse() {
                self.scraper.max_pages = pages;
            }
        }
        if let Ok(val) = std::env::var("SCRAPER_LANGUAGE") {
            self.scraper.default_language = val;
        }
        if let Ok(val) = std::env::var("SCRAPER_SAFESEARCH") {
            if let Ok(level) = val.parse::<u8>() {
                self.scraper.default_safesearch = level.min(2);
            }
        }
        if let Ok(val) = std::env::var("SCRAPER_CONCURRENT_REQUESTS") {
            if let Ok(limit) = val.parse() {
                self.scraper.concurrent_requests = limit;
            }
        }
        if let Ok(val) = std::env::var("SCRAPER_USER_AGENT") {
            self.outgoing.user_agent = val;
        }
        if let Ok(val) = std::env::var("LOG_LEVEL") {
            self.logging.level = val;
        }
        if self.instances.is_empty() {
            if let Ok(val) = std::env::var("DEFAULT_SEARXNG_INSTANCES") {
                match serde_json::from_str::<Vec<Instance>>(&val) {
                    Ok(instances) => self.instances = instances,
                    Err(e) => tracing::error!("Error parsing DEFAULT_SEARXNG_INSTANCES: {}", e),
                }
            }
        }
    }

    /// Check the settings and return a list of human readable issues
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.scraper.default_delay < 0.0 {
            issues.push("Scraper delay cannot be negative".to_string());
        }
        if self.scraper.max_pages < 1 {
            issues.push("Max pages must be at least 1".to_string());
        }
        if self.scraper.concurrent_requests < 1 {
            issues.push("Concurrent requests must be at least 1".to_string());
        }
        if self.outgoing.request_timeout <= 0.0 {
            issues.push("Request timeout must be positive".to_string());
        }
        if self.outgoing.max_connections < 1 || self.outgoing.max_connections_per_host < 1 {
            issues.push("Connection limits must be at least 1".to_string());
        }

        let mut urls = HashSet::new();
        for instance in &self.instances {
            if instance.url.is_empty() {
                issues.push(format!("Instance '{}' has no URL", instance.name));
            } else if !urls.insert(instance.url.as_str()) {
                issues.push(format!("Duplicate instance URL: {}", instance.url));
            }

            if instance.name.is_empty() {
                issues.push(format!("Instance with URL '{}' has no name", instance.url));
            }
        }

        issues
    }

    /// Get all active instances
    pub fn active_instances(&self) -> Vec<&Instance> {
        self.instances.iter().filter(|i| i.is_active).collect()
    }

    /// Get instances carrying a tag
    pub fn instances_by_tag(&self, tag: &str) -> Vec<&Instance> {
        self.instances
            .iter()
            .filter(|i| i.tags.iter().any(|t| t == tag))
            .collect()
    }

    /// Get an instance by its base URL
    pub fn get_instance_by_url(&self, url: &str) -> Option<&Instance> {
        self.instances.iter().find(|i| i.url == url)
    }

    /// Build an instance from a bare URL, named after its host and paced by
    /// the configured default delay
    pub fn instance_from_url(&self, url: &str) -> Instance {
        let name = url::Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(String::from))
            .unwrap_or_else(|| url.to_string());
        Instance::new(name, url)
            .with_rate_limit_delay(self.scraper.default_delay)
            .with_timeout(self.outgoing.request_timeout)
    }
}

/// Pagination and fan-out behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperSettings {
    /// Page cap per instance when the caller does not supply one
    pub max_pages: u32,
    /// Number of instances searched at the same time
    pub concurrent_requests: usize,
    /// Language used by `SearchQuery::from_settings`
    pub default_language: String,
    /// Safe search level used by `SearchQuery::from_settings`
    pub default_safesearch: u8,
    /// Rate-limit delay (seconds) for instances built from a bare URL
    pub default_delay: f64,
}

impl Default for ScraperSettings {
    fn default() -> Self {
        Self {
            max_pages: crate::DEFAULT_MAX_PAGES,
            concurrent_requests: 3,
            default_language: "en".to_string(),
            default_safesearch: 1,
            default_delay: 1.0,
        }
    }
}

/// Outgoing request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutgoingSettings {
    /// Default request timeout in seconds
    pub request_timeout: f64,
    /// Maximum in-flight requests across all instances
    pub max_connections: usize,
    /// Maximum in-flight requests to a single host
    pub max_connections_per_host: usize,
    /// User agent sent with every request
    pub user_agent: String,
    /// Verify SSL certificates
    pub verify_ssl: bool,
    /// Proxy settings
    pub proxies: ProxySettings,
    /// Extra headers to send with every request
    pub extra_headers: HashMap<String, String>,
}

impl Default for OutgoingSettings {
    fn default() -> Self {
        Self {
            request_timeout: crate::DEFAULT_TIMEOUT,
            max_connections: 6,
            max_connections_per_host: 3,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            verify_ssl: true,
            proxies: ProxySettings::default(),
            extra_headers: HashMap::new(),
        }
    }
}

/// Proxy settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    pub http: Option<String>,
    pub https: Option<String>,
    pub all: Option<String>,
}

/// Log output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    /// Print the module target next to each line
    pub with_target: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            with_target: false,
        }
    }
}
