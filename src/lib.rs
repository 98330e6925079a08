//! searx-harvester: concurrent result harvesting from SearXNG instances
//!
//! Queries many public SearXNG front ends at once, pages through each of
//! them like a browser would, classifies every hit (plain page, file, cloud
//! document) and streams the merged results back with per-instance
//! statistics.

pub mod autocomplete;
pub mod config;
pub mod instances;
pub mod logging;
pub mod metrics;
pub mod network;
pub mod parser;
pub mod query;
pub mod results;
pub mod search;

pub use config::Settings;
pub use instances::Instance;
pub use metrics::{InstanceStats, RunStats};
pub use network::Session;
pub use query::{SearchQuery, TimeRange};
pub use results::{FileKind, SearchResult};
pub use search::{InstancePager, Orchestrator, SearchRun};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT: f64 = 30.0;

/// Maximum request timeout that can be set
pub const MAX_TIMEOUT: f64 = 120.0;

/// Pages fetched per instance unless configured otherwise
pub const DEFAULT_MAX_PAGES: u32 = 5;
