//! Search statistics
//!
//! Tracks per-instance page counts, error rates and response times, plus
//! run-wide totals. Values are plain data: each pager owns its
//! [`InstanceStats`] and hands it back when it finishes, and the collector
//! of a run folds them into one [`RunStats`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Counters for one instance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstanceStats {
    /// Instance name
    pub name: String,
    /// Pages answered with 200, empty ones included
    pub responses: u64,
    /// Pages that produced at least one result
    pub pages_fetched: u64,
    /// Results handed to the consumer
    pub results: u64,
    /// Failed pages, timeouts included
    pub errors: u64,
    pub timeouts: u64,
    /// Mean response time of answered pages, in seconds
    pub avg_response_time: f64,
    pub last_error: Option<String>,
}

impl InstanceStats {
    /// Create empty stats for an instance
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Record a 200 answer and fold its response time into the mean
    pub fn record_response(&mut self, elapsed: Duration) {
        self.responses += 1;
        let n = self.responses as f64;
        self.avg_response_time =
            (self.avg_response_time * (n - 1.0) + elapsed.as_secs_f64()) / n;
    }

    /// Record a page that produced results
    pub fn record_page(&mut self) {
        self.pages_fetched += 1;
    }

    /// Record results delivered to the consumer
    pub fn record_results(&mut self, count: usize) {
        self.results += count as u64;
    }

    /// Record a failed page
    pub fn record_error(&mut self, message: impl Into<String>, timed_out: bool) {
        self.errors += 1;
        if timed_out {
            self.timeouts += 1;
        }
        self.last_error = Some(message.into());
    }

    /// Error ratio over every page attempt, in percent
    pub fn error_rate(&self) -> f64 {
        let attempts = self.responses + self.errors;
        if attempts == 0 {
            0.0
        } else {
            (self.errors as f64 / attempts as f64) * 100.0
        }
    }

    /// Fold another set of counters for the same instance into this one.
    ///
    /// The mean is weighted by the responses each side received.
    pub fn merge(&mut self, other: &InstanceStats) {
        let responses = self.responses + other.responses;
        if responses > 0 {
            self.avg_response_time = (self.avg_response_time * self.responses as f64
                + other.avg_response_time * other.responses as f64)
                / responses as f64;
        }
        self.responses = responses;
        self.pages_fetched += other.pages_fetched;
        self.results += other.results;
        self.errors += other.errors;
        self.timeouts += other.timeouts;
        if other.last_error.is_some() {
            self.last_error = other.last_error.clone();
        }
    }
}

/// Statistics of one run, or cumulative over many
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub total_queries: u64,
    pub successful_queries: u64,
    pub failed_queries: u64,
    pub total_results: u64,
    /// Keyed by instance key (`"{name}_{url}"`)
    pub instance_stats: BTreeMap<String, InstanceStats>,
    pub last_reset: DateTime<Utc>,
}

impl RunStats {
    pub fn new() -> Self {
        Self {
            total_queries: 0,
            successful_queries: 0,
            failed_queries: 0,
            total_results: 0,
            instance_stats: BTreeMap::new(),
            last_reset: Utc::now(),
        }
    }

    /// Add the counters of one instance
    pub fn absorb(&mut self, key: &str, stats: &InstanceStats) {
        self.total_results += stats.results;
        self.instance_stats
            .entry(key.to_string())
            .or_insert_with(|| InstanceStats::new(stats.name.clone()))
            .merge(stats);
    }

    /// Count a finished query
    pub fn record_query(&mut self, yielded_results: bool) {
        self.total_queries += 1;
        if yielded_results {
            self.successful_queries += 1;
        } else {
            self.failed_queries += 1;
        }
    }

    /// Fold a finished run into these cumulative statistics
    pub fn merge(&mut self, run: &RunStats) {
        self.total_queries += run.total_queries;
        self.successful_queries += run.successful_queries;
        self.failed_queries += run.failed_queries;
        for (key, stats) in &run.instance_stats {
            self.absorb(key, stats);
        }
    }

    /// Clear all counters and restart the reset clock
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Look up an instance by key
    pub fn instance(&self, key: &str) -> Option<&InstanceStats> {
        self.instance_stats.get(key)
    }
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_average() {
        let mut stats = InstanceStats::new("a");
        stats.record_response(Duration::from_secs(1));
        stats.record_response(Duration::from_secs(2));
        stats.record_response(Duration::from_secs(3));

        assert_eq!(stats.responses, 3);
        assert_eq!(stats.pages_fetched, 0);
        assert_eq!(stats.avg_response_time, 2.0);
    }

    #[test]
    fn test_error_tracking() {
        let mut stats = InstanceStats::new("a");
        stats.record_response(Duration::from_millis(100));
        stats.record_error("HTTP 500", false);
        stats.record_error("request timed out", true);

        assert_eq!(stats.errors, 2);
        assert_eq!(stats.timeouts, 1);
        assert_eq!(stats.last_error.as_deref(), Some("request timed out"));
        assert!((stats.error_rate() - 66.666).abs() < 0.01);
        assert_eq!(InstanceStats::new("b").error_rate(), 0.0);
    }

    #[test]
    fn test_merge_weights_average() {
        let mut a = InstanceStats::new("a");
        a.record_response(Duration::from_secs(1));
        a.record_page();

        let mut b = InstanceStats::new("a");
        b.record_response(Duration::from_secs(4));
        b.record_response(Duration::from_secs(4));
        b.record_page();
        b.record_results(7);

        a.merge(&b);
        assert_eq!(a.responses, 3);
        assert_eq!(a.pages_fetched, 2);
        assert_eq!(a.avg_response_time, 3.0);
        assert_eq!(a.results, 7);
    }

    #[test]
    fn test_run_totals() {
        let mut run = RunStats::new();
        let mut a = InstanceStats::new("a");
        a.record_results(20);
        let mut b = InstanceStats::new("b");
        b.record_results(3);

        run.absorb("a_http://a", &a);
        run.absorb("b_http://b", &b);
        run.record_query(true);

        assert_eq!(run.total_results, 23);
        assert_eq!(run.total_queries, 1);
        assert_eq!(run.successful_queries, 1);
        assert_eq!(run.instance("b_http://b").map(|s| s.results), Some(3));

        let mut cumulative = RunStats::new();
        cumulative.merge(&run);
        cumulative.merge(&run);
        assert_eq!(cumulative.total_queries, 2);
        assert_eq!(cumulative.total_results, 46);
        assert_eq!(cumulative.instance_stats.len(), 2);

        let before = cumulative.last_reset;
        cumulative.reset();
        assert_eq!(cumulative.total_queries, 0);
        assert!(cumulative.instance_stats.is_empty());
        assert!(cumulative.last_reset >= before);
    }

    #[test]
    fn test_failed_query() {
        let mut run = RunStats::new();
        run.record_query(false);
        assert_eq!(run.failed_queries, 1);
        assert_eq!(run.successful_queries, 0);
    }
}
