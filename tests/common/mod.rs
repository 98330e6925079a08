//! Shared fixtures for the integration tests

#![allow(dead_code)]

use searx_harvester::Instance;
use wiremock::MockServer;

/// A SearXNG result page with `count` results whose URLs start with `prefix`
pub fn results_page(prefix: &str, count: usize) -> String {
    let articles: String = (1..=count)
        .map(|i| {
            format!(
                r#"<article class="result result-default category-general">
                  <h3><a href="{prefix}/{i}">Result {i}</a></h3>
                  <p class="content">Snippet {i}</p>
                  <div class="engines"><span>duckduckgo</span></div>
                </article>"#
            )
        })
        .collect();
    format!(
        r#"<!DOCTYPE html><html><body><div id="results"><div id="urls">{articles}</div></div></body></html>"#
    )
}

/// A rendered page without any result container
pub fn empty_page() -> String {
    results_page("", 0)
}

/// An instance pointing at a mock server, without rate limiting
pub fn instance(name: &str, server: &MockServer) -> Instance {
    Instance::new(name, server.uri()).with_rate_limit_delay(0.0)
}
