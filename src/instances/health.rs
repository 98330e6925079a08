//! Instance health probe

use super::Instance;
use crate::network::{navigation_headers, PageRequest, Session, TransportError};
use crate::query::SearchQuery;
use futures::future::join_all;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Markers of a rendered result page
const RESULT_MARKERS: &[&str] = &[r#"id="results""#, r#"class="result""#];

/// Outcome of probing one instance
#[derive(Debug, Clone, Serialize)]
pub struct InstanceHealth {
    pub name: String,
    pub url: String,
    pub healthy: bool,
    pub error: Option<String>,
    pub response_time: Duration,
}

/// Run a one-page test search against an instance.
///
/// Healthy means HTTP 200 with a recognisable result page. The probe
/// ignores the active flag so a disabled instance can be checked before
/// re-enabling it.
pub async fn probe(session: &Session, instance: &Instance) -> InstanceHealth {
    let started = Instant::now();
    let outcome = probe_inner(session, instance).await;
    let response_time = started.elapsed();

    let error = outcome.err();
    match &error {
        Some(e) => debug!(instance = %instance.name, "Probe failed: {}", e),
        None => debug!(instance = %instance.name, "Probe ok in {:?}", response_time),
    }

    InstanceHealth {
        name: instance.name.clone(),
        url: instance.url.clone(),
        healthy: error.is_none(),
        error,
        response_time,
    }
}

async fn probe_inner(session: &Session, instance: &Instance) -> Result<(), String> {
    let url = instance
        .search_url()
        .map_err(|e| format!("invalid URL: {}", e))?;
    let query = SearchQuery::new("test");

    let request = PageRequest::get(url.as_str())
        .params(query.to_params())
        .headers(&navigation_headers(&query.language))
        .headers(&instance.custom_headers)
        .timeout(instance.request_timeout());

    let response = session.execute(request).await.map_err(|e| match e {
        TransportError::Timeout => "Timeout".to_string(),
        other => other.to_string(),
    })?;

    if !response.is_ok() {
        return Err(format!("HTTP {}", response.status));
    }

    if RESULT_MARKERS.iter().any(|m| response.text.contains(m)) {
        Ok(())
    } else {
        Err("No search results container found".to_string())
    }
}

/// Probe several instances concurrently, in input order
pub async fn probe_all(session: &Session, instances: &[Instance]) -> Vec<InstanceHealth> {
    let reports = join_all(instances.iter().map(|i| probe(session, i))).await;
    let healthy = reports.iter().filter(|r| r.healthy).count();
    info!("{}/{} instances healthy", healthy, reports.len());
    reports
}
