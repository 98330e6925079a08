//! Search suggestions
//!
//! Asks an instance's autocompleter for query completions.

use crate::instances::Instance;
use crate::network::{PageRequest, Session};
use anyhow::Result;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Suggestions are a convenience; never wait long for them
const SUGGESTION_TIMEOUT: Duration = Duration::from_secs(5);

/// Fetch autocomplete suggestions from an instance.
///
/// A non-200 answer yields an empty list. Transport failures and
/// malformed JSON are returned as errors.
pub async fn fetch_suggestions(
    session: &Session,
    instance: &Instance,
    query: &str,
) -> Result<Vec<String>> {
    let url = instance.endpoint("/autocompleter")?;
    let request = PageRequest::get(url.as_str())
        .params(vec![("q".to_string(), query.to_string())])
        .header("accept", "application/json")
        .timeout(SUGGESTION_TIMEOUT);

    let response = session.execute(request).await?;

    if !response.is_ok() {
        debug!(
            instance = %instance.name,
            "Autocompleter answered HTTP {}",
            response.status
        );
        return Ok(vec![]);
    }

    let json: Value = serde_json::from_str(&response.text)?;
    Ok(extract_suggestions(&json))
}

/// Accepts a plain list of strings or the OpenSearch
/// `[query, [suggestions...]]` shape
fn extract_suggestions(json: &Value) -> Vec<String> {
    let Some(items) = json.as_array() else {
        return vec![];
    };

    let list = match items.get(1).and_then(Value::as_array) {
        Some(nested) => nested,
        None => items,
    };

    list.iter()
        .filter_map(|v| v.as_str().map(String::from))
        .collect()
}
