//! Request and response types used by the session

use std::collections::HashMap;
use std::time::Duration;

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// One outbound request
#[derive(Debug, Clone)]
pub struct PageRequest {
    /// URL to request
    pub url: String,
    /// HTTP method
    pub method: HttpMethod,
    /// Request headers, layered over the session defaults
    pub headers: HashMap<String, String>,
    /// Query parameters, in order
    pub params: Vec<(String, String)>,
    /// Form-encoded body
    pub form: Option<Vec<(String, String)>>,
    /// Overrides the session timeout
    pub timeout: Option<Duration>,
}

impl PageRequest {
    /// Create a GET request
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(url, HttpMethod::Get)
    }

    /// Create a POST request
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(url, HttpMethod::Post)
    }

    fn new(url: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            url: url.into(),
            method,
            headers: HashMap::new(),
            params: Vec::new(),
            form: None,
            timeout: None,
        }
    }

    /// Add a header. Names are case-insensitive; a later value replaces an
    /// earlier one whatever its case.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into().to_ascii_lowercase(), value.into());
        self
    }

    /// Add several headers; later entries win
    pub fn headers(mut self, headers: &HashMap<String, String>) -> Self {
        for (key, value) in headers {
            self.headers.insert(key.to_ascii_lowercase(), value.clone());
        }
        self
    }

    /// Set the query parameters
    pub fn params(mut self, params: Vec<(String, String)>) -> Self {
        self.params = params;
        self
    }

    /// Set a form-encoded body
    pub fn form(mut self, fields: Vec<(String, String)>) -> Self {
        self.form = Some(fields);
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// HTTP response, fully read
#[derive(Debug)]
pub struct PageResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub text: String,
    /// Response URL (after redirects)
    pub url: String,
}

impl PageResponse {
    /// Exactly 200; SearXNG renders results only on a plain OK
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}
