//! Shared HTTP session used by every pager

use super::headers::{accept_html, accept_language};
use super::request::{HttpMethod, PageRequest, PageResponse};
use crate::config::OutgoingSettings;
use anyhow::Result;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, warn};
use url::Url;

/// Transport-level failure of a single request
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("session closed")]
    SessionClosed,
}

impl TransportError {
    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_builder() {
            Self::InvalidRequest(err.to_string())
        } else {
            Self::Connection(err.to_string())
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}

/// Bounds in-flight requests in total and per destination.
///
/// Permits are held for the whole exchange, body included, and released on
/// drop, so an abandoned request frees its slot.
struct ConnectionLimiter {
    total: Arc<Semaphore>,
    per_host: usize,
    hosts: Mutex<HashMap<String, Arc<Semaphore>>>,
}

struct Permits {
    _host: OwnedSemaphorePermit,
    _total: OwnedSemaphorePermit,
}

impl ConnectionLimiter {
    fn new(total: usize, per_host: usize) -> Self {
        Self {
            total: Arc::new(Semaphore::new(total.max(1))),
            per_host: per_host.max(1),
            hosts: Mutex::new(HashMap::new()),
        }
    }

    async fn acquire(&self, destination: &str) -> Result<Permits, TransportError> {
        if self.total.is_closed() {
            return Err(TransportError::SessionClosed);
        }

        let host = {
            let mut hosts = self.hosts.lock().unwrap_or_else(|e| e.into_inner());
            hosts
                .entry(destination.to_string())
                .or_insert_with(|| Arc::new(Semaphore::new(self.per_host)))
                .clone()
        };

        // Host slot first so a busy host never parks a global slot.
        let host = host
            .acquire_owned()
            .await
            .map_err(|_| TransportError::SessionClosed)?;
        let total = self
            .total
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| TransportError::SessionClosed)?;

        Ok(Permits {
            _host: host,
            _total: total,
        })
    }

    fn close(&self) {
        self.total.close();
        let hosts = self.hosts.lock().unwrap_or_else(|e| e.into_inner());
        for semaphore in hosts.values() {
            semaphore.close();
        }
    }
}

/// HTTP session shared by all pagers of a harvester.
///
/// Cloning is cheap; clones share the connection pool, the cookie jar and
/// the connection limits.
#[derive(Clone)]
pub struct Session {
    client: Client,
    default_timeout: Duration,
    limiter: Arc<ConnectionLimiter>,
}

impl Session {
    /// Create a session with default settings
    pub fn new() -> Result<Self> {
        Self::with_settings(&OutgoingSettings::default())
    }

    /// Create a session with custom settings
    pub fn with_settings(settings: &OutgoingSettings) -> Result<Self> {
        let default_timeout = Duration::from_secs_f64(if settings.request_timeout > 0.0 {
            settings.request_timeout.min(crate::MAX_TIMEOUT)
        } else {
            crate::DEFAULT_TIMEOUT
        });

        let mut builder = Client::builder()
            .timeout(default_timeout)
            .pool_max_idle_per_host(settings.max_connections_per_host)
            .default_headers(default_headers(&settings.extra_headers))
            .user_agent(settings.user_agent.as_str())
            .cookie_store(true)
            .gzip(true)
            .brotli(true);

        // SSL verification
        if !settings.verify_ssl {
            builder = builder.danger_accept_invalid_certs(true);
        }

        // Proxy settings
        if let Some(ref proxy_url) = settings.proxies.all {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        } else {
            if let Some(ref http) = settings.proxies.http {
                builder = builder.proxy(reqwest::Proxy::http(http)?);
            }
            if let Some(ref https) = settings.proxies.https {
                builder = builder.proxy(reqwest::Proxy::https(https)?);
            }
        }

        let client = builder.build()?;

        Ok(Self {
            client,
            default_timeout,
            limiter: Arc::new(ConnectionLimiter::new(
                settings.max_connections,
                settings.max_connections_per_host,
            )),
        })
    }

    /// Execute a request and read the whole body
    pub async fn execute(&self, request: PageRequest) -> Result<PageResponse, TransportError> {
        let destination = destination(&request.url)?;
        let _permits = self.limiter.acquire(&destination).await?;

        let mut req_builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };

        req_builder = req_builder.timeout(request.timeout.unwrap_or(self.default_timeout));

        for (key, value) in &request.headers {
            req_builder = req_builder.header(key.as_str(), value.as_str());
        }

        if !request.params.is_empty() {
            req_builder = req_builder.query(&request.params);
        }

        if let Some(ref fields) = request.form {
            req_builder = req_builder.form(fields);
        }

        let response = req_builder
            .send()
            .await
            .map_err(TransportError::from_reqwest)?;

        let status = response.status().as_u16();
        let url = response.url().to_string();
        let text = response.text().await.map_err(TransportError::from_reqwest)?;

        debug!("{:?} {} -> {} ({} bytes)", request.method, url, status, text.len());

        Ok(PageResponse { status, text, url })
    }

    /// GET with query parameters
    pub async fn get(
        &self,
        url: &str,
        params: &[(String, String)],
        headers: &HashMap<String, String>,
        timeout: Duration,
    ) -> Result<PageResponse, TransportError> {
        let request = PageRequest::get(url)
            .params(params.to_vec())
            .headers(headers)
            .timeout(timeout);
        self.execute(request).await
    }

    /// POST with a form-encoded body
    pub async fn post(
        &self,
        url: &str,
        form: &[(String, String)],
        headers: &HashMap<String, String>,
        timeout: Duration,
    ) -> Result<PageResponse, TransportError> {
        let request = PageRequest::post(url)
            .form(form.to_vec())
            .headers(headers)
            .timeout(timeout);
        self.execute(request).await
    }

    /// Refuse new requests. Requests already holding a slot finish normally.
    pub fn close(&self) {
        self.limiter.close();
    }

    pub fn is_closed(&self) -> bool {
        self.limiter.total.is_closed()
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }
}

fn destination(url: &str) -> Result<String, TransportError> {
    let parsed = Url::parse(url).map_err(|e| TransportError::InvalidRequest(format!("{}: {}", url, e)))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| TransportError::InvalidRequest(format!("{}: missing host", url)))?;
    Ok(match parsed.port_or_known_default() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

fn default_headers(extra: &HashMap<String, String>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        reqwest::header::ACCEPT,
        HeaderValue::from_static(accept_html()),
    );
    if let Ok(value) = HeaderValue::from_str(&accept_language("en")) {
        headers.insert(reqwest::header::ACCEPT_LANGUAGE, value);
    }

    for (key, value) in extra {
        match (
            HeaderName::from_bytes(key.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => warn!("Ignoring invalid extra header: {}", key),
        }
    }

    headers
}
