//! HTTP networking module
//!
//! Provides the shared session all pagers use to talk to SearXNG instances.

mod client;
mod headers;
mod request;

pub use client::{Session, TransportError};
pub use headers::{accept_html, accept_language, navigation_headers, xhr_headers, DEFAULT_USER_AGENT};
pub use request::{HttpMethod, PageRequest, PageResponse};
