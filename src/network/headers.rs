//! Browser-like request headers
//!
//! SearXNG instances behind bot detection reject requests that do not look
//! like a real browser. The first page is requested as a top-level
//! navigation; later pages as the same-origin XHR the "load more" button
//! would send. The two header sets must not be mixed.

use std::collections::HashMap;

/// User agent sent by default (mobile Chrome)
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 6.0; Nexus 5 Build/MRA58N) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/139.0.0.0 Mobile Safari/537.36";

const SEC_CH_UA: &str = r#""Not;A=Brand";v="99", "Google Chrome";v="139", "Chromium";v="139""#;

/// Standard accept headers for HTML requests
pub fn accept_html() -> &'static str {
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7"
}

/// Standard accept-language header
pub fn accept_language(lang: &str) -> String {
    if lang == "all" || lang == "auto" || lang.is_empty() {
        "en-US,en;q=0.9".to_string()
    } else {
        format!("{},en-US;q=0.9,en;q=0.8", lang)
    }
}

fn client_hints(headers: &mut HashMap<String, String>) {
    headers.insert("sec-ch-ua".to_string(), SEC_CH_UA.to_string());
    headers.insert("sec-ch-ua-mobile".to_string(), "?1".to_string());
    headers.insert("sec-ch-ua-platform".to_string(), "\"Android\"".to_string());
}

/// Headers of a top-level navigation (first result page)
pub fn navigation_headers(lang: &str) -> HashMap<String, String> {
    let mut headers = HashMap::new();
    headers.insert("accept".to_string(), accept_html().to_string());
    headers.insert("accept-language".to_string(), accept_language(lang));
    headers.insert("cache-control".to_string(), "max-age=0".to_string());
    headers.insert("priority".to_string(), "u=0, i".to_string());
    headers.insert("sec-fetch-dest".to_string(), "document".to_string());
    headers.insert("sec-fetch-mode".to_string(), "navigate".to_string());
    headers.insert("sec-fetch-site".to_string(), "same-origin".to_string());
    headers.insert("sec-fetch-user".to_string(), "?1".to_string());
    headers.insert("upgrade-insecure-requests".to_string(), "1".to_string());
    client_hints(&mut headers);
    headers
}

/// Headers of an in-page "load more" request (every page after the first)
pub fn xhr_headers(origin: &str, lang: &str) -> HashMap<String, String> {
    let mut headers = HashMap::new();
    headers.insert("accept".to_string(), "*/*".to_string());
    headers.insert("accept-language".to_string(), accept_language(lang));
    headers.insert("origin".to_string(), origin.to_string());
    headers.insert("sec-fetch-dest".to_string(), "empty".to_string());
    headers.insert("sec-fetch-mode".to_string(), "cors".to_string());
    headers.insert("sec-fetch-site".to_string(), "same-origin".to_string());
    client_hints(&mut headers);
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_classes_differ() {
        let nav = navigation_headers("en");
        let xhr = xhr_headers("https://a.example", "en");

        assert_eq!(nav["sec-fetch-mode"], "navigate");
        assert_eq!(xhr["sec-fetch-mode"], "cors");
        assert_eq!(xhr["origin"], "https://a.example");
        assert_eq!(xhr["accept"], "*/*");
        assert!(!nav.contains_key("origin"));
        assert!(!xhr.contains_key("upgrade-insecure-requests"));
    }

    #[test]
    fn test_accept_language() {
        assert_eq!(accept_language("de"), "de,en-US;q=0.9,en;q=0.8");
        assert_eq!(accept_language("all"), "en-US,en;q=0.9");
    }

    #[test]
    fn test_default_user_agent() {
        assert!(DEFAULT_USER_AGENT.starts_with("Mozilla/5.0"));
        assert!(DEFAULT_USER_AGENT.len() > 50);
    }
}
