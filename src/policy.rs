//! Target validation and header-filtering policy.
//!
//! The two policy tables (allowed outbound header names and private-host
//! patterns) are process-wide immutable statics, safe for unsynchronized
//! concurrent reads.

use hyper::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use once_cell::sync::Lazy;
use regex::RegexSet;
use reqwest::Url;

use crate::error::ProxyError;

/// Inbound header names copied onto the outbound request. Everything else,
/// including cookies, authorization, and custom headers, is dropped.
pub static ALLOWED_HEADERS: [HeaderName; 4] = [
    HeaderName::from_static("accept"),
    HeaderName::from_static("accept-language"),
    HeaderName::from_static("content-type"),
    HeaderName::from_static("user-agent"),
];

/// User-Agent injected when the inbound request carried none.
pub static DEFAULT_USER_AGENT: HeaderValue = HeaderValue::from_static("corsx/1.0");

/// RFC1918 private ranges, link-local, and the unspecified address.
static PRIVATE_HOST_PATTERNS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"^10\.\d{1,3}\.\d{1,3}\.\d{1,3}$",
        r"^192\.168\.\d{1,3}\.\d{1,3}$",
        r"^172\.(1[6-9]|2\d|3[0-1])\.\d{1,3}\.\d{1,3}$",
        r"^169\.254\.\d{1,3}\.\d{1,3}$",
        r"^0\.0\.0\.0$",
    ])
    .expect("private host patterns are valid regexes")
});

/// Check whether a hostname refers to an internal/private address.
///
/// Matches the literal hostname string only; DNS names are not resolved, so
/// a public name pointing at a private address is not caught here. The
/// redirect policy in `proxy::client` re-applies this check per hop.
pub fn is_internal_host(hostname: &str) -> bool {
    let lower = hostname.to_ascii_lowercase();
    // Url keeps brackets around IPv6 literals
    let lower = lower.trim_start_matches('[').trim_end_matches(']');

    if lower == "localhost" || lower == "127.0.0.1" || lower == "::1" {
        return true;
    }

    PRIVATE_HOST_PATTERNS.is_match(lower)
}

/// Validate a raw target string into a URL safe to forward to.
///
/// Applies the presence, syntax, scheme, and host-safety checks in order.
/// No outbound request is ever built from a string that fails here.
pub fn validate_target(raw: Option<&str>) -> Result<Url, ProxyError> {
    let raw = match raw {
        Some(s) if !s.is_empty() => s,
        _ => return Err(ProxyError::MissingUrl),
    };

    let target = Url::parse(raw).map_err(|_| ProxyError::InvalidUrl)?;

    if target.scheme() != "http" && target.scheme() != "https" {
        return Err(ProxyError::UnsupportedScheme);
    }

    let host = target.host_str().ok_or(ProxyError::InvalidUrl)?;
    if is_internal_host(host) {
        return Err(ProxyError::InternalHost);
    }

    Ok(target)
}

/// Build the outbound header set from the inbound headers.
///
/// Copies only the allowed names (case-insensitive) and guarantees a
/// User-Agent is present, injecting `default_user_agent` (or the built-in
/// default if that value is not a valid header value) when the inbound
/// request carried none.
pub fn filter_headers(inbound: &HeaderMap, default_user_agent: &str) -> HeaderMap {
    let mut filtered = HeaderMap::new();

    for name in &ALLOWED_HEADERS {
        for value in inbound.get_all(name) {
            filtered.append(name.clone(), value.clone());
        }
    }

    if !filtered.contains_key(USER_AGENT) {
        let value = HeaderValue::from_str(default_user_agent)
            .unwrap_or_else(|_| DEFAULT_USER_AGENT.clone());
        filtered.insert(USER_AGENT, value);
    }

    filtered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_hosts_rejected() {
        for host in [
            "localhost",
            "LOCALHOST",
            "127.0.0.1",
            "::1",
            "[::1]",
            "10.1.2.3",
            "192.168.0.5",
            "172.20.0.1",
            "169.254.1.1",
            "0.0.0.0",
        ] {
            assert!(is_internal_host(host), "expected {host} to be internal");
        }
    }

    #[test]
    fn test_public_hosts_allowed() {
        for host in ["8.8.8.8", "example.com", "172.15.0.1", "172.32.0.1", "11.0.0.1"] {
            assert!(!is_internal_host(host), "expected {host} to be allowed");
        }
    }

    #[test]
    fn test_validate_target_missing() {
        assert!(matches!(
            validate_target(None),
            Err(ProxyError::MissingUrl)
        ));
        assert!(matches!(
            validate_target(Some("")),
            Err(ProxyError::MissingUrl)
        ));
    }

    #[test]
    fn test_validate_target_invalid() {
        assert!(matches!(
            validate_target(Some("not a url")),
            Err(ProxyError::InvalidUrl)
        ));
        // Relative URLs are not absolute URLs
        assert!(matches!(
            validate_target(Some("/relative/path")),
            Err(ProxyError::InvalidUrl)
        ));
    }

    #[test]
    fn test_validate_target_scheme() {
        assert!(matches!(
            validate_target(Some("ftp://example.com/file")),
            Err(ProxyError::UnsupportedScheme)
        ));
        assert!(matches!(
            validate_target(Some("file:///etc/passwd")),
            Err(ProxyError::UnsupportedScheme)
        ));
    }

    #[test]
    fn test_validate_target_internal_host() {
        assert!(matches!(
            validate_target(Some("http://localhost:8080/admin")),
            Err(ProxyError::InternalHost)
        ));
        assert!(matches!(
            validate_target(Some("https://192.168.1.1/")),
            Err(ProxyError::InternalHost)
        ));
        assert!(matches!(
            validate_target(Some("http://[::1]/")),
            Err(ProxyError::InternalHost)
        ));
    }

    #[test]
    fn test_validate_target_accepts_public() {
        let target = validate_target(Some("https://example.com/api?q=1")).unwrap();
        assert_eq!(target.scheme(), "https");
        assert_eq!(target.host_str(), Some("example.com"));
    }

    #[test]
    fn test_filter_headers_subset() {
        let mut inbound = HeaderMap::new();
        inbound.insert("accept", "application/json".parse().unwrap());
        inbound.insert("cookie", "session=secret".parse().unwrap());
        inbound.insert("authorization", "Bearer token".parse().unwrap());
        inbound.insert("x-custom", "value".parse().unwrap());

        let filtered = filter_headers(&inbound, "corsx/1.0");

        assert_eq!(filtered.get("accept").unwrap(), "application/json");
        assert!(filtered.get("cookie").is_none());
        assert!(filtered.get("authorization").is_none());
        assert!(filtered.get("x-custom").is_none());
        // Outbound set is always a subset of the allow list plus user-agent
        for name in filtered.keys() {
            assert!(ALLOWED_HEADERS.contains(name));
        }
    }

    #[test]
    fn test_filter_headers_injects_user_agent() {
        let filtered = filter_headers(&HeaderMap::new(), "corsx/1.0");
        assert_eq!(filtered.get(USER_AGENT).unwrap(), "corsx/1.0");
    }

    #[test]
    fn test_filter_headers_keeps_inbound_user_agent() {
        let mut inbound = HeaderMap::new();
        inbound.insert(USER_AGENT, "curl/8.0".parse().unwrap());
        let filtered = filter_headers(&inbound, "corsx/1.0");
        assert_eq!(filtered.get(USER_AGENT).unwrap(), "curl/8.0");
    }

    #[test]
    fn test_filter_headers_is_deterministic() {
        let mut inbound = HeaderMap::new();
        inbound.insert("accept", "text/plain".parse().unwrap());
        inbound.insert("accept-language", "en".parse().unwrap());
        inbound.insert("x-trace-id", "abc123".parse().unwrap());

        let first = filter_headers(&inbound, "corsx/1.0");
        let second = filter_headers(&inbound, "corsx/1.0");
        assert_eq!(first, second);
    }

    #[test]
    fn test_filter_headers_bad_default_falls_back() {
        let filtered = filter_headers(&HeaderMap::new(), "bad\nagent");
        assert_eq!(filtered.get(USER_AGENT).unwrap(), "corsx/1.0");
    }
}
