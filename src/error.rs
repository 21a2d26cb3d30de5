//! Pipeline error taxonomy.
//!
//! Every failure in the proxy pipeline maps to exactly one of these
//! variants, and every variant maps to an explicit status code. The
//! `Display` impl provides the message carried in the JSON error body, so
//! callers can distinguish machine-readable error kinds by status alone.

use hyper::StatusCode;
use thiserror::Error;

/// Errors produced by the proxy pipeline.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The `url` query parameter was absent or empty.
    #[error("Missing 'url' query parameter")]
    MissingUrl,

    /// The target string did not parse as an absolute URL.
    #[error("Invalid URL")]
    InvalidUrl,

    /// The target URL used a scheme other than http or https.
    #[error("Only HTTP and HTTPS URLs are supported")]
    UnsupportedScheme,

    /// The target hostname matched the private/loopback deny list.
    #[error("Internal hosts are not allowed")]
    InternalHost,

    /// The forward call failed (DNS, connect, TLS, protocol, body read).
    #[error("Failed to fetch URL: {0}")]
    Upstream(String),
}

impl ProxyError {
    /// Status code for the JSON error response.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::MissingUrl | ProxyError::InvalidUrl | ProxyError::UnsupportedScheme => {
                StatusCode::BAD_REQUEST
            }
            ProxyError::InternalHost => StatusCode::FORBIDDEN,
            ProxyError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_map_to_400() {
        assert_eq!(ProxyError::MissingUrl.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ProxyError::InvalidUrl.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ProxyError::UnsupportedScheme.status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_policy_rejection_maps_to_403() {
        assert_eq!(ProxyError::InternalHost.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_upstream_failure_maps_to_502() {
        let err = ProxyError::Upstream("connection refused".to_string());
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_upstream_message_embeds_cause() {
        let err = ProxyError::Upstream("dns error".to_string());
        assert_eq!(err.to_string(), "Failed to fetch URL: dns error");
    }

    #[test]
    fn test_messages_are_stable() {
        assert_eq!(
            ProxyError::MissingUrl.to_string(),
            "Missing 'url' query parameter"
        );
        assert_eq!(ProxyError::InvalidUrl.to_string(), "Invalid URL");
        assert_eq!(
            ProxyError::UnsupportedScheme.to_string(),
            "Only HTTP and HTTPS URLs are supported"
        );
        assert_eq!(
            ProxyError::InternalHost.to_string(),
            "Internal hosts are not allowed"
        );
    }
}
