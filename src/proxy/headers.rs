//! Safe header insertion helpers.
//!
//! Compile-time safe header names and values for the relay's custom headers
//! and the fixed CORS set, eliminating runtime `.parse().unwrap()` calls.

use hyper::header::{HeaderName, HeaderValue};
use hyper::http::response::Parts;
use hyper::Response;

// Static header names for corsx custom headers
pub static X_PROXIED_BY: HeaderName = HeaderName::from_static("x-proxied-by");
pub static X_ORIGINAL_URL: HeaderName = HeaderName::from_static("x-original-url");

/// Fixed CORS header set applied to every response from the relay surface.
pub static CORS_HEADERS: [(HeaderName, HeaderValue); 4] = [
    (
        HeaderName::from_static("access-control-allow-origin"),
        HeaderValue::from_static("*"),
    ),
    (
        HeaderName::from_static("access-control-allow-methods"),
        HeaderValue::from_static("GET, POST, OPTIONS"),
    ),
    (
        HeaderName::from_static("access-control-allow-headers"),
        HeaderValue::from_static("Content-Type, Accept, Authorization"),
    ),
    (
        HeaderName::from_static("access-control-max-age"),
        HeaderValue::from_static("86400"),
    ),
];

/// Extension trait for inserting relay headers into responses.
pub trait RelayHeadersExt {
    /// Insert a header with a static name and value.
    /// Accepts references; cloning is handled internally (cheap for `from_static` headers).
    fn set_header(&mut self, name: &HeaderName, value: &HeaderValue);

    /// Insert a header with a static name and dynamic string value.
    /// Returns false if the value couldn't be converted to a valid header value.
    fn set_header_value(&mut self, name: &HeaderName, value: &str) -> bool;

    /// Overlay the fixed CORS header set, replacing any upstream values.
    fn apply_cors(&mut self) {
        for (name, value) in &CORS_HEADERS {
            self.set_header(name, value);
        }
    }
}

impl<B> RelayHeadersExt for Response<B> {
    fn set_header(&mut self, name: &HeaderName, value: &HeaderValue) {
        self.headers_mut().insert(name.clone(), value.clone());
    }

    fn set_header_value(&mut self, name: &HeaderName, value: &str) -> bool {
        match HeaderValue::from_str(value) {
            Ok(header_value) => {
                self.headers_mut().insert(name.clone(), header_value);
                true
            }
            Err(_) => false,
        }
    }
}

impl RelayHeadersExt for Parts {
    fn set_header(&mut self, name: &HeaderName, value: &HeaderValue) {
        self.headers.insert(name.clone(), value.clone());
    }

    fn set_header_value(&mut self, name: &HeaderName, value: &str) -> bool {
        match HeaderValue::from_str(value) {
            Ok(header_value) => {
                self.headers.insert(name.clone(), header_value);
                true
            }
            Err(_) => false,
        }
    }
}
