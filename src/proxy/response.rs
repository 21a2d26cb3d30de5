//! Response construction helpers for the relay surface.

use std::convert::Infallible;

use super::headers::RelayHeadersExt;
use bytes::Bytes;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Full};
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Response, StatusCode};

/// Body type produced by the relay: either a buffered body (static routes,
/// errors) or the upstream byte stream (successful proxy responses).
pub type ResponseBody = UnsyncBoxBody<Bytes, std::io::Error>;

/// Wrap a fully buffered body.
pub fn full_body(body: impl Into<Bytes>) -> ResponseBody {
    Full::new(body.into())
        .map_err(|never: Infallible| match never {})
        .boxed_unsync()
}

/// Build an HTTP response with the given status and body.
///
/// Handles the unlikely case where `Response::builder()` fails by returning
/// a minimal 500 response.
pub fn build_response(status: StatusCode, body: ResponseBody) -> Response<ResponseBody> {
    Response::builder()
        .status(status)
        .body(body)
        .unwrap_or_else(|_| Response::new(full_body("Internal Server Error")))
}

/// Create a JSON error response with the CORS set attached.
///
/// Body shape is `{"error": "<message>"}` for every failure path.
pub fn json_error(status: StatusCode, message: &str) -> Response<ResponseBody> {
    let body = serde_json::json!({ "error": message }).to_string();
    let mut response = build_response(status, full_body(body));
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response.apply_cors();
    response
}

/// Create a not found response
pub fn not_found() -> Response<ResponseBody> {
    json_error(StatusCode::NOT_FOUND, "Not found")
}

/// CORS preflight echo: 204 with the CORS set and an empty body.
pub fn preflight() -> Response<ResponseBody> {
    let mut response = build_response(StatusCode::NO_CONTENT, full_body(Bytes::new()));
    response.apply_cors();
    response
}

/// Health probe response.
pub fn health() -> Response<ResponseBody> {
    build_response(StatusCode::OK, full_body("OK"))
}

/// Static landing page served at the root path.
pub fn landing() -> Response<ResponseBody> {
    let mut response = build_response(
        StatusCode::OK,
        full_body(include_str!("../../static/landing.html")),
    );
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("text/html"));
    response
}
