//! The proxy-request pipeline.
//!
//! Validates a target URL, builds a sanitized outbound request, executes it,
//! and maps the outcome to an inbound response. Every error path yields a
//! structured JSON error response; nothing escapes as a panic.

use std::borrow::Cow;

use super::headers::{RelayHeadersExt, X_ORIGINAL_URL, X_PROXIED_BY};
use super::response::{build_response, json_error, ResponseBody};
use futures::TryStreamExt;
use http_body_util::{BodyExt, StreamBody};
use hyper::body::{Frame, Incoming};
use hyper::header::HeaderName;
use hyper::{HeaderMap, Method, Request, Response};
use reqwest::Url;
use tracing::{debug, error};

use crate::config::RelayConfig;
use crate::error::ProxyError;
use crate::policy::{filter_headers, validate_target};

/// Hop-by-hop headers stripped from the relayed response. They describe the
/// upstream connection, not the one the relay re-frames toward the caller.
static HOP_BY_HOP_HEADERS: [HeaderName; 8] = [
    HeaderName::from_static("connection"),
    HeaderName::from_static("keep-alive"),
    HeaderName::from_static("proxy-authenticate"),
    HeaderName::from_static("proxy-authorization"),
    HeaderName::from_static("te"),
    HeaderName::from_static("trailer"),
    HeaderName::from_static("transfer-encoding"),
    HeaderName::from_static("upgrade"),
];

/// Handle a request to the proxy endpoint.
///
/// Accepts any inbound method. The target comes from the `url` query
/// parameter; validation failures and upstream failures are both converted
/// to JSON error responses here, at the pipeline boundary.
pub async fn handle_proxy(
    client: &reqwest::Client,
    relay: &RelayConfig,
    req: Request<Incoming>,
) -> Response<ResponseBody> {
    let raw_target = query_param(req.uri(), "url");

    let target = match validate_target(raw_target.as_deref()) {
        Ok(target) => target,
        Err(err) => {
            debug!("Rejected proxy target {:?}: {}", raw_target, err);
            return json_error(err.status(), &err.to_string());
        }
    };

    match forward(client, relay, req, &target).await {
        Ok(response) => response,
        Err(err) => {
            error!("Forward to {} failed: {}", target, err);
            json_error(err.status(), &err.to_string())
        }
    }
}

/// Extract a query parameter from the request URI, decoding percent escapes
/// and form-encoded spaces.
fn query_param(uri: &hyper::Uri, name: &str) -> Option<String> {
    let query = uri.query()?;
    for pair in query.split('&') {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        if key == name {
            let value = value.replace('+', " ");
            return Some(match urlencoding::decode(&value) {
                Ok(Cow::Borrowed(_)) => value,
                Ok(Cow::Owned(decoded)) => decoded,
                Err(_) => value,
            });
        }
    }
    None
}

/// Issue the outbound request and relay the upstream response.
async fn forward(
    client: &reqwest::Client,
    relay: &RelayConfig,
    req: Request<Incoming>,
    target: &Url,
) -> Result<Response<ResponseBody>, ProxyError> {
    let (parts, body) = req.into_parts();
    let outbound_headers = filter_headers(&parts.headers, &relay.user_agent);

    debug!("Forwarding {} {}", parts.method, target);

    let mut outbound = client
        .request(parts.method.clone(), target.clone())
        .headers(outbound_headers);

    // Body only travels with non-idempotent methods
    if parts.method != Method::GET && parts.method != Method::HEAD {
        let body_bytes = body
            .collect()
            .await
            .map_err(|e| ProxyError::Upstream(e.to_string()))?
            .to_bytes();
        outbound = outbound.body(body_bytes);
    }

    let upstream = outbound
        .send()
        .await
        .map_err(|e| ProxyError::Upstream(error_chain(&e)))?;

    Ok(relay_response(upstream, relay, target))
}

/// Assemble the inbound response from the upstream one: same status, the
/// upstream headers minus hop-by-hop ones, the CORS overlay, the relay
/// markers, and the upstream body streamed through unmodified.
fn relay_response(
    upstream: reqwest::Response,
    relay: &RelayConfig,
    target: &Url,
) -> Response<ResponseBody> {
    let status = upstream.status();
    let mut headers = HeaderMap::with_capacity(upstream.headers().len());
    for (name, value) in upstream.headers() {
        if !HOP_BY_HOP_HEADERS.contains(name) {
            headers.append(name.clone(), value.clone());
        }
    }

    let stream = upstream
        .bytes_stream()
        .map_ok(Frame::data)
        .map_err(std::io::Error::other);
    let body = StreamBody::new(stream).boxed_unsync();

    let mut response = build_response(status, body);
    *response.headers_mut() = headers;
    response.apply_cors();
    response.set_header_value(&X_PROXIED_BY, &relay.name);
    response.set_header_value(&X_ORIGINAL_URL, target.as_str());
    response
}

/// Flatten a reqwest error and its source chain into one message, so the
/// 502 body carries the underlying failure (DNS, connect, TLS) rather than
/// only the generic wrapper.
fn error_chain(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
