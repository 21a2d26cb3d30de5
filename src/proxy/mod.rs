//! Relay server module.
//!
//! # Module Structure
//!
//! - `server` - RelayServer struct, route dispatch, and main run loop
//! - `pipeline` - the proxy-request pipeline (validate, forward, relay)
//! - `client` - outbound HTTP client creation and redirect policy
//! - `headers` - static header names/values and insertion helpers
//! - `response` - response body type and JSON error/static-route helpers

pub mod client;
mod headers;
mod pipeline;
mod response;
mod server;

pub use headers::{RelayHeadersExt, CORS_HEADERS, X_ORIGINAL_URL, X_PROXIED_BY};
pub use response::ResponseBody;
pub use server::{NoLimit, RateLimiter, RelayServer};
