//! corsx: a stateless CORS relay.
//!
//! Accepts an inbound request carrying a target URL in the `url` query
//! parameter, validates the target against an allow/deny policy, forwards a
//! filtered version of the request, and relays the response back with
//! permissive cross-origin headers attached.

pub mod config;
pub mod error;
pub mod policy;
pub mod proxy;

pub use config::Config;
pub use error::ProxyError;
pub use proxy::RelayServer;
