//! Outbound HTTP client creation and configuration.
//!
//! One shared client with connection pooling handles all forward calls.
//! Redirects are followed automatically, and the host-safety check is
//! re-applied to every redirect hop so a public target cannot bounce the
//! relay into a private address.

use std::time::Duration;

use anyhow::Context;
use reqwest::redirect;
use tracing::info;

use crate::config::Config;
use crate::policy::is_internal_host;

/// Maximum number of redirect hops followed per forward call.
const MAX_REDIRECTS: usize = 10;

/// Redirect policy: follow up to `MAX_REDIRECTS` hops, refusing any hop
/// that lands on an internal host.
pub fn redirect_policy() -> redirect::Policy {
    redirect::Policy::custom(|attempt| {
        if attempt.previous().len() > MAX_REDIRECTS {
            return attempt.error("too many redirects");
        }
        let internal = attempt
            .url()
            .host_str()
            .map_or(true, is_internal_host);
        if internal {
            attempt.error("redirect target is an internal host")
        } else {
            attempt.follow()
        }
    })
}

/// Client builder with the relay's redirect policy and pool settings applied.
///
/// Exposed separately from [`create_http_client`] so tests can layer DNS
/// overrides on top before building.
pub fn client_builder(config: &Config) -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .redirect(redirect_policy())
        .connect_timeout(Duration::from_secs(config.client.connect_timeout_secs))
        .pool_idle_timeout(Duration::from_secs(config.client.pool_idle_timeout_secs))
        .pool_max_idle_per_host(config.client.pool_max_idle_per_host)
}

/// Create the shared HTTP client used for forwarding.
pub fn create_http_client(config: &Config) -> Result<reqwest::Client, anyhow::Error> {
    let client = client_builder(config)
        .build()
        .context("Failed to build outbound HTTP client")?;

    info!(
        "Connection pool configured: max_idle={}, idle_timeout={}s, connect_timeout={}s",
        config.client.pool_max_idle_per_host,
        config.client.pool_idle_timeout_secs,
        config.client.connect_timeout_secs
    );

    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_client_from_defaults() {
        let client = create_http_client(&Config::default());
        assert!(client.is_ok());
    }
}
