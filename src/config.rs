//! Configuration types for the corsx relay.

use std::path::Path;

use hyper::header::HeaderValue;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub listen: ListenConfig,
    #[serde(default)]
    pub relay: RelayConfig,
    #[serde(default)]
    pub client: ClientConfig,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.relay.name.is_empty() {
            anyhow::bail!("relay.name must not be empty");
        }
        if HeaderValue::from_str(&self.relay.name).is_err() {
            anyhow::bail!("relay.name is not a valid header value: {}", self.relay.name);
        }
        if HeaderValue::from_str(&self.relay.user_agent).is_err() {
            anyhow::bail!(
                "relay.user_agent is not a valid header value: {}",
                self.relay.user_agent
            );
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListenConfig {
    #[serde(default = "default_listen_port")]
    pub port: u16,
}

fn default_listen_port() -> u16 {
    8080
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            port: default_listen_port(),
        }
    }
}

/// Relay identity: the `X-Proxied-By` marker and the User-Agent injected
/// when the inbound request carried none.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RelayConfig {
    #[serde(default = "default_relay_name")]
    pub name: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_relay_name() -> String {
    "corsx".to_string()
}

fn default_user_agent() -> String {
    "corsx/1.0".to_string()
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            name: default_relay_name(),
            user_agent: default_user_agent(),
        }
    }
}

/// Outbound HTTP client settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_pool_idle_timeout")]
    pub pool_idle_timeout_secs: u64,

    #[serde(default = "default_pool_max_idle_per_host")]
    pub pool_max_idle_per_host: usize,
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_pool_idle_timeout() -> u64 {
    90
}

fn default_pool_max_idle_per_host() -> usize {
    32
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout(),
            pool_idle_timeout_secs: default_pool_idle_timeout(),
            pool_max_idle_per_host: default_pool_max_idle_per_host(),
        }
    }
}
