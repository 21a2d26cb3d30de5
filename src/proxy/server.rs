//! RelayServer struct and main run loop.
//!
//! Accepts connections, serves each over HTTP/1.1 on its own task, and
//! dispatches the handful of static routes plus the proxy endpoint.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use super::client::create_http_client;
use super::pipeline::handle_proxy;
use super::response::{health, json_error, landing, not_found, preflight, ResponseBody};
use crate::config::Config;

/// Extension point for a future rate-limiting store keyed on caller
/// identity, consulted before the pipeline forwards. The relay ships with
/// the no-op implementation only.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Whether the caller may proceed with a forward call.
    async fn allow(&self, caller: &str) -> bool;
}

/// Default limiter: every caller is allowed.
pub struct NoLimit;

#[async_trait]
impl RateLimiter for NoLimit {
    async fn allow(&self, _caller: &str) -> bool {
        true
    }
}

/// The relay server: listener, shared outbound client, and policy config.
pub struct RelayServer {
    config: Arc<Config>,
    http_client: reqwest::Client,
    rate_limiter: Arc<dyn RateLimiter>,
}

impl RelayServer {
    /// Create a new RelayServer from configuration.
    pub fn new(config: Config) -> Result<Self, anyhow::Error> {
        config.validate()?;
        let http_client = create_http_client(&config)?;
        Ok(Self::with_http_client(config, http_client))
    }

    /// Create a RelayServer with a caller-supplied outbound client.
    ///
    /// Used by tests to inject DNS overrides; the client should carry the
    /// redirect policy from [`super::client::client_builder`].
    pub fn with_http_client(config: Config, http_client: reqwest::Client) -> Self {
        Self {
            config: Arc::new(config),
            http_client,
            rate_limiter: Arc::new(NoLimit),
        }
    }

    /// Replace the rate limiter consulted before each forward call.
    pub fn with_rate_limiter(mut self, rate_limiter: Arc<dyn RateLimiter>) -> Self {
        self.rate_limiter = rate_limiter;
        self
    }

    /// Bind the configured port and serve until the process exits.
    pub async fn run(self) -> Result<(), anyhow::Error> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.listen.port));
        let listener = TcpListener::bind(addr).await?;
        info!("Relay listening on http://{}", listener.local_addr()?);
        self.serve(listener).await
    }

    /// Serve connections from an already-bound listener.
    pub async fn serve(self, listener: TcpListener) -> Result<(), anyhow::Error> {
        let server = Arc::new(self);

        loop {
            let (stream, remote_addr) = listener.accept().await?;
            let server = Arc::clone(&server);

            tokio::spawn(async move {
                let io = TokioIo::new(stream);
                let service = service_fn(move |req| {
                    let server = Arc::clone(&server);
                    async move {
                        Ok::<_, Infallible>(server.dispatch(remote_addr, req).await)
                    }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    debug!("Error serving connection from {}: {}", remote_addr, err);
                }
            });
        }
    }

    /// Route a single request.
    async fn dispatch(
        &self,
        remote_addr: SocketAddr,
        req: Request<Incoming>,
    ) -> Response<ResponseBody> {
        debug!("Received request: {} {}", req.method(), req.uri());

        // CORS preflight, any path
        if req.method() == Method::OPTIONS {
            return preflight();
        }

        let path = req.uri().path().to_string();
        match path.as_str() {
            "/health" => health(),
            "/proxy" => {
                let caller = remote_addr.ip().to_string();
                if !self.rate_limiter.allow(&caller).await {
                    error!("Rate limit exceeded for {}", caller);
                    return json_error(StatusCode::TOO_MANY_REQUESTS, "Too many requests");
                }
                handle_proxy(&self.http_client, &self.config.relay, req).await
            }
            "/" => landing(),
            _ => not_found(),
        }
    }
}
