//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the login, logout and catch-all handlers
//! - Wire up middleware (tracing, timeout, request ID)
//! - Bind server to listener
//! - Serve until the shutdown signal, then drain

use axum::{
    body::Body,
    http::{HeaderName, Request, StatusCode},
    routing::any,
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::cas::{CasClient, CasEndpoints, TicketValidator};
use crate::config::ProxyConfig;
use crate::http::{login, proxy};

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ProxyConfig>,
    pub cas: Arc<CasEndpoints>,
    pub validator: Arc<dyn TicketValidator>,
    pub client: Client<HttpConnector, Body>,
    /// Parsed `session.identity_header`.
    pub identity_header: Option<HeaderName>,
}

/// HTTP server for the CAS proxy.
pub struct HttpServer {
    router: Router,
    config: Arc<ProxyConfig>,
}

impl HttpServer {
    /// Create a new HTTP server validating tickets against the configured CAS.
    pub fn new(config: ProxyConfig) -> Result<Self, reqwest::Error> {
        let validator = Arc::new(CasClient::new(&config.cas)?);
        Ok(Self::with_validator(config, validator))
    }

    /// Create a server with a caller-supplied ticket validator.
    pub fn with_validator(config: ProxyConfig, validator: Arc<dyn TicketValidator>) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(config.timeouts.connect_secs)));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        let identity_header = config
            .session
            .identity_header
            .as_deref()
            .and_then(|name| HeaderName::from_bytes(name.as_bytes()).ok());

        let config = Arc::new(config);
        let state = AppState {
            cas: Arc::new(CasEndpoints::new(&config.cas.base_url)),
            config: config.clone(),
            validator,
            client,
            identity_header,
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// A request that outlives `timeouts.request_secs` gets `504`: the wait is
    /// on the upstream or CAS, not on the client.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        let x_request_id = HeaderName::from_static(X_REQUEST_ID);

        Router::new()
            .route("/login", any(login::login_handler))
            .route("/logout", any(login::logout_handler))
            .fallback(proxy::gate_handler)
            .with_state(state)
            .layer(TimeoutLayer::with_status_code(
                StatusCode::GATEWAY_TIMEOUT,
                Duration::from_secs(config.timeouts.request_secs),
            ))
            .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get(X_REQUEST_ID)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "request",
                    request_id = %request_id,
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            }))
            .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid))
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.authority(),
            cas_url = %self.config.cas.base_url,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// The fully layered router, for driving the server without a socket.
    pub fn into_router(self) -> Router {
        self.router
    }
}
