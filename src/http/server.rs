//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router: discovery on `/`, every other path to the proxy handler
//! - Wire up middleware (request ID, tracing, body limit)
//! - Bind server to listener and shut down gracefully
//! - Dispatch requests through the route table to the forwarder
//! - Relay upstream responses, or degrade to per-request error responses
//!
//! # Design Decisions
//! - The handler deadline is enforced inside the proxy handler, so a request
//!   that runs out of time still gets the route's failure response with CORS
//!   headers

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    response::Response,
    routing::any,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::http::client::HyperTransport;
use crate::http::discovery::discovery_handler;
use crate::http::forward::{ForwardError, Forwarder, OutboundRequest, Transport};
use crate::http::request::{request_id, MakeRequestUuidV4};
use crate::http::response;
use crate::observability::metrics;
use crate::resilience::RetryPolicy;
use crate::routing::{Route, RouteTable, RouteTableError};

/// Error type for server construction.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid route table: {0}")]
    Routes(#[from] RouteTableError),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteTable>,
    pub forwarder: Forwarder,
    pub max_body_bytes: usize,
    pub cors_proxied: bool,
    /// Budget for producing response headers, retries included.
    pub handler_timeout: Duration,
}

/// HTTP server for the gateway.
pub struct GatewayServer {
    router: Router,
    config: GatewayConfig,
    routes: Arc<RouteTable>,
}

impl GatewayServer {
    /// Create a server with the standard routes and the shared upstream client.
    pub fn new(config: GatewayConfig) -> Result<Self, StartupError> {
        let routes = RouteTable::from_config(&config)?;
        let transport = Arc::new(HyperTransport::new(&config.timeouts));
        Ok(Self::with_transport(config, routes, transport))
    }

    /// Create a server over an explicit route table and transport.
    pub fn with_transport(
        config: GatewayConfig,
        routes: RouteTable,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let routes = Arc::new(routes);
        let forwarder = Forwarder::new(transport, RetryPolicy::from_config(&config.retries));

        let state = AppState {
            routes: routes.clone(),
            forwarder,
            max_body_bytes: config.limits.max_body_bytes,
            cors_proxied: config.cors.proxied_responses,
            handler_timeout: Duration::from_secs(config.timeouts.handler_secs),
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            routes,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .route("/", any(discovery_handler))
            .fallback(proxy_handler)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
                    .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                        tracing::info_span!(
                            "request",
                            method = %req.method(),
                            uri = %req.uri(),
                            request_id = %request_id(req),
                        )
                    }))
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(RequestBodyLimitLayer::new(config.limits.max_body_bytes)),
            )
    }

    /// Run the server until `shutdown` fires, accepting connections on `listener`.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.routes.len(),
            "HTTP server starting"
        );

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("server closed");
        Ok(())
    }

    /// The router, for driving the gateway without a listener.
    pub fn into_router(self) -> Router {
        self.router
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

/// Main proxy handler.
/// Looks up the route, then forwards within the handler deadline.
async fn proxy_handler(
    State(state): State<AppState>,
    ConnectInfo(caller): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(&request).to_string();

    let Some(route) = state.routes.lookup(request.uri().path()) else {
        tracing::debug!(
            request_id = %request_id,
            path = %request.uri().path(),
            "No route matched"
        );
        return response::not_found();
    };
    let app = route.name.as_str();
    let method = request.method().clone();

    let forwarding = forward(&state, route, caller, &request_id, start_time, request);
    match tokio::time::timeout(state.handler_timeout, forwarding).await {
        Ok(response) => response,
        Err(_) => {
            tracing::error!(
                app,
                host = %caller,
                request_id = %request_id,
                timeout = ?state.handler_timeout,
                error = "handler deadline exceeded",
                "client: error making http request"
            );
            metrics::record_failure(app, "deadline");
            response::upstream_failure(app, &method)
        }
    }
}

/// Rewrite, buffer the body, forward with retry and relay.
async fn forward(
    state: &AppState,
    route: &Route,
    caller: SocketAddr,
    request_id: &str,
    start_time: Instant,
    request: Request<Body>,
) -> Response {
    let app = route.name.as_str();
    let method = request.method().clone();

    let uri = match route.outbound_uri(request.uri()) {
        Ok(uri) => uri,
        Err(e) => {
            tracing::error!(app, host = %caller, error = %e, "client: could not create request");
            metrics::record_failure(app, "build");
            return response::construction_failure();
        }
    };

    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(app, host = %caller, error = %e, "client: could not read request body");
            metrics::record_failure(app, "body");
            return response::construction_failure();
        }
    };

    let outbound = OutboundRequest::new(parts.method, uri, &parts.headers, body);

    match state.forwarder.execute(app, &outbound).await {
        Ok(upstream) => {
            let status = upstream.status();
            tracing::info!(
                app,
                url = %outbound.uri,
                host = %caller,
                request_id = %request_id,
                status = status.as_u16(),
                "Proxy request"
            );
            metrics::record_request(app, &method, status.as_u16(), start_time);
            response::relay(upstream, state.cors_proxied)
        }
        Err(e) => {
            tracing::error!(
                app,
                host = %caller,
                request_id = %request_id,
                error = %e,
                "client: error making http request"
            );
            metrics::record_failure(app, e.kind());
            match e {
                ForwardError::Build(_) => response::construction_failure(),
                ForwardError::Exhausted { .. } => response::upstream_failure(app, &method),
            }
        }
    }
}
