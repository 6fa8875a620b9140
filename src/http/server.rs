//! HTTP server setup and the proxy pipeline.
//!
//! # Responsibilities
//! - Create Axum Router with the single proxy handler
//! - Wire up middleware (request ID, tracing)
//! - Run each request through the pipeline:
//!   preflight → landing → method → auth → route → rewrite → sanitize →
//!   forward → assemble
//! - Turn every failure into a response at this boundary
//! - Serve until the shutdown signal fires

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use reqwest::Url;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::http::context::ProxyRequestContext;
use crate::http::forward::{forwards_body, StreamingForwarder};
use crate::http::landing::{is_landing_request, landing_response};
use crate::http::preflight::preflight_response;
use crate::http::request::{make_span, propagate_request_id_layer, set_request_id_layer};
use crate::http::response::assemble;
use crate::observability::metrics;
use crate::routing::{PathRewriter, RouteTable, RouteTableError, Router as ProxyRouter};
use crate::security::{AuthDecision, AuthGate, HeaderSanitizer};

/// Methods the proxy accepts. `OPTIONS` never reaches the pipeline.
const SUPPORTED_METHODS: &[Method] = &[
    Method::GET,
    Method::HEAD,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::PATCH,
];

/// Error type for server construction.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("route table: {0}")]
    Routes(#[from] RouteTableError),

    #[error("upstream client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Application state injected into handlers. Read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub router: ProxyRouter,
    pub rewriter: PathRewriter,
    pub sanitizer: Arc<HeaderSanitizer>,
    pub auth: AuthGate,
    pub forwarder: StreamingForwarder,
}

impl AppState {
    /// Compile the runtime pieces from a config whose secrets are resolved.
    pub fn from_config(config: &ProxyConfig) -> Result<Self, ServerError> {
        let table = RouteTable::from_config(&config.providers)?;
        Ok(Self {
            router: ProxyRouter::new(Arc::new(table)),
            rewriter: PathRewriter,
            sanitizer: Arc::new(HeaderSanitizer::from_config(&config.headers)),
            auth: AuthGate::from_config(&config.auth),
            forwarder: StreamingForwarder::new(&config.timeouts, &config.upstream)?,
        })
    }

    /// Auth → route → rewrite → sanitize → forward → assemble.
    async fn proxy<'a>(&'a self, ctx: &mut ProxyRequestContext<'a>) -> Result<Response, ProxyError> {
        if !SUPPORTED_METHODS.contains(&ctx.method) {
            return Err(ProxyError::MethodNotAllowed(ctx.method.clone()));
        }

        if self.auth.check(&ctx.headers) == AuthDecision::Unauthorized {
            return Err(ProxyError::Unauthorized);
        }

        let entry = self
            .router
            .resolve(&ctx.path)
            .ok_or_else(|| ProxyError::RouteNotFound {
                path: ctx.path.clone(),
            })?;
        ctx.route = Some(entry);

        let target = self.rewriter.rewrite(&ctx.path, ctx.query.as_deref(), entry);
        let url = Url::parse(&target).map_err(|e| ProxyError::InvalidUpstreamUrl {
            provider: entry.name().to_string(),
            detail: e.to_string(),
        })?;

        let headers = self.sanitizer.sanitize(&ctx.headers, entry)?;
        let body = if forwards_body(&ctx.method) {
            ctx.take_body()
        } else {
            None
        };

        tracing::debug!(
            provider = %entry.name(),
            method = %ctx.method,
            upstream_path = %url.path(),
            "Forwarding request"
        );

        let upstream = self
            .forwarder
            .forward(ctx.method.clone(), url, headers, body)
            .await
            .map_err(|e| {
                metrics::record_upstream_error(entry.name(), e.kind.as_str());
                ProxyError::Upstream {
                    provider: entry.name().to_string(),
                    kind: e.kind,
                    detail: e.detail,
                }
            })?;

        Ok(assemble(upstream))
    }
}

/// HTTP server for the inference proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server. Credentials must already be resolved
    /// (see [`ProxyConfig::resolve_secrets`]).
    pub fn new(config: ProxyConfig) -> Result<Self, ServerError> {
        let state = AppState::from_config(&config)?;

        tracing::info!(
            routes = state.router.table().len(),
            auth_gate = state.auth.is_active(),
            "Proxy pipeline initialized"
        );

        let router = Self::build_router(state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id_layer())
                    .layer(TraceLayer::new_for_http().make_span_with(make_span))
                    .layer(propagate_request_id_layer()),
            )
    }

    /// The fully layered router, e.g. for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
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
}

/// Main proxy handler.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let method = request.method().clone();

    if method == Method::OPTIONS {
        return preflight_response();
    }
    if is_landing_request(&method, request.uri().path()) {
        return landing_response(&method);
    }

    let start = Instant::now();
    let mut ctx = ProxyRequestContext::new(request);

    match state.proxy(&mut ctx).await {
        Ok(response) => {
            let status = response.status();
            tracing::info!(
                provider = %ctx.provider(),
                method = %method,
                status = status.as_u16(),
                latency_ms = start.elapsed().as_millis() as u64,
                "Upstream responded"
            );
            metrics::record_request(method.as_str(), status.as_u16(), ctx.provider(), start);
            response
        }
        Err(err) => {
            let status = err.status();
            match &err {
                ProxyError::Upstream { kind, .. } => tracing::error!(
                    provider = %ctx.provider(),
                    prefix = %ctx.prefix(),
                    kind = kind.as_str(),
                    error = %err,
                    "Upstream request failed"
                ),
                ProxyError::MissingApiKey { .. } | ProxyError::InvalidCredential { .. } => {
                    tracing::error!(
                        provider = %ctx.provider(),
                        prefix = %ctx.prefix(),
                        error = %err,
                        "Provider misconfigured"
                    )
                }
                _ => tracing::warn!(
                    provider = %ctx.provider(),
                    prefix = %ctx.prefix(),
                    path = %ctx.path,
                    status = status.as_u16(),
                    error = %err,
                    "Request rejected"
                ),
            }
            metrics::record_request(method.as_str(), status.as_u16(), ctx.provider(), start);
            err.into_response()
        }
    }
}
