//! Request-level failures and their HTTP mapping.
//!
//! Every failure in the proxy pipeline ends up here and is turned into a
//! response at the handler boundary; nothing propagates past a single request.

use axum::{
    body::Body,
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::http::cors;

/// What went wrong talking to the upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamErrorKind {
    /// DNS, TCP or TLS failure before any request was sent.
    Connect,
    /// Connect or response-header deadline exceeded.
    Timeout,
    /// Any other transport or protocol failure.
    Other,
}

impl UpstreamErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Timeout => "timeout",
            Self::Other => "other",
        }
    }
}

/// Errors that end a proxied request.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("API key for {provider} is not configured")]
    MissingApiKey { provider: String },

    #[error("API key for {provider} is not a valid header value")]
    InvalidCredential { provider: String },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not Found")]
    RouteNotFound { path: String },

    #[error("Method {0} is not allowed")]
    MethodNotAllowed(Method),

    #[error("Upstream URL for {provider} is invalid: {detail}")]
    InvalidUpstreamUrl { provider: String, detail: String },

    #[error("Upstream request to {provider} failed: {detail}")]
    Upstream {
        provider: String,
        kind: UpstreamErrorKind,
        detail: String,
    },
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingApiKey { .. }
            | Self::InvalidCredential { .. }
            | Self::InvalidUpstreamUrl { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::Upstream { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (content_type, body) = match &self {
            Self::Upstream {
                provider, detail, ..
            } => (
                "application/json",
                json!({
                    "error": "proxy request failed",
                    "provider": provider,
                    "detail": detail,
                })
                .to_string(),
            ),
            other => ("text/plain; charset=utf-8", other.to_string()),
        };

        let mut response = Response::new(Body::from(body));
        *response.status_mut() = status;
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        if let Self::MethodNotAllowed(_) = self {
            response
                .headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static(cors::ALLOW_METHODS));
        }
        cors::apply(response.headers_mut());
        response
    }
}
