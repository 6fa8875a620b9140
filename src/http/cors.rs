//! Permissive CORS header set applied to every response.

use axum::http::{header, HeaderMap, HeaderValue};

pub const ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, PATCH, OPTIONS";

pub const ALLOW_HEADERS: &str = "Authorization, Content-Type, X-Requested-With, X-Api-Key, \
     X-Goog-Api-Key, Anthropic-Version, Anthropic-Beta, OpenAI-Organization, OpenAI-Beta";

/// Preflight cache lifetime: 24 hours.
pub const MAX_AGE_SECS: &str = "86400";

/// Overwrite the CORS headers on `headers`.
pub fn apply(headers: &mut HeaderMap) {
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
    headers.insert(header::ACCESS_CONTROL_EXPOSE_HEADERS, HeaderValue::from_static("*"));
}
