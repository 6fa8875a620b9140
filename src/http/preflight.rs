//! CORS preflight answers.
//!
//! Any `OPTIONS` request, whatever its path, is answered here with 204 and
//! the CORS header set. It runs before the auth gate and the router, so a
//! preflight is never rejected and never reaches an upstream.

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::Response,
};

use crate::http::cors;

/// Build the preflight response.
pub fn preflight_response() -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::NO_CONTENT;
    let headers = response.headers_mut();
    cors::apply(headers);
    headers.insert(
        header::ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from_static(cors::MAX_AGE_SECS),
    );
    response
}
