//! Response handling and transformation.
//!
//! # Responsibilities
//! - Copy the upstream status and headers to the client response
//! - Drop framing and connection-scoped headers (the server re-frames)
//! - Overwrite CORS headers
//! - Stream the upstream body through without buffering
//!
//! # Design Decisions
//! - No size or duration limits on the body: token streams can run long
//! - Status codes, including 3xx from the upstream, pass through unchanged

use axum::{
    body::Body,
    http::HeaderMap,
    response::Response,
};

use crate::http::cors;

const DROPPED: &[&str] = &[
    "content-length",
    "transfer-encoding",
    "connection",
    "keep-alive",
    "proxy-connection",
    "upgrade",
    "te",
    "trailer",
];

fn strip_framing(headers: &mut HeaderMap) {
    for name in DROPPED {
        headers.remove(*name);
    }
}

/// Turn an upstream response into the client response.
pub fn assemble(upstream: reqwest::Response) -> Response {
    let status = upstream.status();
    let mut headers = upstream.headers().clone();
    strip_framing(&mut headers);
    cors::apply(&mut headers);

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}
