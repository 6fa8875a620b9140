//! Per-request state carried through the proxy pipeline.

use axum::{
    body::Body,
    http::{HeaderMap, Method, Request},
};

use crate::routing::RouteEntry;

/// Everything the pipeline needs from one inbound request.
///
/// The body can be taken exactly once; it is handed to the forwarder as a
/// live stream and never buffered here.
#[derive(Debug)]
pub struct ProxyRequestContext<'a> {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    body: Option<Body>,
    /// Set once the router has matched the path.
    pub route: Option<&'a RouteEntry>,
}

impl<'a> ProxyRequestContext<'a> {
    pub fn new(request: Request<Body>) -> Self {
        let (parts, body) = request.into_parts();
        Self {
            method: parts.method,
            path: parts.uri.path().to_string(),
            query: parts.uri.query().map(String::from),
            headers: parts.headers,
            body: Some(body),
            route: None,
        }
    }

    /// Take the body stream. Returns `None` on every call after the first.
    pub fn take_body(&mut self) -> Option<Body> {
        self.body.take()
    }

    /// Provider name for logs and metrics.
    pub fn provider(&self) -> &str {
        self.route.map(RouteEntry::name).unwrap_or("none")
    }

    /// Matched route prefix for logs, `none` before routing.
    pub fn prefix(&self) -> &str {
        self.route.map(RouteEntry::prefix).unwrap_or("none")
    }
}
