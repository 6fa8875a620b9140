//! Upstream request forwarding.
//!
//! # Responsibilities
//! - Send the rewritten request with the client body as a live stream
//! - Return the upstream response as soon as its headers arrive
//! - Classify transport failures (connect, timeout, other)
//!
//! # Design Decisions
//! - Redirects are never followed; a 3xx goes back to the client untouched
//! - No retries: request bodies are single-use streams
//! - Only connection setup and the wait for response headers have deadlines;
//!   the response body may stream indefinitely
//! - No automatic decompression, so upstream bytes pass through unchanged
//! - Backpressure comes from the transport: the inbound body is polled only
//!   when the outbound connection can take more bytes

use std::error::Error as _;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, HeaderMap, Method},
};
use reqwest::{redirect, Url};

use crate::config::{TimeoutConfig, UpstreamConfig};
use crate::error::UpstreamErrorKind;

/// A transport-level failure talking to the upstream.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{detail}")]
pub struct ForwardError {
    pub kind: UpstreamErrorKind,
    pub detail: String,
}

impl ForwardError {
    fn from_reqwest(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            UpstreamErrorKind::Timeout
        } else if err.is_connect() {
            UpstreamErrorKind::Connect
        } else {
            UpstreamErrorKind::Other
        };
        // The URL may carry caller query parameters; keep it out of the detail.
        let err = err.without_url();

        let mut detail = err.to_string();
        let mut source = err.source();
        while let Some(inner) = source {
            detail.push_str(": ");
            detail.push_str(&inner.to_string());
            source = inner.source();
        }
        Self { kind, detail }
    }
}

/// Methods whose client body is forwarded.
pub fn forwards_body(method: &Method) -> bool {
    method != Method::GET && method != Method::HEAD
}

/// Streams requests to upstream providers.
#[derive(Debug, Clone)]
pub struct StreamingForwarder {
    client: reqwest::Client,
    response_header_timeout: Option<Duration>,
}

impl StreamingForwarder {
    pub fn new(config: &TimeoutConfig, upstream: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder()
            .redirect(redirect::Policy::none())
            .connect_timeout(Duration::from_secs(config.connect_secs))
            .pool_idle_timeout(Duration::from_secs(90));
        if !upstream.system_proxy {
            builder = builder.no_proxy();
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            response_header_timeout: (config.response_header_secs > 0)
                .then(|| Duration::from_secs(config.response_header_secs)),
        })
    }

    /// Send one request and wait for the upstream response headers.
    ///
    /// `body` is ignored for GET and HEAD. When no body is sent, the client's
    /// `content-length` and `expect` headers are dropped so the upstream does
    /// not wait for bytes that never come. Dropping the returned future, or
    /// the body of the returned response, aborts the upstream request.
    pub async fn forward(
        &self,
        method: Method,
        url: Url,
        mut headers: HeaderMap,
        body: Option<Body>,
    ) -> Result<reqwest::Response, ForwardError> {
        let body = body.filter(|_| forwards_body(&method));
        if body.is_none() {
            headers.remove(header::CONTENT_LENGTH);
            headers.remove(header::EXPECT);
        }

        let mut request = self.client.request(method, url).headers(headers);
        if let Some(body) = body {
            request = request.body(reqwest::Body::wrap_stream(body.into_data_stream()));
        }

        let send = request.send();
        let result = match self.response_header_timeout {
            Some(limit) => tokio::time::timeout(limit, send).await.map_err(|_| ForwardError {
                kind: UpstreamErrorKind::Timeout,
                detail: format!("no response headers within {}s", limit.as_secs()),
            })?,
            None => send.await,
        };
        result.map_err(ForwardError::from_reqwest)
    }
}
