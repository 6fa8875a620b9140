//! Shared helpers for the integration tests: recording mock upstreams and a
//! proxy bound to an ephemeral port.

#![allow(dead_code)]

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, Method, Request, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use inference_proxy::config::{CredentialConfig, ProviderConfig, ProxyConfig, Secret};
use inference_proxy::{HttpServer, Shutdown};
use futures_util::StreamExt;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// One request as the upstream saw it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub uri: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

type Reply = Arc<dyn Fn() -> Response + Send + Sync>;

#[derive(Clone)]
struct MockState {
    requests: Arc<Mutex<Vec<Recorded>>>,
    reply: Reply,
}

/// An upstream that records every request and answers with a fixed reply.
pub struct MockUpstream {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl MockUpstream {
    /// Answers `200 {"ok":true}`.
    pub async fn start() -> Self {
        Self::start_with(|| {
            (
                StatusCode::OK,
                [("content-type", "application/json")],
                r#"{"ok":true}"#,
            )
                .into_response()
        })
        .await
    }

    pub async fn start_with<F>(reply: F) -> Self
    where
        F: Fn() -> Response + Send + Sync + 'static,
    {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            requests: requests.clone(),
            reply: Arc::new(reply),
        };
        let app = Router::new().fallback(record).with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, requests }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

async fn record(State(state): State<MockState>, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX)
        .await
        .unwrap_or_default();
    state.requests.lock().unwrap().push(Recorded {
        method: parts.method,
        uri: parts.uri.to_string(),
        headers: parts.headers,
        body,
    });
    (state.reply)()
}

/// An upstream whose single response body is fed chunk by chunk through the
/// returned sender. Dropping the sender ends the body.
pub async fn start_streaming_upstream() -> (SocketAddr, mpsc::Sender<Bytes>) {
    let (tx, rx) = mpsc::channel::<Bytes>(8);
    let rx = Arc::new(tokio::sync::Mutex::new(Some(rx)));

    let app = Router::new().fallback(move || {
        let rx = rx.clone();
        async move {
            match rx.lock().await.take() {
                Some(rx) => {
                    let stream = futures_util::stream::unfold(rx, |mut rx| async move {
                        rx.recv().await.map(|chunk| (Ok::<_, Infallible>(chunk), rx))
                    });
                    (
                        [("content-type", "text/event-stream")],
                        Body::from_stream(stream),
                    )
                        .into_response()
                }
                None => StatusCode::GONE.into_response(),
            }
        }
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (addr, tx)
}

/// An upstream that reports the first request-body chunk the moment it
/// arrives, then drains the rest and answers with the total byte count.
pub async fn start_body_watching_upstream() -> (SocketAddr, mpsc::Receiver<Bytes>) {
    let (tx, rx) = mpsc::channel::<Bytes>(1);

    let app = Router::new().fallback(move |request: Request<Body>| {
        let tx = tx.clone();
        async move {
            let mut stream = request.into_body().into_data_stream();
            let mut total = 0;
            if let Some(Ok(first)) = stream.next().await {
                total += first.len();
                let _ = tx.send(first).await;
            }
            while let Some(Ok(chunk)) = stream.next().await {
                total += chunk.len();
            }
            (StatusCode::OK, total.to_string()).into_response()
        }
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (addr, rx)
}

/// A loopback address nothing listens on.
pub fn closed_port() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

pub fn provider(
    name: &str,
    upstream_base: &str,
    version_segment: Option<&str>,
    credential: CredentialConfig,
    api_key: Option<&str>,
) -> ProviderConfig {
    ProviderConfig {
        name: name.to_string(),
        prefix: format!("/{}", name),
        upstream_base: upstream_base.to_string(),
        version_segment: version_segment.map(String::from),
        credential,
        api_key_env: format!("{}_TEST_KEY", name.to_uppercase()),
        api_key: api_key.map(Secret::new),
    }
}

pub fn header_credential(name: &str) -> CredentialConfig {
    CredentialConfig::Header {
        name: name.to_string(),
    }
}

pub fn config_with(providers: Vec<ProviderConfig>) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.providers = providers;
    config.upstream.system_proxy = false;
    config
}

/// Start the proxy on an ephemeral port. The listener is bound before this
/// returns, so requests can be sent immediately.
pub async fn spawn_proxy(config: ProxyConfig) -> (String, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config).unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (format!("http://{}", addr), shutdown)
}

/// Test client: no system proxy, no redirect following.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}
