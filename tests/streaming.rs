//! Streaming behaviour: chunks are relayed as they arrive, in order, and a
//! departing client tears down the upstream request.

use std::time::Duration;

use axum::body::Bytes;
use axum::http::StatusCode;
use inference_proxy::config::CredentialConfig;
use tokio::time::timeout;

mod common;

use common::{client, config_with, provider, spawn_proxy, start_streaming_upstream, MockUpstream};

/// Read from `res` until `expected` bytes have arrived.
async fn read_exact(res: &mut reqwest::Response, expected: usize) -> Vec<u8> {
    let mut buf = Vec::new();
    while buf.len() < expected {
        let chunk = timeout(Duration::from_secs(5), res.chunk())
            .await
            .expect("chunk did not arrive in time")
            .unwrap()
            .expect("stream ended early");
        buf.extend_from_slice(&chunk);
    }
    buf
}

#[tokio::test]
async fn test_response_chunks_are_relayed_before_upstream_finishes() {
    let (addr, tx) = start_streaming_upstream().await;
    let config = config_with(vec![provider(
        "chatgpt",
        &format!("http://{}", addr),
        Some("/v1"),
        CredentialConfig::Bearer,
        Some("sk-openai"),
    )]);
    let (proxy, _shutdown) = spawn_proxy(config).await;

    let mut res = timeout(
        Duration::from_secs(5),
        client()
            .post(format!("{}/chatgpt/chat/completions", proxy))
            .body(r#"{"stream":true}"#)
            .send(),
    )
    .await
    .expect("response headers should not wait for the body")
    .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "text/event-stream");
    assert_eq!(res.headers()["access-control-allow-origin"], "*");

    let events = ["data: one\n\n", "data: two\n\n", "data: [DONE]\n\n"];
    for event in events {
        // The upstream is still open: each event must arrive on its own.
        tx.send(Bytes::from_static(event.as_bytes())).await.unwrap();
        let got = read_exact(&mut res, event.len()).await;
        assert_eq!(got, event.as_bytes());
    }

    drop(tx);
    let end = timeout(Duration::from_secs(5), res.chunk()).await.unwrap().unwrap();
    assert!(end.is_none());
}

#[tokio::test]
async fn test_client_disconnect_cancels_upstream() {
    let (addr, tx) = start_streaming_upstream().await;
    let config = config_with(vec![provider(
        "chatgpt",
        &format!("http://{}", addr),
        Some("/v1"),
        CredentialConfig::Bearer,
        Some("sk-openai"),
    )]);
    let (proxy, _shutdown) = spawn_proxy(config).await;

    let mut res = client()
        .post(format!("{}/chatgpt/chat/completions", proxy))
        .body("{}")
        .send()
        .await
        .unwrap();
    tx.send(Bytes::from_static(b"data: first\n\n")).await.unwrap();
    read_exact(&mut res, 13).await;
    drop(res);

    // Once the client is gone the upstream body is dropped, which closes the
    // channel. Keep writing so every hop notices the closed socket.
    let cancelled = timeout(Duration::from_secs(10), async {
        loop {
            if tx.send(Bytes::from_static(b"data: more\n\n")).await.is_err() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    })
    .await;
    assert!(cancelled.is_ok(), "upstream stream was never torn down");
}

#[tokio::test]
async fn test_request_body_is_streamed_through() {
    let upstream = MockUpstream::start().await;
    let config = config_with(vec![provider(
        "chatgpt",
        &upstream.base_url(),
        Some("/v1"),
        CredentialConfig::Bearer,
        Some("sk-openai"),
    )]);
    let (proxy, _shutdown) = spawn_proxy(config).await;

    let parts: Vec<Result<&'static str, std::io::Error>> =
        vec![Ok("{\"messages\":"), Ok("[{\"role\":\"user\"}"), Ok("]}")];
    let body = reqwest::Body::wrap_stream(futures_util::stream::iter(parts));

    let res = client()
        .post(format!("{}/chatgpt/chat/completions", proxy))
        .body(body)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let req = &upstream.requests()[0];
    assert_eq!(&req.body[..], br#"{"messages":[{"role":"user"}]}"#);
}

#[tokio::test]
async fn test_head_and_get_send_no_body() {
    let upstream = MockUpstream::start().await;
    let config = config_with(vec![provider(
        "chatgpt",
        &upstream.base_url(),
        Some("/v1"),
        CredentialConfig::Bearer,
        Some("sk-openai"),
    )]);
    let (proxy, _shutdown) = spawn_proxy(config).await;

    let res = client()
        .head(format!("{}/chatgpt/models", proxy))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let req = &upstream.requests()[0];
    assert_eq!(req.method, "HEAD");
    assert!(req.body.is_empty());
}

#[tokio::test]
async fn test_request_body_reaches_upstream_before_client_finishes() {
    let (addr, mut first_seen) = common::start_body_watching_upstream().await;
    let config = config_with(vec![provider(
        "claude",
        &format!("http://{}", addr),
        Some("/v1"),
        common::header_credential("x-api-key"),
        Some("sk-ant"),
    )]);
    let (proxy, _shutdown) = spawn_proxy(config).await;

    let (body_tx, body_rx) = tokio::sync::mpsc::channel::<Result<Bytes, std::io::Error>>(4);
    let stream = futures_util::stream::unfold(body_rx, |mut rx| async move {
        rx.recv().await.map(|chunk| (chunk, rx))
    });
    let pending = tokio::spawn(
        client()
            .post(format!("{}/claude/messages", proxy))
            .body(reqwest::Body::wrap_stream(stream))
            .send(),
    );

    body_tx.send(Ok(Bytes::from_static(b"first"))).await.unwrap();
    let seen = timeout(Duration::from_secs(5), first_seen.recv())
        .await
        .expect("upstream saw nothing while the client body was still open")
        .unwrap();
    assert_eq!(&seen[..], b"first");

    body_tx.send(Ok(Bytes::from_static(b"-second"))).await.unwrap();
    drop(body_tx);

    let res = timeout(Duration::from_secs(5), pending)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "12");
}
