//! `HttpRecordStore` against a throwaway HTTP server answering canned responses.

use std::time::Duration;

use farm_records::HttpRecordStore;
use field_gate::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A request as seen by the fake server.
#[derive(Debug)]
struct Seen {
    method: String,
    path: String,
    body: String,
}

/// Serve exactly one request with `status` and `body`, returning what was received.
async fn serve_once(status: u16, body: &'static str) -> (String, JoinHandle<Seen>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut raw = Vec::new();
        let mut buf = [0u8; 4096];
        let (head, mut rest) = loop {
            let n = socket.read(&mut buf).await.unwrap();
            raw.extend_from_slice(&buf[..n]);
            if let Some(pos) = raw.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&raw[..pos]).to_string();
                break (head, raw[pos + 4..].to_vec());
            }
            assert!(n > 0, "connection closed before headers were complete");
        };
        let length = head
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        while rest.len() < length {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            rest.extend_from_slice(&buf[..n]);
        }

        let reply = format!(
            "HTTP/1.1 {status} X\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(reply.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();

        let mut request_line = head.lines().next().unwrap_or_default().split_whitespace();
        Seen {
            method: request_line.next().unwrap_or_default().to_string(),
            path: request_line.next().unwrap_or_default().to_string(),
            body: String::from_utf8_lossy(&rest).to_string(),
        }
    });
    (format!("http://{addr}/api"), handle)
}

fn store(base: &str) -> HttpRecordStore {
    HttpRecordStore::new(base, Duration::from_secs(5)).unwrap()
}

fn payload() -> Payload {
    json!({"cropType": "Coconut", "numberOfWorkers": 5})
        .as_object()
        .cloned()
        .unwrap()
}

#[tokio::test]
async fn create_posts_json_to_the_collection() {
    let (base, server) = serve_once(201, r#"{"_id":"1"}"#).await;
    store(&base).create("harvest", &payload()).await.unwrap();

    let seen = server.await.unwrap();
    assert_eq!(seen.method, "POST");
    assert_eq!(seen.path, "/api/harvest");
    let body: Value = serde_json::from_str(&seen.body).unwrap();
    assert_eq!(body, json!({"cropType": "Coconut", "numberOfWorkers": 5}));
}

#[tokio::test]
async fn update_puts_to_the_record() {
    let (base, server) = serve_once(200, r#"{"message":"updated"}"#).await;
    store(&base)
        .update("yield", "abc123", &payload())
        .await
        .unwrap();
    let seen = server.await.unwrap();
    assert_eq!(seen.method, "PUT");
    assert_eq!(seen.path, "/api/yield/abc123");
}

#[tokio::test]
async fn server_message_is_surfaced_on_rejection() {
    let (base, server) = serve_once(400, r#"{"message":"duplicate"}"#).await;
    let err = store(&base)
        .create("harvest", &payload())
        .await
        .unwrap_err();
    server.await.unwrap();
    assert_eq!(
        err,
        PersistenceError::Rejected {
            status: Some(400),
            message: "duplicate".into()
        }
    );
    assert_eq!(err.user_message(), "duplicate");
}

#[tokio::test]
async fn missing_record_maps_to_not_found() {
    let (base, server) = serve_once(404, r#"{"message":"Record not found"}"#).await;
    let err = store(&base).get("yield", "nope").await.unwrap_err();
    server.await.unwrap();
    assert_eq!(err, PersistenceError::NotFound("nope".into()));
}

#[tokio::test]
async fn get_returns_the_record() {
    let (base, server) = serve_once(200, r#"{"_id":"r1","unit":"Kg","quantity":12}"#).await;
    let record = store(&base).get("yield", "r1").await.unwrap();
    let seen = server.await.unwrap();
    assert_eq!(seen.method, "GET");
    assert_eq!(seen.path, "/api/yield/r1");
    assert_eq!(record.get("quantity"), Some(&json!(12)));
}

#[tokio::test]
async fn list_unwraps_the_data_envelope() {
    let (base, server) = serve_once(
        200,
        r#"{"data":[{"fertilizertype":"Urea","quantity":4,"unit":"Kg","status":"In Stock"}]}"#,
    )
    .await;
    let records = store(&base).list("fertilizers").await.unwrap();
    server.await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].get("fertilizertype"), Some(&json!("Urea")));
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    // bind and drop to get a port nobody listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let err = store(&format!("http://{addr}/api"))
        .list("harvest")
        .await
        .unwrap_err();
    assert!(matches!(err, PersistenceError::Transport(_)), "{err:?}");
}
