//! Integration tests for the webhook server.
//!
//! These tests start a real HTTP server, send actual HTTP requests,
//! and verify that accepted events reach the queue.

use std::sync::mpsc;
use std::time::Duration;

use nowplaying_core::{EventKind, TRACK_FINISHED_TYPE, TRACK_STARTED_TYPE};
use webhook_server::{WebhookConfig, WebhookServer, EVENT_RECEIVED};

fn track_event(event_type: &str, title: &str) -> serde_json::Value {
    serde_json::json!({
        "specversion": "1.0",
        "type": event_type,
        "source": "https://github/radiorabe/klangbecken",
        "id": format!("crid://rabe.ch/v1/klangbecken#{title}"),
        "time": "2024-03-01T12:00:00Z",
        "data": {"item.artist": "Artist", "item.title": title, "item.length": 240},
    })
}

#[tokio::test]
async fn test_webhook_end_to_end() {
    let (tx, rx) = mpsc::channel();
    let server = WebhookServer::start(WebhookConfig::ephemeral(), tx)
        .expect("Failed to start webhook server");
    let url = server.webhook_url();

    let client = reqwest::Client::new();

    let response = client
        .post(&url)
        .basic_auth("rabe", Some("rabe"))
        .header("Content-Type", "application/cloudevents+json")
        .body(track_event(TRACK_STARTED_TYPE, "first").to_string())
        .send()
        .await
        .expect("Failed to send HTTP request");
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), EVENT_RECEIVED);

    let response = client
        .post(&url)
        .basic_auth("rabe", Some("rabe"))
        .json(&track_event(TRACK_FINISHED_TYPE, "first"))
        .send()
        .await
        .expect("Failed to send HTTP request");
    assert_eq!(response.status(), 200);

    let started = rx
        .recv_timeout(Duration::from_secs(1))
        .expect("No started event received");
    assert_eq!(started.kind, EventKind::Started);
    assert_eq!(started.data.title.as_deref(), Some("first"));
    assert_eq!(started.data.length, Some(240));

    let finished = rx
        .recv_timeout(Duration::from_secs(1))
        .expect("No finished event received");
    assert_eq!(finished.kind, EventKind::Finished);

    server.shutdown();
}

#[tokio::test]
async fn test_webhook_rejections() {
    let (tx, rx) = mpsc::channel();
    let server = WebhookServer::start(WebhookConfig::ephemeral(), tx)
        .expect("Failed to start webhook server");
    let url = server.webhook_url();
    let client = reqwest::Client::new();

    let unauthorized = client
        .post(&url)
        .json(&track_event(TRACK_STARTED_TYPE, "nope"))
        .send()
        .await
        .unwrap();
    assert_eq!(unauthorized.status(), 401);
    assert!(unauthorized.headers().contains_key("www-authenticate"));

    let wrong_type = client
        .post(&url)
        .basic_auth("rabe", Some("rabe"))
        .header("Content-Type", "text/xml")
        .body("<event/>")
        .send()
        .await
        .unwrap();
    assert_eq!(wrong_type.status(), 415);

    let bad_envelope = client
        .post(&url)
        .basic_auth("rabe", Some("rabe"))
        .json(&serde_json::json!({"specversion": "0.3"}))
        .send()
        .await
        .unwrap();
    assert_eq!(bad_envelope.status(), 400);
    let description: String = bad_envelope.json().await.unwrap();
    assert!(description.contains("specversion"));

    let elsewhere = client
        .post(format!("http://{}/other", server.local_addr()))
        .basic_auth("rabe", Some("rabe"))
        .send()
        .await
        .unwrap();
    assert_eq!(elsewhere.status(), 404);

    assert!(rx.try_recv().is_err());
    server.shutdown();
}

#[test]
fn test_queue_outlives_server() {
    let (tx, rx) = mpsc::channel();
    let server = WebhookServer::start(WebhookConfig::ephemeral(), tx).unwrap();
    server.shutdown();

    // The server dropped its sender on shutdown
    assert!(rx.recv_timeout(Duration::from_secs(1)).is_err());
}
