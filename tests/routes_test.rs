use async_trait::async_trait;
use chrono::Weekday;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use site_health_monitor::config::{MailConfig, MonitorConfig, ScheduleZone};
use site_health_monitor::error::{DeliveryError, SourceError};
use site_health_monitor::notifier::{MailTransport, MemoryTransport, OutgoingMail};
use site_health_monitor::server::build_router;
use site_health_monitor::sources::{DiskUsage, FetchedPage, PlatformFacts, SiteProbe};
use site_health_monitor::state::{Collaborators, MonitorState};
use site_health_monitor::store::MemoryStore;

struct StaticSite;

#[async_trait]
impl SiteProbe for StaticSite {
    async fn fetch(&self, _url: &str) -> Result<FetchedPage, SourceError> {
        let body = "<title>Demo</title>".to_string();
        Ok(FetchedPage {
            status: 200,
            size_bytes: body.len(),
            body,
            elapsed: Duration::from_millis(250),
        })
    }

    async fn probe(&self, _url: &str) -> Result<u16, SourceError> {
        Ok(200)
    }
}

struct DownTransport;

#[async_trait]
impl MailTransport for DownTransport {
    async fn send(&self, _mail: &OutgoingMail) -> Result<(), DeliveryError> {
        Err(DeliveryError::Transport("connection refused".into()))
    }
}

fn test_config() -> MonitorConfig {
    MonitorConfig {
        site_url: "https://example.com".to_string(),
        site_name: "Demo".to_string(),
        site_root: PathBuf::from("/tmp/site"),
        watched_files: vec![],
        facts_file: None,
        commerce_enabled: false,
        state_db: PathBuf::from("/tmp/state.db"),
        default_recipient: "admin@example.com".to_string(),
        mail: MailConfig::Outbox {
            dir: PathBuf::from("/tmp/outbox"),
        },
        zone: ScheduleZone::Named(chrono_tz::UTC),
        week_start: Weekday::Sun,
        probe_timeout: Duration::from_secs(5),
        trigger_interval: Duration::from_secs(60),
        port: 0,
        log_dir: None,
    }
}

async fn spawn_monitor(transport: Arc<dyn MailTransport>) -> String {
    let state = Arc::new(MonitorState::new(
        test_config(),
        Collaborators {
            store: Arc::new(MemoryStore::new()),
            probe: Arc::new(StaticSite),
            platform: Arc::new(PlatformFacts::default()),
            disk: Arc::new(DiskUsage {
                used_bytes: 1,
                total_bytes: 2,
            }),
            transport,
        },
    ));
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

async fn add(client: &reqwest::Client, base: &str, email: &str) -> (u16, Value) {
    let resp = client
        .post(format!("{base}/recipients"))
        .json(&json!({ "email": email }))
        .send()
        .await
        .unwrap();
    (resp.status().as_u16(), resp.json().await.unwrap())
}

async fn list(client: &reqwest::Client, base: &str) -> Vec<String> {
    let body: Value = client
        .get(format!("{base}/recipients"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["success"], true);
    serde_json::from_value(body["data"].clone()).unwrap()
}

#[tokio::test]
async fn test_report_endpoint_envelope() {
    let base = spawn_monitor(Arc::new(MemoryTransport::new())).await;
    let body: Value = reqwest::get(format!("{base}/report"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["home_title"], "Demo");
    assert_eq!(body["data"]["load_time"], 0.25);
    assert_eq!(body["data"]["commerce_enabled"], false);
    assert_eq!(body["data"]["disk_usage"]["total_bytes"], 2);
}

#[tokio::test]
async fn test_duplicate_recipient_rejected() {
    let base = spawn_monitor(Arc::new(MemoryTransport::new())).await;
    let client = reqwest::Client::new();

    let (status, body) = add(&client, &base, "ops@example.com").await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);

    let (status, body) = add(&client, &base, "ops@example.com").await;
    assert_eq!(status, 409);
    assert_eq!(body["success"], false);
    assert!(body["data"].as_str().unwrap().contains("already exists"));

    assert_eq!(list(&client, &base).await, vec!["ops@example.com"]);
}

#[tokio::test]
async fn test_invalid_recipient_rejected() {
    let base = spawn_monitor(Arc::new(MemoryTransport::new())).await;
    let client = reqwest::Client::new();

    let (status, body) = add(&client, &base, "not-an-address").await;
    assert_eq!(status, 400);
    assert_eq!(body["success"], false);
    assert!(list(&client, &base).await.is_empty());
}

#[tokio::test]
async fn test_remove_missing_recipient_reports_not_found() {
    let base = spawn_monitor(Arc::new(MemoryTransport::new())).await;
    let client = reqwest::Client::new();
    add(&client, &base, "ops@example.com").await;

    let resp = client
        .delete(format!("{base}/recipients"))
        .json(&json!({ "email": "ghost@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(list(&client, &base).await, vec!["ops@example.com"]);

    let resp = client
        .delete(format!("{base}/recipients"))
        .json(&json!({ "email": "ops@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    assert!(list(&client, &base).await.is_empty());
}

#[tokio::test]
async fn test_send_test_email() {
    let base = spawn_monitor(Arc::new(MemoryTransport::new())).await;
    let body: Value = reqwest::Client::new()
        .post(format!("{base}/recipients/test"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"], "Test email sent successfully.");
}

#[tokio::test]
async fn test_send_test_email_failure_envelope() {
    let base = spawn_monitor(Arc::new(DownTransport)).await;
    let resp = reqwest::Client::new()
        .post(format!("{base}/recipients/test"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 502);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert!(body["data"].as_str().unwrap().contains("connection refused"));
}

#[tokio::test]
async fn test_not_found_events_and_failed_logins_feed_report() {
    let base = spawn_monitor(Arc::new(MemoryTransport::new())).await;
    let client = reqwest::Client::new();

    for path in ["/a", "/b"] {
        let body: Value = client
            .post(format!("{base}/events/not-found"))
            .json(&json!({ "url": format!("https://example.com{path}") }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["success"], true);
    }
    client
        .post(format!("{base}/security/failed-logins"))
        .send()
        .await
        .unwrap();

    let events: Value = client
        .get(format!("{base}/events/not-found"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(events["data"][1]["url"], "https://example.com/b");

    let report: Value = client
        .get(format!("{base}/report"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(report["data"]["recent_404_count"], 2);
    assert_eq!(report["data"]["failed_login_count"], 1);
}

#[tokio::test]
async fn test_health_endpoint() {
    let base = spawn_monitor(Arc::new(MemoryTransport::new())).await;
    let body: Value = reqwest::get(format!("{base}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["site_url"], "https://example.com");
}

#[tokio::test]
async fn test_malformed_bodies_answer_with_envelope() {
    let base = spawn_monitor(Arc::new(MemoryTransport::new())).await;
    let client = reqwest::Client::new();

    let requests = [
        client.post(format!("{base}/recipients")).json(&json!({})),
        client
            .delete(format!("{base}/recipients"))
            .json(&json!({ "address": "ops@example.com" })),
        client
            .post(format!("{base}/events/not-found"))
            .header("content-type", "application/json")
            .body("{not json"),
        client.post(format!("{base}/recipients")).body("email=ops@example.com"),
    ];
    for request in requests {
        let resp = request.send().await.unwrap();
        assert_eq!(resp.status().as_u16(), 400);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["success"], false);
        assert!(body["data"].as_str().unwrap().starts_with("Invalid request body"));
    }
    assert!(list(&client, &base).await.is_empty());
}

#[tokio::test]
async fn test_failed_login_counter_reset() {
    let base = spawn_monitor(Arc::new(MemoryTransport::new())).await;
    let client = reqwest::Client::new();

    for _ in 0..3 {
        client
            .post(format!("{base}/security/failed-logins"))
            .send()
            .await
            .unwrap();
    }
    let body: Value = client
        .delete(format!("{base}/security/failed-logins"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"], 0);

    let report: Value = client
        .get(format!("{base}/report"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(report["data"]["failed_login_count"], 0);
}
