//! E2E tests for the monitoring API
//!
//! Each test starts the router on a random local port and drives it over
//! HTTP with reqwest, the same way the dashboard does.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bms_api::{create_router, AppState};
use bms_core::{FaultRecord, MemoryStore};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// A test server that shuts down when dropped
struct TestServer {
    addr: SocketAddr,
    client: reqwest::Client,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    async fn start(store: MemoryStore) -> Self {
        let router = create_router(AppState::new(Arc::new(store)));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        // Give server a moment to start
        tokio::time::sleep(Duration::from_millis(10)).await;

        Self {
            addr,
            client: reqwest::Client::new(),
            shutdown_tx: Some(shutdown_tx),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn get(&self, path: &str) -> (u16, Value) {
        let resp = self.client.get(self.url(path)).send().await.unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }

    async fn post(&self, path: &str, body: Value) -> (u16, Value) {
        let resp = self.client.post(self.url(path)).json(&body).send().await.unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

fn record(id: i64, flags: i64, floor: i32, room: i32, severity: i32, time: DateTime<Utc>) -> FaultRecord {
    FaultRecord {
        id,
        device_type: "iaq".to_string(),
        fault_flags: flags,
        floor: Some(floor),
        room: Some(room),
        severity,
        time,
        resolved: None,
        resolved_at: None,
    }
}

fn minutes_ago(minutes: i64) -> DateTime<Utc> {
    Utc::now() - chrono::Duration::minutes(minutes)
}

#[tokio::test]
async fn test_health() {
    let server = TestServer::start(MemoryStore::new()).await;
    let resp = server.client.get(server.url("/health")).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_flag_table_and_decode() {
    let server = TestServer::start(MemoryStore::new()).await;

    let (status, body) = server.get("/api/v1/flags").await;
    assert_eq!(status, 200);
    assert_eq!(body["total_count"], 9);
    assert_eq!(body["items"][8]["name"], "PRESENCE_NOT_READING");
    assert_eq!(body["items"][8]["value"], 256);

    let (status, body) = server.get("/api/v1/flags/36/decode").await;
    assert_eq!(status, 200);
    assert_eq!(body["descriptions"], json!(["High temperature", "High CO2"]));
    assert_eq!(body["names"], json!(["TEMP_HIGH", "CO2_HIGH"]));
    assert_eq!(body["flags"], 36);

    let (_, body) = server.get("/api/v1/flags/0/decode").await;
    assert_eq!(body["descriptions"], json!([]));
}

#[tokio::test]
async fn test_ingest_detect_and_resolve() {
    let server = TestServer::start(MemoryStore::new()).await;

    let (status, body) = server
        .post(
            "/api/v1/readings",
            json!({
                "sensor_id": 11,
                "sensor_type": "iaq",
                "floor": 2,
                "room": 5,
                "temperature": 38.5,
                "humidity": 45.0,
                "co2": 900.0
            }),
        )
        .await;
    assert_eq!(status, 201);
    assert_eq!(body["fault_flags"], 4 | 32);
    assert_eq!(body["faults"].as_array().unwrap().len(), 1);
    let fault = &body["faults"][0];
    assert_eq!(fault["device_type"], "iaq");
    assert_eq!(fault["severity"], 2);
    assert_eq!(fault["location"], "Floor 2, Room 5");
    assert_eq!(fault["active"], true);
    let fault_id = fault["id"].as_i64().unwrap();

    let (_, recent) = server.get("/api/v1/faults/recent").await;
    assert_eq!(recent["total_count"], 1);

    let (status, fetched) = server.get(&format!("/api/v1/faults/{}", fault_id)).await;
    assert_eq!(status, 200);
    assert_eq!(fetched["descriptions"], json!(["High temperature", "High CO2"]));

    let (status, resolved) = server
        .post(&format!("/api/v1/faults/{}/resolve", fault_id), json!({}))
        .await;
    assert_eq!(status, 200);
    assert_eq!(resolved["resolved"], true);
    assert_eq!(resolved["active"], false);

    let (_, again) = server
        .post(&format!("/api/v1/faults/{}/resolve", fault_id), json!({}))
        .await;
    assert_eq!(again["resolved_at"], resolved["resolved_at"]);

    let (_, recent) = server.get("/api/v1/faults/recent").await;
    assert_eq!(recent["total_count"], 0);
}

#[tokio::test]
async fn test_normal_reading_creates_no_fault() {
    let server = TestServer::start(MemoryStore::new()).await;
    let (status, body) = server
        .post(
            "/api/v1/readings",
            json!({"sensor_id": 3, "sensor_type": "power", "floor": 1, "room": 1, "power": 12.0}),
        )
        .await;
    assert_eq!(status, 201);
    assert_eq!(body["fault_flags"], 0);
    assert_eq!(body["faults"], json!([]));
}

#[tokio::test]
async fn test_missing_fault_is_404() {
    let server = TestServer::start(MemoryStore::new()).await;
    let (status, body) = server.get("/api/v1/faults/999").await;
    assert_eq!(status, 404);
    assert_eq!(body["error"], "not_found");

    let (status, _) = server.post("/api/v1/faults/999/resolve", json!({})).await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn test_floor_views() {
    let store = MemoryStore::with_data(
        vec![
            record(1, 4, 3, 2, 2, minutes_ago(30)),
            record(2, 16, 3, 6, 1, minutes_ago(10)),
            record(3, 64, 4, 1, 3, minutes_ago(5)),
        ],
        Vec::new(),
    );
    let server = TestServer::start(store).await;

    let (_, body) = server.get("/api/v1/floors/3/faults").await;
    assert_eq!(body["total_count"], 2);
    assert_eq!(body["items"][0]["id"], 2);

    let (_, body) = server.get("/api/v1/floors/3/rooms").await;
    assert_eq!(body["rooms"], json!([2, 6]));

    let (_, body) = server.get("/api/v1/floors/9/rooms").await;
    assert_eq!(body["rooms"], json!([1, 2, 3, 4, 5]));

    let (status, body) = server.get("/api/v1/floors/3/rooms/6/latest-fault").await;
    assert_eq!(status, 200);
    assert_eq!(body["id"], 2);

    let (status, body) = server.get("/api/v1/floors/3/rooms/7/latest-fault").await;
    assert_eq!(status, 404);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_analysis_summary() {
    let mut old = record(4, 4, 1, 1, 2, minutes_ago(3 * 24 * 60));
    old.resolved = Some(true);
    let mut resolved = record(3, 4 | 8, 1, 2, 2, minutes_ago(20));
    resolved.resolved = Some(true);
    let store = MemoryStore::with_data(
        vec![
            record(1, 4, 1, 2, 2, minutes_ago(10)),
            record(2, 16, 1, 2, 1, minutes_ago(90)),
            resolved,
            old,
        ],
        Vec::new(),
    );
    let server = TestServer::start(store).await;

    let (status, body) = server.get("/api/v1/analysis/summary").await;
    assert_eq!(status, 200);
    assert_eq!(body["range"], "1day");
    assert_eq!(body["description"], "last 24 hours");
    assert_eq!(body["total"], 3);
    assert_eq!(body["active"], 2);
    assert_eq!(body["resolution_rate"], 33);
    assert_eq!(body["top_locations"][0], json!({"name": "Floor 1, Room 2", "value": 3}));
    assert_eq!(body["top_fault_types"][0], json!({"type": "High temperature", "count": 2}));
    assert_eq!(
        body["by_severity"],
        json!([{"name": "Medium", "value": 2}, {"name": "Low", "value": 1}])
    );

    let (_, body) = server.get("/api/v1/analysis/summary?range=1hour").await;
    assert_eq!(body["total"], 2);
    assert_eq!(body["resolution_rate"], 50);

    let (status, body) = server.get("/api/v1/analysis/summary?range=2days").await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_analysis_trends() {
    let store = MemoryStore::with_data(
        vec![
            record(1, 16, 1, 1, 1, minutes_ago(1)),
            record(2, 4, 1, 1, 2, minutes_ago(2)),
            record(3, 4, 1, 1, 2, minutes_ago(120)),
        ],
        Vec::new(),
    );
    let server = TestServer::start(store).await;

    let (status, body) = server.get("/api/v1/analysis/trends?range=1h").await;
    assert_eq!(status, 200);
    assert_eq!(body["bucket_minutes"], 5);
    let items = body["items"].as_array().unwrap();
    let total: i64 = items.iter().map(|b| b["fault_count"].as_i64().unwrap()).sum();
    let urgent: i64 = items.iter().map(|b| b["urgent_count"].as_i64().unwrap()).sum();
    assert_eq!(total, 2);
    assert_eq!(urgent, 1);

    let (status, body) = server.get("/api/v1/analysis/trends?range=2h").await;
    assert_eq!(status, 400);
    assert_eq!(body["message"], "Invalid range. Use '1h', '30m', or '1d'");
}

#[tokio::test]
async fn test_readings_annotated_and_sensor_status() {
    let server = TestServer::start(MemoryStore::new()).await;

    server
        .post(
            "/api/v1/readings",
            json!({"sensor_id": 1, "sensor_type": "iaq", "floor": 1, "room": 4,
                   "temperature": 30.0, "humidity": 40.0, "co2": 500.0}),
        )
        .await;
    let old_time = minutes_ago(30).to_rfc3339();
    server
        .post(
            "/api/v1/readings",
            json!({"sensor_id": 2, "sensor_type": "presence", "floor": 1, "room": 4,
                   "presence": 1, "time": old_time}),
        )
        .await;

    let (status, body) = server.get("/api/v1/readings?floor=1&room=4&sensor_type=iaq").await;
    assert_eq!(status, 200);
    assert_eq!(body["total_count"], 1);
    assert_eq!(
        body["items"][0]["violations"][0]["message"],
        "Temperature out of range: 30°C (normal range: 18-28°C)"
    );

    let (status, _) = server.get("/api/v1/readings?sensor_type=hvac").await;
    assert_eq!(status, 400);

    let (_, body) = server.get("/api/v1/sensors/status").await;
    assert_eq!(body["overview"], json!({"online": 1, "offline": 1, "total": 2}));
    assert_eq!(body["items"][0]["sensor_id"], 1);
    assert_eq!(body["items"][0]["status"], "online");
    assert_eq!(body["items"][1]["status"], "offline");
    assert_eq!(body["offline_threshold_secs"], 300);
}

#[tokio::test]
async fn test_event_stream_reports_new_faults() {
    let server = TestServer::start(MemoryStore::new()).await;

    let resp = server
        .client
        .get(server.url("/api/v1/events"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let mut stream = resp.bytes_stream();

    server
        .post(
            "/api/v1/readings",
            json!({"sensor_id": 5, "sensor_type": "power", "floor": 2, "room": 2, "power": 0.0}),
        )
        .await;

    let mut received = String::new();
    let found = tokio::time::timeout(Duration::from_secs(2), async {
        while let Some(chunk) = stream.next().await {
            received.push_str(&String::from_utf8_lossy(&chunk.unwrap()));
            if received.contains("event: fault_inserted") {
                return true;
            }
        }
        false
    })
    .await
    .unwrap_or(false);

    assert!(found, "no fault event in: {}", received);
    assert!(received.contains("event: reading_inserted"));
}
