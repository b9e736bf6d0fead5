//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycle for each endpoint.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{Request, StatusCode},
    Router,
};
use letter_gate::{
    create_router,
    notify::{Notification, NotificationTransport, TransportError},
    storage::MemoryFeedbackRepository,
    AppState, Config,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

// == Helper Types ==

/// Transport that always fails, counting attempts.
#[derive(Default)]
struct BrokenRelay {
    attempts: AtomicUsize,
}

#[async_trait]
impl NotificationTransport for BrokenRelay {
    async fn deliver(&self, _notification: &Notification) -> Result<(), TransportError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(TransportError::Unreachable("relay offline".into()))
    }

    fn name(&self) -> &'static str {
        "broken"
    }
}

struct TestApp {
    app: Router,
    relay: Arc<BrokenRelay>,
    _dir: TempDir,
}

// == Helper Functions ==

fn create_test_app() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        valid_names: vec!["Zubiyah".into(), "Zubi".into()],
        user_dob: "2003-04-17".into(),
        data_dir: dir.path().to_path_buf(),
        notify_receiver: "owner@example.com".into(),
        ..Config::default()
    };
    let relay = Arc::new(BrokenRelay::default());
    let state = AppState::new(
        &config,
        relay.clone(),
        Arc::new(MemoryFeedbackRepository::new()),
    );

    TestApp {
        app: create_router(state, &[]),
        relay,
        _dir: dir,
    }
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-forwarded-for", "203.0.113.9")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn visit(page: &str, timestamp: &str) -> Value {
    json!({"sessionId": "s1", "page": page, "timestamp": timestamp})
}

// == Root Endpoint Tests ==

#[tokio::test]
async fn test_index_endpoint() {
    let t = create_test_app();

    let (status, json) = send(&t.app, empty_request("GET", "/")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Letter API Server");
    assert_eq!(json["endpoints"]["submit"], "POST /api/submit");
}

#[tokio::test]
async fn test_health_endpoint() {
    let t = create_test_app();

    let (status, json) = send(&t.app, empty_request("GET", "/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert!(json.get("timestamp").is_some());
}

// == Validate Endpoint Tests ==

#[tokio::test]
async fn test_validate_outcomes() {
    let t = create_test_app();

    let cases = [
        (json!({"name": "  ZUBIYAH ", "dob": "2003-04-17"}), json!({"success": true})),
        (
            json!({"name": "Zubi", "dob": "2003-04-18"}),
            json!({"success": false, "message": "Date of birth is incorrect"}),
        ),
        (
            json!({"name": "Someone", "dob": "2003-04-17"}),
            json!({"success": false, "message": "Name is incorrect"}),
        ),
        (
            json!({"name": "Someone", "dob": "1999-01-01"}),
            json!({"success": false, "message": "Both name and date of birth are incorrect"}),
        ),
    ];

    for (body, expected) in cases {
        let (status, json) = send(&t.app, json_request("POST", "/api/validate", body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, expected);
    }
}

#[tokio::test]
async fn test_validate_success_survives_broken_relay() {
    let t = create_test_app();

    let (status, json) = send(
        &t.app,
        json_request(
            "POST",
            "/api/validate",
            json!({"name": "Zubiyah", "dob": "2003-04-17"}),
        ),
    )
    .await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({"success": true}));
    assert_eq!(t.relay.attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_validate_missing_dob() {
    let t = create_test_app();

    let (status, json) = send(
        &t.app,
        json_request("POST", "/api/validate", json!({"name": "Zubiyah"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn test_validate_malformed_json() {
    let t = create_test_app();

    let response = t
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/validate")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn test_validate_wrong_field_type() {
    let t = create_test_app();

    let (status, json) = send(
        &t.app,
        json_request("POST", "/api/validate", json!({"name": 5, "dob": "2003-04-17"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json, json!({"success": false, "message": "Invalid request body"}));
}

#[tokio::test]
async fn test_validate_rate_limited_after_max() {
    let t = create_test_app();
    let body = json!({"name": "Someone", "dob": "1999-01-01"});

    for _ in 0..5 {
        let (status, _) = send(&t.app, json_request("POST", "/api/validate", body.clone())).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, json) = send(&t.app, json_request("POST", "/api/validate", body)).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        json,
        json!({"success": false, "message": "Too many validation attempts, please try again later"})
    );
}

#[tokio::test]
async fn test_rotated_forwarded_for_is_still_limited() {
    let t = create_test_app();
    let mut admitted = 0;

    for i in 0..50 {
        let mut request = json_request(
            "POST",
            "/api/validate",
            json!({"name": "Someone", "dob": "1999-01-01"}),
        );
        request.headers_mut().insert(
            "x-forwarded-for",
            format!("198.18.0.{}", i).parse().unwrap(),
        );
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 44], 51000))));

        let (status, _) = send(&t.app, request).await;
        if status == StatusCode::OK {
            admitted += 1;
        }
    }

    assert_eq!(admitted, 5);
}

#[tokio::test]
async fn test_rate_limit_only_applies_to_validate() {
    let t = create_test_app();

    for i in 0..8 {
        let (status, _) = send(
            &t.app,
            json_request("POST", "/api/submit", json!({"additionalInfo": format!("note {}", i)})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
}

// == Submit / Responses Endpoint Tests ==

#[tokio::test]
async fn test_submit_then_list_newest_first() {
    let t = create_test_app();

    let (status, json) = send(
        &t.app,
        json_request("POST", "/api/submit", json!({"additionalInfo": "first"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json,
        json!({"success": true, "message": "Response submitted successfully"})
    );

    send(
        &t.app,
        json_request("POST", "/api/submit", json!({"additionalInfo": "  second  "})),
    )
    .await;

    let (status, json) = send(&t.app, empty_request("GET", "/api/responses")).await;
    assert_eq!(status, StatusCode::OK);
    let listed = json.as_array().unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0]["additionalInfo"], "second");
    assert_eq!(listed[1]["additionalInfo"], "first");
    assert!(listed[0].get("createdAt").is_some());
    assert!(listed[0].get("id").is_some());
}

#[tokio::test]
async fn test_submit_wrong_field_type() {
    let t = create_test_app();

    let (status, json) = send(
        &t.app,
        json_request("POST", "/api/submit", json!({"additionalInfo": 42})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json, json!({"success": false, "message": "Invalid request body"}));
}

#[tokio::test]
async fn test_submit_empty_message_rejected() {
    let t = create_test_app();

    let (status, json) = send(
        &t.app,
        json_request("POST", "/api/submit", json!({"additionalInfo": "   "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);

    let (_, json) = send(&t.app, empty_request("GET", "/api/responses")).await;
    assert_eq!(json, json!([]));
}

// == Track Endpoint Tests ==

#[tokio::test]
async fn test_track_record_and_list() {
    let t = create_test_app();

    let (status, json) = send(
        &t.app,
        json_request("POST", "/api/track", visit("landing", "2026-10-16T10:00:00Z")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert!(!json["data"]["id"].as_str().unwrap().is_empty());

    send(
        &t.app,
        json_request("POST", "/api/track", visit("thanks", "2026-10-16T11:00:00Z")),
    )
    .await;

    let (status, json) = send(&t.app, empty_request("GET", "/api/track")).await;
    assert_eq!(status, StatusCode::OK);
    let pages: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["page"].as_str().unwrap())
        .collect();
    assert_eq!(pages, vec!["thanks", "landing"]);
}

#[tokio::test]
async fn test_track_update_and_delete() {
    let t = create_test_app();

    let (_, json) = send(
        &t.app,
        json_request("POST", "/api/track", visit("landing", "2026-10-16T10:00:00Z")),
    )
    .await;
    let id = json["data"]["id"].as_str().unwrap().to_string();

    let mut changed = visit("questions", "2026-10-16T10:10:00Z");
    changed["progression"] = json!({"landing": true, "questions": true, "lastPage": "questions"});
    let (status, json) = send(
        &t.app,
        json_request("PUT", &format!("/api/track/{}", id), changed),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["id"], id.as_str());
    assert_eq!(json["data"]["progression"]["lastPage"], "questions");

    let (status, json) = send(&t.app, empty_request("DELETE", &format!("/api/track/{}", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({"success": true}));

    let (status, json) = send(&t.app, empty_request("DELETE", &format!("/api/track/{}", id))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["message"], "Entry not found");
}

#[tokio::test]
async fn test_track_update_unknown_id() {
    let t = create_test_app();

    let (status, _) = send(
        &t.app,
        json_request(
            "PUT",
            "/api/track/does-not-exist",
            visit("landing", "2026-10-16T10:00:00Z"),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_track_delete_all() {
    let t = create_test_app();

    for page in ["landing", "message", "thanks"] {
        send(
            &t.app,
            json_request("POST", "/api/track", visit(page, "2026-10-16T10:00:00Z")),
        )
        .await;
    }

    let (status, json) = send(&t.app, empty_request("DELETE", "/api/track")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({"success": true}));

    let (_, json) = send(&t.app, empty_request("GET", "/api/track")).await;
    assert_eq!(json, json!([]));
}

#[tokio::test]
async fn test_track_missing_fields() {
    let t = create_test_app();

    let (status, json) = send(&t.app, json_request("POST", "/api/track", json!({}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json, json!({"success": false, "message": "Invalid request body"}));
}

#[tokio::test]
async fn test_track_duplicate_id_rejected() {
    let t = create_test_app();
    let mut entry = visit("landing", "2026-10-16T10:00:00Z");
    entry["id"] = json!("client-1");

    let (status, _) = send(&t.app, json_request("POST", "/api/track", entry.clone())).await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = send(&t.app, json_request("POST", "/api/track", entry)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);

    let (_, json) = send(&t.app, empty_request("GET", "/api/track")).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_track_requires_page() {
    let t = create_test_app();

    let (status, _) = send(
        &t.app,
        json_request("POST", "/api/track", json!({"page": "", "timestamp": "2026-10-16T10:00:00Z"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}
