//! Router tests against a mocked Mux API.

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vgen_api::{create_router, ApiConfig, AppState, ReadinessMode};
use vgen_models::AssetId;
use vgen_mux::{compute_signature, format_signature_header, MuxClient, MuxConfig};
use vgen_tracker::PollConfig;

const SECRET: &str = "whsec_test";

fn state_with(config: ApiConfig, mux_url: &str) -> AppState {
    let mux = MuxClient::new(
        MuxConfig::new(mux_url, "token-id", "token-secret")
            .with_retry_base_delay(Duration::from_millis(1)),
    )
    .unwrap();
    AppState::with_mux_client(config, mux)
}

fn webhook_state() -> AppState {
    state_with(
        ApiConfig::default()
            .with_webhook_secret(SECRET)
            .with_readiness_mode(ReadinessMode::Webhook),
        "http://127.0.0.1:9",
    )
}

fn signed_webhook(payload: &Value, secret: &str) -> Request<Body> {
    let body = payload.to_string();
    let timestamp = chrono::Utc::now().timestamp();
    let signature = compute_signature(body.as_bytes(), timestamp, secret).unwrap();

    Request::builder()
        .method("POST")
        .uri("/api/mux-webhook")
        .header("content-type", "application/json")
        .header("mux-signature", format_signature_header(timestamp, &signature))
        .body(Body::from(body))
        .unwrap()
}

fn post(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

async fn wait_until_registered(state: &AppState, asset_id: &str) {
    let asset_id = AssetId::from(asset_id);
    for _ in 0..200 {
        if state.tracker.is_waiting(&asset_id) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("waiter for {} never registered", asset_id);
}

fn ready_event(asset_id: &str, playback_id: &str) -> Value {
    json!({
        "type": "video.asset.ready",
        "data": {
            "id": asset_id,
            "status": "ready",
            "playback_ids": [{ "id": playback_id, "policy": "public" }]
        }
    })
}

#[tokio::test]
async fn test_health() {
    let app = create_router(webhook_state(), None);
    let (status, body) = send(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_ready_reports_tracker_stats() {
    let state = webhook_state();
    let app = create_router(state.clone(), None);

    let (status, _) = send(&app, signed_webhook(&ready_event("a1", "pb_1"), SECRET)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, get("/ready")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["readiness_mode"], "webhook");
    assert_eq!(body["tracker"]["cached_events"], 1);
    assert_eq!(body["tracker"]["pending_waiters"], 0);
}

#[tokio::test]
async fn test_ready_degraded_without_webhook_secret() {
    let state = state_with(
        ApiConfig::default().with_readiness_mode(ReadinessMode::Webhook),
        "http://127.0.0.1:9",
    );
    let app = create_router(state, None);

    let (status, body) = send(&app, get("/ready")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "degraded");
}

#[tokio::test]
async fn test_webhook_without_secret_is_server_error() {
    let state = state_with(ApiConfig::default(), "http://127.0.0.1:9");
    let app = create_router(state, None);

    let (status, _) = send(&app, signed_webhook(&ready_event("a1", "pb_1"), SECRET)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_webhook_with_bad_signature_is_rejected() {
    let state = webhook_state();
    let app = create_router(state.clone(), None);

    let (status, body) = send(&app, signed_webhook(&ready_event("a1", "pb_1"), "wrong")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_signature");
    assert_eq!(state.tracker.stats().cached_events, 0);

    let unsigned = Request::builder()
        .method("POST")
        .uri("/api/mux-webhook")
        .body(Body::from(ready_event("a1", "pb_1").to_string()))
        .unwrap();
    let (status, _) = send(&app, unsigned).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_webhook_without_asset_id_is_acknowledged() {
    let state = webhook_state();
    let app = create_router(state.clone(), None);

    let payload = json!({ "type": "video.asset.ready", "data": { "status": "ready" } });
    let (status, body) = send(&app, signed_webhook(&payload, SECRET)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "received": true }));
    assert_eq!(state.tracker.stats().cached_events, 0);
}

#[tokio::test]
async fn test_unrelated_webhook_is_ignored() {
    let state = webhook_state();
    let app = create_router(state.clone(), None);

    let payload = json!({ "type": "video.upload.created", "data": { "id": "u1" } });
    let (status, body) = send(&app, signed_webhook(&payload, SECRET)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["received"], true);
    assert_eq!(state.tracker.stats().cached_events, 0);
}

#[tokio::test]
async fn test_event_before_wait_resolves_immediately() {
    let app = create_router(webhook_state(), None);

    send(&app, signed_webhook(&ready_event("a1", "pb_1"), SECRET)).await;
    let (status, body) = send(&app, post("/api/assets/a1/wait?timeout_secs=5")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["asset_id"], "a1");
    assert_eq!(body["playback_id"], "pb_1");
    assert_eq!(body["stream_url"], "https://stream.mux.com/pb_1.m3u8");
}

#[tokio::test]
async fn test_padded_ids_match_the_same_asset() {
    let app = create_router(webhook_state(), None);

    send(&app, signed_webhook(&ready_event(" a7 ", "pb_7"), SECRET)).await;
    let (status, body) = send(&app, post("/api/assets/%20a7/wait?timeout_secs=1")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["asset_id"], "a7");
}

#[tokio::test]
async fn test_wait_then_webhook_resolves_waiter() {
    let state = webhook_state();
    let app = create_router(state.clone(), None);

    let waiter = {
        let app = app.clone();
        tokio::spawn(async move { send(&app, post("/api/assets/a2/wait?timeout_secs=5")).await })
    };
    wait_until_registered(&state, "a2").await;

    let (status, _) = send(&app, signed_webhook(&ready_event("a2", "pb_2"), SECRET)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = waiter.await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["playback_id"], "pb_2");
    assert_eq!(state.tracker.stats().pending_waiters, 0);
}

#[tokio::test]
async fn test_errored_asset_maps_to_bad_gateway() {
    let app = create_router(webhook_state(), None);

    let payload = json!({
        "type": "video.asset.errored",
        "data": {
            "id": "a3",
            "status": "errored",
            "errors": { "type": "invalid_input", "messages": ["unsupported container"] }
        }
    });
    send(&app, signed_webhook(&payload, SECRET)).await;

    let (status, body) = send(&app, post("/api/assets/a3/wait")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "asset_errored");
    assert!(body["detail"]
        .as_str()
        .unwrap()
        .contains("unsupported container"));
}

#[tokio::test]
async fn test_second_concurrent_wait_conflicts() {
    let state = webhook_state();
    let app = create_router(state.clone(), None);

    let first = {
        let app = app.clone();
        tokio::spawn(async move { send(&app, post("/api/assets/a4/wait?timeout_secs=30")).await })
    };
    wait_until_registered(&state, "a4").await;

    let (status, body) = send(&app, post("/api/assets/a4/wait?timeout_secs=30")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "already_waiting");

    send(&app, signed_webhook(&ready_event("a4", "pb_4"), SECRET)).await;
    let (status, _) = first.await.unwrap();
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_wait_times_out() {
    let state = webhook_state();
    let app = create_router(state.clone(), None);

    let (status, body) = send(&app, post("/api/assets/a5/wait?timeout_secs=1")).await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["code"], "wait_timed_out");
    assert!(!state.tracker.is_waiting(&AssetId::from("a5")));

    // A late event is kept for the next waiter.
    send(&app, signed_webhook(&ready_event("a5", "pb_5"), SECRET)).await;
    let (status, _) = send(&app, post("/api/assets/a5/wait?timeout_secs=1")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_zero_timeout_is_rejected() {
    let app = create_router(webhook_state(), None);
    let (status, _) = send(&app, post("/api/assets/a6/wait?timeout_secs=0")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_polling_mode_wait() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/video/v1/assets/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "id": "p1", "status": "preparing" }
        })))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/video/v1/assets/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "id": "p1", "status": "ready", "playback_ids": [{ "id": "pb_p1" }] }
        })))
        .mount(&server)
        .await;

    let mut config = ApiConfig::default().with_readiness_mode(ReadinessMode::Polling);
    config.poll = PollConfig::new(Duration::from_millis(10), Duration::from_secs(5));
    let app = create_router(state_with(config, &server.uri()), None);

    let (status, body) = send(&app, post("/api/assets/p1/wait")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["playback_id"], "pb_p1");
}

#[tokio::test]
async fn test_asset_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/video/v1/assets/s1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "id": "s1", "status": "ready", "playback_ids": [{ "id": "pb_s1" }] }
        })))
        .mount(&server)
        .await;

    let app = create_router(state_with(ApiConfig::default(), &server.uri()), None);

    let (status, body) = send(&app, get("/api/asset-status?id=s1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "id": "s1",
            "status": "ready",
            "ready": true,
            "playback_id": "pb_s1",
            "video_url": "https://stream.mux.com/pb_s1.m3u8"
        })
    );

    let (status, _) = send(&app, get("/api/asset-status")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_asset_status_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/video/v1/assets/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let app = create_router(state_with(ApiConfig::default(), &server.uri()), None);
    let (status, _) = send(&app, get("/api/asset-status?id=missing")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_asset() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/video/v1/assets"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": { "id": "new1", "status": "preparing" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let app = create_router(state_with(ApiConfig::default(), &server.uri()), None);

    let request = Request::builder()
        .method("POST")
        .uri("/api/assets")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "source_url": "https://cdn.example.com/clip.mp4" }).to_string(),
        ))
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({ "asset_id": "new1", "status": "preparing" }));
}

#[tokio::test]
async fn test_create_asset_rejects_invalid_url() {
    let app = create_router(webhook_state(), None);

    let request = Request::builder()
        .method("POST")
        .uri("/api/assets")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "source_url": "file:///etc/passwd" }).to_string()))
        .unwrap();
    let (status, _) = send(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = create_router(webhook_state(), None);

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "req-123")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.headers()["x-request-id"], "req-123");
}
