//! Integration tests for the radar HTTP endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server, except the last one, which goes through
//! `spawn_observer` on an ephemeral port.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use liveradar_core::maps::Background;
use liveradar_core::publisher::SnapshotPublisher;
use liveradar_observer::router::build_router;
use liveradar_observer::server::ServerConfig;
use liveradar_observer::startup::spawn_observer;
use liveradar_observer::state::AppState;
use liveradar_types::{BombMarker, PlayerId, PlayerMarker, Snapshot, Team};
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tower::ServiceExt;

fn empty_state() -> Arc<AppState> {
    let publisher = Arc::new(SnapshotPublisher::new());
    let background = Background::placeholder().unwrap();
    Arc::new(AppState::new(publisher, &background, "de_mirage"))
}

fn marker(id: i32, team: Team, x: f64, y: f64) -> PlayerMarker {
    PlayerMarker {
        name: format!("player{id}"),
        health: 100,
        team,
        is_alive: true,
        user_id: PlayerId(id),
        x,
        y,
    }
}

fn populated_state() -> Arc<AppState> {
    let state = empty_state();
    state.publisher.publish(Snapshot {
        players: vec![
            marker(3, Team::Terrorists, 10.0, 20.0),
            marker(7, Team::Terrorists, 30.0, 40.0),
            marker(1, Team::CounterTerrorists, 50.0, 60.0),
        ],
        bomb: Some(BombMarker { x: 12.5, y: 87.5 }),
        sequence: 42,
        tick: 1337,
        published_at: None,
    });
    state
}

async fn get(state: Arc<AppState>, uri: &str) -> axum::response::Response {
    build_router(state)
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_index_returns_html() {
    let response = get(empty_state(), "/").await;
    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(content_type.contains("text/html"));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("/data"));
    assert!(html.contains("/map"));
}

#[tokio::test]
async fn test_data_before_first_frame_is_empty() {
    let response = get(empty_state(), "/data").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json, serde_json::json!({"players": [], "bomb": null}));
}

#[tokio::test]
async fn test_missing_recording_keeps_serving_empty_snapshot() {
    use liveradar_core::ingest::{IngestIntervals, ingest_recording};
    use liveradar_core::projection::{MapProjection, MapTransform, Resolution};

    let state = empty_state();
    let publisher = Arc::clone(&state.publisher);
    let projection = MapProjection::new("de_mirage", MapTransform::IDENTITY, Resolution::FALLBACK);
    // Never joined: the thread waits for a file that is never created.
    std::thread::spawn(move || {
        let _ = ingest_recording(
            std::path::Path::new("/nonexistent/liveradar/never.jsonl"),
            &projection,
            &publisher,
            &IngestIntervals::immediate(),
        );
    });

    for _ in 0..5 {
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        let json = body_to_json(get(Arc::clone(&state), "/data").await.into_body()).await;
        assert_eq!(json, serde_json::json!({"players": [], "bomb": null}));
    }
    assert_eq!(state.publisher.published_count(), 0);
}

#[tokio::test]
async fn test_data_headers() {
    let response = get(empty_state(), "/data").await;
    let headers = response.headers();
    assert_eq!(headers.get("content-type").unwrap(), "application/json");
    assert_eq!(headers.get("access-control-allow-origin").unwrap(), "*");
}

#[tokio::test]
async fn test_data_serves_published_snapshot() {
    let response = get(populated_state(), "/data").await;
    let json = body_to_json(response.into_body()).await;

    let players = json["players"].as_array().unwrap();
    assert_eq!(players.len(), 3);
    assert_eq!(players[0]["userId"], 3);
    assert_eq!(players[0]["team"], 2);
    assert_eq!(players[0]["isAlive"], true);
    assert_eq!(players[0]["name"], "player3");
    assert_eq!(players[0]["x"], 10.0);
    assert_eq!(players[2]["userId"], 1);
    assert_eq!(json["bomb"], serde_json::json!({"x": 12.5, "y": 87.5}));

    // Internal bookkeeping stays off the wire.
    assert!(json.get("sequence").is_none());
    assert!(json.get("tick").is_none());
}

#[tokio::test]
async fn test_map_is_png() {
    let response = get(empty_state(), "/map").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("content-type").unwrap(), "image/png");

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(bytes.starts_with(b"\x89PNG\r\n\x1a\n"));
}

#[tokio::test]
async fn test_players_lists_snapshot_players() {
    let response = get(populated_state(), "/players").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_players_team_filter() {
    let response = get(populated_state(), "/players?team=3").await;
    let json = body_to_json(response.into_body()).await;
    let players = json.as_array().unwrap();
    assert_eq!(players.len(), 1);
    assert_eq!(players[0]["userId"], 1);
}

#[tokio::test]
async fn test_players_invalid_team_is_bad_request() {
    let response = get(populated_state(), "/players?team=1").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], 400);
    assert!(json["error"].as_str().unwrap().contains("team"));
}

#[tokio::test]
async fn test_status_summarizes_one_snapshot() {
    let response = get(populated_state(), "/status").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["sequence"], 42);
    assert_eq!(json["tick"], 1337);
    assert_eq!(json["players"], 3);
    assert_eq!(json["bomb"], true);
    assert_eq!(json["map"], "de_mirage");
    assert!(json["publishedAt"].is_string());
    assert_eq!(json["highlight"]["version"], 0);
}

#[tokio::test]
async fn test_status_before_first_frame() {
    let json = body_to_json(get(empty_state(), "/status").await.into_body()).await;
    assert_eq!(json["sequence"], 0);
    assert!(json["publishedAt"].is_null());
    assert_eq!(json["bomb"], false);
}

#[tokio::test]
async fn test_select_then_highlight() {
    let state = populated_state();

    let response = get(Arc::clone(&state), "/select?id=7").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json, serde_json::json!({"userId": 7, "version": 1}));

    let json = body_to_json(get(Arc::clone(&state), "/highlight").await.into_body()).await;
    assert_eq!(json["userId"], 7);
    assert_eq!(json["version"], 1);
}

#[tokio::test]
async fn test_select_by_post() {
    let state = empty_state();
    let response = build_router(Arc::clone(&state))
        .oneshot(
            Request::post("/select?id=3")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(state.publisher.highlight().user_id, Some(PlayerId(3)));
}

#[tokio::test]
async fn test_select_invalid_or_missing_id_clears() {
    let state = populated_state();
    get(Arc::clone(&state), "/select?id=7").await;

    let json = body_to_json(get(Arc::clone(&state), "/select?id=abc").await.into_body()).await;
    assert!(json["userId"].is_null());
    assert_eq!(json["version"], 2);

    get(Arc::clone(&state), "/select?id=7").await;
    let json = body_to_json(get(Arc::clone(&state), "/select").await.into_body()).await;
    assert!(json["userId"].is_null());
    assert_eq!(json["version"], 4);
}

#[tokio::test]
async fn test_unknown_path_is_json_404() {
    let response = get(empty_state(), "/nope").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], 404);
}

#[tokio::test]
async fn test_spawned_server_answers_over_tcp() {
    let config = ServerConfig {
        host: String::from("127.0.0.1"),
        port: 0,
    };
    let handle = spawn_observer(&config, populated_state()).await.unwrap();

    let mut stream = tokio::net::TcpStream::connect(handle.addr).await.unwrap();
    stream
        .write_all(b"GET /data HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();

    assert!(response.starts_with("HTTP/1.1 200"));
    assert!(response.contains("\"userId\":3"));

    handle.task.abort();
}

#[tokio::test]
async fn test_spawn_rejects_invalid_address() {
    let config = ServerConfig {
        host: String::from("not an address"),
        port: 8080,
    };
    assert!(spawn_observer(&config, empty_state()).await.is_err());
}
