//! Integration tests for songlib-server API endpoints
//!
//! Runs the full router against a temporary SQLite catalog with a canned
//! metadata source in place of the remote service.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use songlib_common::config::DatabaseConfig;
use songlib_common::{Song, SongDetailed};
use songlib_server::db::{self, SongStore};
use songlib_server::metadata::{MetadataError, MetadataSource};
use songlib_server::{build_router, AppState, CatalogService};
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot` method

/// Canned metadata: "Unknown" is rejected, "Offline" is unreachable
struct CannedMetadata;

#[async_trait]
impl MetadataSource for CannedMetadata {
    async fn fetch(&self, song: &Song) -> Result<SongDetailed, MetadataError> {
        match song.name.as_str() {
            "Unknown" => Err(MetadataError::RemoteBadRequest("no such song".into())),
            "Offline" => Err(MetadataError::Transport("connection refused".into())),
            "Slow" => Err(MetadataError::Timeout(Duration::from_secs(30))),
            _ => Ok(SongDetailed::new(
                song.clone(),
                "16.07.2006",
                "first couplet\nsecond couplet\nthird couplet\nfourth couplet",
                "https://example.com/song",
            )),
        }
    }
}

/// Test helper: app over a fresh database; keep the TempDir alive
async fn setup_app() -> (Router, TempDir) {
    let dir = TempDir::new().unwrap();
    let config = DatabaseConfig {
        path: dir.path().join("songlib.db"),
        max_connections: 4,
        operation_timeout_secs: 5,
    };
    let pool = db::connect(&config).await.unwrap();
    db::ensure_schema(&pool).await.unwrap();

    let store = SongStore::new(pool, config.operation_timeout());
    let catalog = CatalogService::new(Arc::new(store), Arc::new(CannedMetadata));
    (build_router(AppState::new(catalog), "1"), dir)
}

fn test_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

async fn add(app: &Router, group: &str, name: &str) -> StatusCode {
    let request = json_request("PUT", "/api/v1/lib/add", json!({ "group": group, "name": name }));
    app.clone().oneshot(request).await.unwrap().status()
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _dir) = setup_app().await;

    let response = app.oneshot(test_request("GET", "/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "songlib-server");
    assert!(body["version"].is_string());
}

// =============================================================================
// Add
// =============================================================================

#[tokio::test]
async fn test_add_song_returns_enriched_record() {
    let (app, _dir) = setup_app().await;

    let request = json_request(
        "PUT",
        "/api/v1/lib/add",
        json!({ "group": "Muse", "name": "Supermassive Black Hole" }),
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["group"], "Muse");
    assert_eq!(body["name"], "Supermassive Black Hole");
    assert_eq!(body["release_date"], "16.07.2006");
    assert_eq!(body["link"], "https://example.com/song");
}

#[tokio::test]
async fn test_add_duplicate_conflicts() {
    let (app, _dir) = setup_app().await;

    assert_eq!(add(&app, "Muse", "Hysteria").await, StatusCode::CREATED);
    assert_eq!(add(&app, "Muse", "Hysteria").await, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_add_blank_identity_rejected() {
    let (app, _dir) = setup_app().await;
    assert_eq!(add(&app, "", "Hysteria").await, StatusCode::BAD_REQUEST);
    assert_eq!(add(&app, "Muse", "  ").await, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_add_metadata_failures() {
    let (app, _dir) = setup_app().await;

    let request = json_request("PUT", "/api/v1/lib/add", json!({ "group": "Muse", "name": "Unknown" }));
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "METADATA_BAD_REQUEST");

    assert_eq!(add(&app, "Muse", "Offline").await, StatusCode::BAD_GATEWAY);
    assert_eq!(add(&app, "Muse", "Slow").await, StatusCode::GATEWAY_TIMEOUT);

    // Nothing was stored for the failed lookups
    let response = app
        .oneshot(test_request("GET", "/api/v1/lib?limit=10"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body, json!([]));
}

// =============================================================================
// Remove
// =============================================================================

#[tokio::test]
async fn test_remove_song() {
    let (app, _dir) = setup_app().await;
    add(&app, "Muse", "Hysteria").await;

    let uri = "/api/v1/lib/remove?name=Hysteria&group=Muse";
    let response = app.clone().oneshot(test_request("DELETE", uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.oneshot(test_request("DELETE", uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_remove_requires_identity() {
    let (app, _dir) = setup_app().await;

    let response = app
        .oneshot(test_request("DELETE", "/api/v1/lib/remove?name=Hysteria"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// List
// =============================================================================

#[tokio::test]
async fn test_list_paginates_and_filters() {
    let (app, _dir) = setup_app().await;
    for (group, name) in [
        ("Muse", "Hysteria"),
        ("Muse", "Starlight"),
        ("Queen", "Innuendo"),
    ] {
        assert_eq!(add(&app, group, name).await, StatusCode::CREATED);
    }

    let response = app
        .clone()
        .oneshot(test_request("GET", "/api/v1/lib?page=1&limit=2"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], "Innuendo");

    let response = app
        .clone()
        .oneshot(test_request("GET", "/api/v1/lib?limit=10&group=Muse&name=Starlight"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["name"], "Starlight");

    // Empty filter values are ignored
    let response = app
        .oneshot(test_request("GET", "/api/v1/lib?limit=10&group="))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_list_rejects_bad_parameters() {
    let (app, _dir) = setup_app().await;

    for uri in [
        "/api/v1/lib",
        "/api/v1/lib?limit=0",
        "/api/v1/lib?limit=abc",
        "/api/v1/lib?limit=5&page=-1",
    ] {
        let response = app.clone().oneshot(test_request("GET", uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
    }

    let response = app
        .oneshot(test_request("GET", "/api/v1/lib?limit=5&name=x%3B%20DROP%20TABLE%20songs"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "BAD_FILTER");
}

// =============================================================================
// Lyrics
// =============================================================================

#[tokio::test]
async fn test_lyrics_pages() {
    let (app, _dir) = setup_app().await;
    add(&app, "Muse", "Supermassive Black Hole").await;

    let response = app
        .clone()
        .oneshot(test_request(
            "GET",
            "/api/v1/lib/Muse/Supermassive%20Black%20Hole?page=1&limit=3",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body, json!({ "page": 1, "text": ["fourth couplet"] }));

    let response = app
        .oneshot(test_request("GET", "/api/v1/lib/Muse/Missing?limit=3"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Edit
// =============================================================================

#[tokio::test]
async fn test_edit_song() {
    let (app, _dir) = setup_app().await;
    add(&app, "Muse", "Hysteria").await;

    let edited = json!({
        "group": "Muse",
        "name": "Hysteria",
        "release_date": "01.12.2003",
        "text": "edited only line",
        "link": "https://example.com/hysteria",
    });
    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/v1/lib/edit", edited))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(test_request("GET", "/api/v1/lib?limit=1&name=Hysteria"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body[0]["release_date"], "01.12.2003");
    assert_eq!(body[0]["text"], "edited only line");

    let missing = json!({ "group": "Muse", "name": "Nope", "release_date": "2000" });
    let response = app
        .oneshot(json_request("POST", "/api/v1/lib/edit", missing))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// CORS
// =============================================================================

#[tokio::test]
async fn test_cors_preflight() {
    let (app, _dir) = setup_app().await;

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/v1/lib/add")
        .header(header::ORIGIN, "http://localhost:3000")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PUT")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert!(response.status().is_success());
    let headers = response.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(headers[header::ACCESS_CONTROL_MAX_AGE], "20");
}
