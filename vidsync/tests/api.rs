//! End-to-end HTTP tests for the vidsync router
//!
//! Runs the full router (CORS, sessions, handlers, SQLite) against a fake
//! upstream with a cookie-keeping test client.

use async_trait::async_trait;
use axum::http::{header, HeaderName, HeaderValue, Method, StatusCode};
use axum_test::{multipart::MultipartForm, TestServer};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;
use vidsync::config::DatabaseConfig;
use vidsync::handlers::{FetchResponse, TokenResponse};
use vidsync::models::{VideoId, VideoMetadata, VideoRecord};
use vidsync::{
    router, storage, AppState, MetadataSource, SessionStore, TokenAuthority, UpstreamError,
    VideoRepository, VidsyncConfig,
};

const VIDEO: &str = "abc12345678";

/// Upstream fake: views grow by one on every fetch
#[derive(Default)]
struct FakeUpstream {
    views: AtomicI64,
    calls: AtomicUsize,
}

#[async_trait]
impl MetadataSource for FakeUpstream {
    async fn fetch(&self, video_id: &VideoId) -> Result<VideoMetadata, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match video_id.as_str() {
            "missing0000" => Err(UpstreamError::NotFound),
            "offline0000" => Err(UpstreamError::Unavailable("connection refused".into())),
            _ => Ok(VideoMetadata {
                video_id: video_id.clone(),
                title: format!("Video {video_id}"),
                views: 100 + self.views.fetch_add(1, Ordering::SeqCst),
                likes: 10,
                comments: 1,
            }),
        }
    }
}

struct Harness {
    server: TestServer,
    upstream: Arc<FakeUpstream>,
}

async fn harness() -> Harness {
    let config = VidsyncConfig {
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        },
        ..VidsyncConfig::default()
    };
    let pool = storage::connect(&config.database).await.unwrap();
    let upstream = Arc::new(FakeUpstream::default());
    let state = AppState::new(
        TokenAuthority::new(SessionStore::new()),
        VideoRepository::new(pool),
        upstream.clone(),
    );
    let app = router(state, &config).unwrap();
    let server = TestServer::builder().save_cookies().build(app).unwrap();
    Harness { server, upstream }
}

async fn token(server: &TestServer) -> String {
    let response = server.get("/csrf").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    response.json::<TokenResponse>().csrf_token
}

async fn list(server: &TestServer) -> Vec<VideoRecord> {
    let response = server.get("/videos").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    response.json::<Vec<VideoRecord>>()
}

#[tokio::test]
async fn test_token_is_stable_within_session() {
    let Harness { server, .. } = harness().await;

    let first = server.get("/csrf").await;
    assert!(first.headers().get(header::SET_COOKIE).is_some());
    let first = first.json::<TokenResponse>().csrf_token;

    let second = server.get("/csrf").await;
    // Cookie is only set when the session is created
    assert!(second.headers().get(header::SET_COOKIE).is_none());
    let second = second.json::<TokenResponse>().csrf_token;

    assert_eq!(first, second);
    assert_eq!(first.len(), 64);
}

#[tokio::test]
async fn test_import_then_empty_secret_rejected() {
    let Harness { server, upstream } = harness().await;
    let secret = token(&server).await;

    let response = server
        .post("/videos/fetch")
        .form(&[("video_id", VIDEO), ("csrf_token", secret.as_str())])
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.json::<FetchResponse>();
    assert!(body.success);
    assert_eq!(body.video_id, VIDEO);
    assert_eq!(body.views, 100);

    let before = list(&server).await;
    assert_eq!(before.len(), 1);

    let response = server
        .post("/videos/fetch")
        .form(&[("video_id", VIDEO), ("csrf_token", "")])
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    let error = response.json::<Value>();
    assert_eq!(error["code"], "csrf_missing");
    assert!(!response.text().contains(&secret));

    // Rejected before reaching upstream or storage
    assert_eq!(upstream.calls.load(Ordering::SeqCst), 1);
    assert_eq!(list(&server).await, before);
}

#[tokio::test]
async fn test_wrong_secret_rejected_without_leaking() {
    let Harness { server, upstream } = harness().await;
    let secret = token(&server).await;
    let wrong = "0".repeat(64);

    let response = server
        .post("/videos/fetch")
        .json(&json!({ "video_id": VIDEO, "csrf_token": wrong }))
        .await;

    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    assert_eq!(response.json::<Value>()["code"], "csrf_invalid");
    assert!(!response.text().contains(&secret));
    assert_eq!(upstream.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_padded_secret_rejected() {
    let Harness { server, upstream } = harness().await;
    let secret = token(&server).await;

    let padded = format!("  {secret}\t");
    let form = server
        .post("/videos/fetch")
        .form(&[("video_id", VIDEO), ("csrf_token", padded.as_str())])
        .await;
    assert_eq!(form.status_code(), StatusCode::FORBIDDEN);
    assert_eq!(form.json::<Value>()["code"], "csrf_invalid");

    let json = server
        .post("/videos/fetch")
        .json(&json!({ "video_id": VIDEO, "csrf_token": format!(" {secret} ") }))
        .await;
    assert_eq!(json.status_code(), StatusCode::FORBIDDEN);
    assert_eq!(json.json::<Value>()["code"], "csrf_invalid");

    assert_eq!(upstream.calls.load(Ordering::SeqCst), 0);
    assert!(list(&server).await.is_empty());
}

#[tokio::test]
async fn test_mutation_without_session_rejected() {
    let Harness { server, upstream } = harness().await;

    let response = server
        .post("/videos/fetch")
        .form(&[("video_id", VIDEO), ("csrf_token", "deadbeef")])
        .await;

    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    assert_eq!(response.json::<Value>()["code"], "session_missing");
    // A failed mutation does not establish a session
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    assert_eq!(upstream.calls.load(Ordering::SeqCst), 0);

    // The regular flow still works afterwards
    let secret = token(&server).await;
    let response = server
        .post("/videos/fetch")
        .form(&[("video_id", VIDEO), ("csrf_token", secret.as_str())])
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_auth_checked_before_validation() {
    let Harness { server, .. } = harness().await;
    let _ = token(&server).await;

    let response = server
        .post("/videos/fetch")
        .form(&[("video_id", "not-an-id"), ("csrf_token", "")])
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_invalid_video_id() {
    let Harness { server, upstream } = harness().await;
    let secret = token(&server).await;

    let response = server
        .post("/videos/fetch")
        .form(&[("video_id", "short"), ("csrf_token", secret.as_str())])
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["code"], "invalid_request");
    assert_eq!(upstream.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_upstream_errors_map_to_status() {
    let Harness { server, .. } = harness().await;
    let secret = token(&server).await;

    let response = server
        .post("/videos/fetch")
        .form(&[("video_id", "missing0000"), ("csrf_token", secret.as_str())])
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let response = server
        .post("/videos/fetch")
        .form(&[("video_id", "offline0000"), ("csrf_token", secret.as_str())])
        .await;
    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json::<Value>()["code"], "upstream_unavailable");

    assert!(list(&server).await.is_empty());
}

#[tokio::test]
async fn test_repeated_refresh_keeps_one_row() {
    let Harness { server, .. } = harness().await;
    let secret = token(&server).await;

    for _ in 0..4 {
        let response = server
            .post("/videos/fetch")
            .form(&[("video_id", VIDEO), ("csrf_token", secret.as_str())])
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
    }

    let videos = list(&server).await;
    assert_eq!(videos.len(), 1);
    assert_eq!(videos[0].views, 103);
}

#[tokio::test]
async fn test_get_single_video() {
    let Harness { server, .. } = harness().await;

    let missing = server.get(&format!("/videos/{VIDEO}")).await;
    assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(missing.json::<Value>()["code"], "not_found");

    let malformed = server.get("/videos/short").await;
    assert_eq!(malformed.status_code(), StatusCode::BAD_REQUEST);

    let secret = token(&server).await;
    server
        .post("/videos/fetch")
        .form(&[("video_id", VIDEO), ("csrf_token", secret.as_str())])
        .await;

    let found = server.get(&format!("/videos/{VIDEO}")).await;
    assert_eq!(found.status_code(), StatusCode::OK);
    let record = found.json::<VideoRecord>();
    assert_eq!(record.video_id, VIDEO);
    assert_eq!(record.views, 100);
}

#[tokio::test]
async fn test_multipart_and_header_token() {
    let Harness { server, .. } = harness().await;
    let secret = token(&server).await;

    let form = MultipartForm::new()
        .add_text("video_id", VIDEO)
        .add_text("csrf_token", secret.clone());
    let response = server.post("/videos/fetch").multipart(form).await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = server
        .post("/videos/delete")
        .add_header(
            HeaderName::from_static("x-csrf-token"),
            HeaderValue::from_str(&secret).unwrap(),
        )
        .json(&json!({ "video_id": VIDEO }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(list(&server).await.is_empty());
}

#[tokio::test]
async fn test_delete_flow() {
    let Harness { server, .. } = harness().await;
    let secret = token(&server).await;

    for id in ["aaaaaaaaaaa", "bbbbbbbbbbb"] {
        server
            .post("/videos/fetch")
            .form(&[("video_id", id), ("csrf_token", secret.as_str())])
            .await;
    }
    let ids: Vec<_> = list(&server).await.into_iter().map(|v| v.video_id).collect();
    assert_eq!(ids, ["bbbbbbbbbbb", "aaaaaaaaaaa"]);

    let response = server
        .post("/videos/delete")
        .form(&[("video_id", "aaaaaaaaaaa"), ("csrf_token", "")])
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    assert_eq!(list(&server).await.len(), 2);

    let response = server
        .post("/videos/delete")
        .form(&[("video_id", ""), ("csrf_token", secret.as_str())])
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let response = server
        .post("/videos/delete")
        .form(&[("video_id", "aaaaaaaaaaa"), ("csrf_token", secret.as_str())])
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>(), json!({ "success": true }));

    let ids: Vec<_> = list(&server).await.into_iter().map(|v| v.video_id).collect();
    assert_eq!(ids, ["bbbbbbbbbbb"]);
}

#[tokio::test]
async fn test_cors_allows_single_origin_with_credentials() {
    let Harness { server, .. } = harness().await;

    let response = server
        .method(Method::OPTIONS, "/videos/fetch")
        .add_header(
            header::ORIGIN,
            HeaderValue::from_static("http://localhost:3000"),
        )
        .add_header(
            header::ACCESS_CONTROL_REQUEST_METHOD,
            HeaderValue::from_static("POST"),
        )
        .await;

    let headers = response.headers();
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "http://localhost:3000"
    );
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
        "true"
    );
    let methods = headers
        .get(header::ACCESS_CONTROL_ALLOW_METHODS)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(methods.contains("POST"));
}

#[tokio::test]
async fn test_list_starts_empty() {
    let Harness { server, .. } = harness().await;
    assert!(list(&server).await.is_empty());
    assert_eq!(server.get("/health").await.text(), "ok");
}
