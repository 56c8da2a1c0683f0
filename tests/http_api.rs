mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use common::{dispatcher_with, full_transfer, Outcome, ScriptedEngine};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use ytdlp_web::server::{build_router, files::DownloadFolder, AppState};

fn app(engine: ScriptedEngine, folder: &std::path::Path) -> Router {
    let dispatcher = dispatcher_with(Arc::new(engine));
    build_router(AppState::new(dispatcher, DownloadFolder::new(folder)), None)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    send_raw(app, method, uri, body.map(|b| b.to_string())).await
}

async fn send_raw(app: &Router, method: Method, uri: &str, body: Option<String>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(b) => builder
            .header("content-type", "application/json")
            .body(Body::from(b))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, json)
}

#[tokio::test]
async fn download_then_poll_until_completed() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(ScriptedEngine::new(full_transfer(), Outcome::Ok), dir.path());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/download",
        Some(json!({ "url": "https://videos.test/clip", "format_id": "best" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let task_id = body["task_id"].as_str().expect("task id").to_string();

    let uri = format!("/api/progress/{task_id}");
    let mut progress = Value::Null;
    for _ in 0..200 {
        let (status, body) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        progress = body;
        if progress["status"] == "completed" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    assert_eq!(progress["status"], "completed");
    assert_eq!(progress["progress"], 100.0);
    assert_eq!(progress["downloaded"], 1000);
    assert_eq!(progress["total"], 1000);
    assert_eq!(progress["filename"], "clip.mp4");
    assert!(progress["error"].is_null());
    assert!(progress["logs"].is_array());
}

#[tokio::test]
async fn empty_url_is_a_bad_request() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(ScriptedEngine::new(vec![], Outcome::Ok), dir.path());

    let (status, body) = send(&app, Method::POST, "/api/download", Some(json!({ "url": "" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_REQUEST");
    assert_eq!(body["error"], "please enter a video URL");

    let (status, body) = send(&app, Method::POST, "/api/info", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "please enter a video URL");
}

#[tokio::test]
async fn malformed_bodies_get_json_errors() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(ScriptedEngine::new(vec![], Outcome::Ok), dir.path());

    for raw in ["not json", r#"{"url": 5}"#, r#"{"url": "https://videos.test/x", "audio_only": "yes"}"#] {
        let (status, body) = send_raw(&app, Method::POST, "/api/download", Some(raw.to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {raw}");
        assert_eq!(body["code"], "INVALID_REQUEST", "body {raw}");
        assert!(body["error"].is_string());
    }

    let (status, body) = send_raw(&app, Method::POST, "/api/info", Some("{".to_string())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn null_fields_read_as_unset() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(ScriptedEngine::new(full_transfer(), Outcome::Ok), dir.path());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/download",
        Some(json!({ "url": "https://videos.test/clip", "format_id": null, "audio_only": null })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["task_id"].is_string());
}

#[tokio::test]
async fn unknown_task_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(ScriptedEngine::new(vec![], Outcome::Ok), dir.path());

    let uri = format!("/api/progress/{}", uuid::Uuid::new_v4());
    let (status, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "JOB_NOT_FOUND");

    let (status, _) = send(&app, Method::GET, "/api/progress/not-a-task", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn info_is_projected_for_the_front_end() {
    let dir = tempfile::tempdir().unwrap();
    let engine = ScriptedEngine::new(vec![], Outcome::Ok).with_info(json!({
        "title": "A clip",
        "duration": 12.5,
        "formats": [{ "format_id": "140", "ext": "m4a", "filesize_approx": 2048.0, "acodec": "mp4a" }]
    }));
    let app = app(engine, dir.path());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/info",
        Some(json!({ "url": "https://videos.test/clip" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "A clip");
    assert_eq!(body["uploader"], "Unknown");
    assert_eq!(body["webpage_url"], "https://videos.test/clip");
    assert_eq!(body["formats"][0]["resolution"], "audio only");
    assert_eq!(body["formats"][0]["filesize"], 2048);
    assert_eq!(body["formats"][0]["vcodec"], "none");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/info",
        Some(json!({ "url": "https://videos.test/broken" })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "ENGINE_ERROR");
}

#[tokio::test]
async fn list_and_delete_downloads() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("song.mp3"), b"abc").unwrap();
    let app = app(ScriptedEngine::new(vec![], Outcome::Ok), dir.path());

    let (status, body) = send(&app, Method::GET, "/api/downloads", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["name"], "song.mp3");
    assert_eq!(body[0]["size"], 3);

    let response = app
        .clone()
        .oneshot(Request::get("/download/song.mp3").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-disposition"], "attachment");
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"abc");

    let (status, body) = send(&app, Method::DELETE, "/api/delete/song.mp3", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(!dir.path().join("song.mp3").exists());

    let (status, body) = send(&app, Method::DELETE, "/api/delete/song.mp3", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "FILE_NOT_FOUND");
}
