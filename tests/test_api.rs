//! Router-level tests — drive the real router with the dummy provider and an
//! in-memory notes store via `tower::ServiceExt::oneshot`, no socket.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::util::ServiceExt;

use lawdio_server::gateway::{dummy::DummyProvider, TutorProvider};
use lawdio_server::server::{build_router, AppState, SpeechPolicy};
use lawdio_server::storage::{MemStore, NotesStore};

struct TestApp {
    router: Router,
    store: Arc<MemStore>,
    // Held so the public dir outlives the router's ServeDir.
    public: TempDir,
}

fn app_with(speech: SpeechPolicy, speech_fails: bool) -> TestApp {
    let store = Arc::new(MemStore::new());
    let public = tempfile::tempdir().unwrap();
    let state = AppState {
        provider: TutorProvider::Dummy(DummyProvider { speech_fails }),
        store: store.clone(),
        speech,
    };
    let router = build_router(state, public.path());
    TestApp { router, store, public }
}

fn app() -> TestApp {
    app_with(SpeechPolicy { enabled: false, require_audio: false }, false)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

// ── Export ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn export_returns_download_url_and_file_is_served() {
    let app = app();
    let response = app
        .router
        .clone()
        .oneshot(post_json(
            "/api/session-notes/export",
            json!({ "caseId": "My Case/2024!", "notes": ["first", "second"] }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let url = body["downloadUrl"].as_str().unwrap();
    assert!(url.starts_with("/notes/lawdio-notes-My-Case-2024--"));
    assert!(url.ends_with(".docx"));

    // The stored bytes come back byte-for-byte through the download route.
    let response = app.router.clone().oneshot(get(url)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
    );
    let served = body_bytes(response).await;
    let name = url.strip_prefix("/notes/").unwrap();
    assert_eq!(served, app.store.get(name).unwrap().unwrap());
    assert_eq!(&served[..2], b"PK");
}

#[tokio::test]
async fn export_with_empty_notes_is_400_and_writes_nothing() {
    let app = app();
    let response = app
        .router
        .clone()
        .oneshot(post_json("/api/session-notes/export", json!({ "notes": [] })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "No notes provided");
    assert!(app.store.is_empty());
}

#[tokio::test]
async fn export_with_notes_absent_is_400() {
    let app = app();
    let response = app
        .router
        .clone()
        .oneshot(post_json("/api/session-notes/export", json!({ "caseId": "x" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app.store.is_empty());
}

#[tokio::test]
async fn repeated_exports_get_distinct_urls() {
    let app = app();
    let body = json!({ "caseId": "case", "notes": ["only note"] });
    let first = body_json(
        app.router
            .clone()
            .oneshot(post_json("/api/session-notes/export", body.clone()))
            .await
            .unwrap(),
    )
    .await;
    let second = body_json(
        app.router
            .clone()
            .oneshot(post_json("/api/session-notes/export", body))
            .await
            .unwrap(),
    )
    .await;
    assert_ne!(first["downloadUrl"], second["downloadUrl"]);
    assert_eq!(app.store.len(), 2);
}

// ── Ask ───────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn ask_without_question_is_400() {
    let app = app();
    for body in [json!({}), json!({ "question": "" })] {
        let response = app
            .router
            .clone()
            .oneshot(post_json("/api/ask", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "No question provided");
    }
}

#[tokio::test]
async fn ask_returns_answer_without_audio_when_speech_disabled() {
    let app = app();
    let response = app
        .router
        .clone()
        .oneshot(post_json("/api/ask", json!({ "question": "What is tort law?" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let answer = body["answerText"].as_str().unwrap();
    assert!(answer.contains("What is tort law?"));
    assert!(body.get("audioBase64").is_none());
}

#[tokio::test]
async fn ask_with_speech_enabled_carries_audio() {
    let app = app_with(SpeechPolicy { enabled: true, require_audio: false }, false);
    let response = app
        .router
        .clone()
        .oneshot(post_json("/api/ask", json!({ "question": "q" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let answer = body["answerText"].as_str().unwrap().to_string();
    let audio = BASE64.decode(body["audioBase64"].as_str().unwrap()).unwrap();
    assert_eq!(audio, format!("[audio] {answer}").into_bytes());
}

#[tokio::test]
async fn speech_failure_falls_back_to_text_only() {
    let app = app_with(SpeechPolicy { enabled: true, require_audio: false }, true);
    let response = app
        .router
        .clone()
        .oneshot(post_json("/api/ask", json!({ "question": "q" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert!(body["answerText"].as_str().unwrap().contains('q'));
    assert!(body.get("audioBase64").is_none());
}

#[tokio::test]
async fn speech_failure_with_require_audio_fails_whole_request() {
    let app = app_with(SpeechPolicy { enabled: true, require_audio: true }, true);
    let response = app
        .router
        .clone()
        .oneshot(post_json("/api/ask", json!({ "question": "q" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    // Generic body only — no provider detail leaks.
    let body = body_json(response).await;
    assert_eq!(body["error"], "Server error answering question");
    assert!(body.get("answerText").is_none());
}

// ── Downloads & static files ──────────────────────────────────────────────────

#[tokio::test]
async fn unknown_note_is_404() {
    let app = app();
    let response = app
        .router
        .clone()
        .oneshot(get("/notes/lawdio-notes-x-1.docx"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn static_files_are_served_from_public_root() {
    let app = app();
    std::fs::write(app.public.path().join("hello.txt"), b"hi from lawdio").unwrap();

    let response = app.router.clone().oneshot(get("/hello.txt")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"hi from lawdio");

    let response = app.router.clone().oneshot(get("/nope.txt")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
