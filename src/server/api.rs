//! Axum handlers for `/api/*` routes.
//!
//! Each handler validates its input, delegates to the exporter or the
//! provider, and maps failures to the wire contract: validation problems are
//! 400 with the message in the `error` field, everything else is a 500 with
//! a generic body — detail goes to the log, never to the client.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use super::AppState;
use crate::error::AppError;
use crate::export;

// ── Request / response types ──────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct ExportRequest {
    #[serde(rename = "caseId")]
    case_id: Option<String>,
    #[serde(default)]
    notes: Vec<String>,
}

#[derive(Deserialize)]
pub(super) struct AskRequest {
    question: Option<String>,
}

#[derive(Serialize)]
struct AskResponse {
    #[serde(rename = "answerText")]
    answer_text: String,
    #[serde(rename = "audioBase64", skip_serializing_if = "Option::is_none")]
    audio_base64: Option<String>,
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Build a JSON error response body.
fn json_error(msg: impl std::fmt::Display) -> Json<serde_json::Value> {
    Json(json!({ "error": format!("{msg}") }))
}

// ── Handlers ──────────────────────────────────────────────────────────────────

/// POST /api/session-notes/export
pub(super) async fn export(
    State(state): State<AppState>,
    Json(req): Json<ExportRequest>,
) -> Response {
    if req.notes.is_empty() {
        return (StatusCode::BAD_REQUEST, json_error("No notes provided")).into_response();
    }

    let store = state.store.clone();
    // Document serialization and the store write are blocking.
    let result = tokio::task::spawn_blocking(move || {
        export::export_notes(store.as_ref(), req.case_id.as_deref(), &req.notes)
    })
    .await;

    match result {
        Ok(Ok(receipt)) => {
            (StatusCode::OK, Json(json!({ "downloadUrl": receipt.download_url })))
                .into_response()
        }
        Ok(Err(AppError::Validation(msg))) => {
            (StatusCode::BAD_REQUEST, json_error(msg)).into_response()
        }
        Ok(Err(e)) => {
            warn!("session notes export failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                json_error("Server error generating document"),
            )
                .into_response()
        }
        Err(e) => {
            warn!("export task panicked: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                json_error("Server error generating document"),
            )
                .into_response()
        }
    }
}

/// POST /api/ask
pub(super) async fn ask(State(state): State<AppState>, Json(req): Json<AskRequest>) -> Response {
    let question = match req.question.as_deref() {
        Some(q) if !q.is_empty() => q,
        _ => {
            return (StatusCode::BAD_REQUEST, json_error("No question provided"))
                .into_response();
        }
    };

    let answer_text = match state.provider.answer(question).await {
        Ok(text) => text,
        Err(e) => {
            warn!("question answering failed: {e}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                json_error("Server error answering question"),
            )
                .into_response();
        }
    };

    // Synthesis runs only after the answer resolved, never concurrently.
    let audio_base64 = if state.speech.enabled {
        match state.provider.synthesize(&answer_text).await {
            Ok(bytes) => Some(BASE64.encode(bytes)),
            Err(e) if state.speech.require_audio => {
                warn!("speech synthesis failed (audio required): {e}");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json_error("Server error answering question"),
                )
                    .into_response();
            }
            Err(e) => {
                warn!("speech synthesis failed, returning text only: {e}");
                None
            }
        }
    } else {
        None
    };

    (StatusCode::OK, Json(AskResponse { answer_text, audio_base64 })).into_response()
}
