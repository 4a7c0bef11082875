//! Axum-based HTTP server — API endpoints under `/api/`, the notes download
//! route under `/notes/`, and a static-file fallback for the public asset
//! root.
//!
//! Handler dependencies are injected through [`AppState`] — no module-level
//! singletons. The [`CancellationToken`] passed to [`serve`] is wired to
//! axum's graceful shutdown.
//!
//! ## URL layout
//!
//! ```text
//! POST /api/session-notes/export
//! POST /api/ask
//! GET  /notes/{*filename}
//! GET  /*                         → static files under the public root
//! ```

mod api;
mod files;

use std::{path::Path, sync::Arc};

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::services::ServeDir;
use tracing::info;

use crate::error::AppError;
use crate::gateway::TutorProvider;
use crate::storage::NotesStore;

// ── Shared request state ──────────────────────────────────────────────────────

/// Speech behavior for `/api/ask`, resolved from `[speech]` config.
#[derive(Debug, Clone, Copy)]
pub struct SpeechPolicy {
    /// Synthesize audio for every answered question.
    pub enabled: bool,
    /// Fail the whole request when synthesis fails instead of returning the
    /// answer text alone.
    pub require_audio: bool,
}

/// Router state injected into every handler via [`axum::extract::State`].
///
/// Cheap to clone — the provider and store are reference-counted.
#[derive(Clone)]
pub struct AppState {
    pub provider: TutorProvider,
    pub store: Arc<dyn NotesStore>,
    pub speech: SpeechPolicy,
}

// ── Router ────────────────────────────────────────────────────────────────────

/// Build the application router. Anything not matched by the API or notes
/// routes falls through to static files under `public_dir`.
pub fn build_router(state: AppState, public_dir: &Path) -> Router {
    Router::new()
        .route("/api/session-notes/export", post(api::export))
        .route("/api/ask", post(api::ask))
        .route("/notes/{*filename}", get(files::download))
        .fallback_service(ServeDir::new(public_dir))
        .with_state(state)
}

// ── Server loop ───────────────────────────────────────────────────────────────

/// Bind `bind_addr` and serve `router` until `shutdown` is cancelled.
pub async fn serve(
    bind_addr: &str,
    router: Router,
    shutdown: CancellationToken,
) -> Result<(), AppError> {
    let listener = TcpListener::bind(bind_addr)
        .await
        .map_err(|e| AppError::Server(format!("bind failed on {bind_addr}: {e}")))?;

    info!(%bind_addr, "server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| AppError::Server(format!("server error: {e}")))?;

    info!("server shut down");
    Ok(())
}
