//! Session-note export — builds a `.docx` from a note list and writes it to
//! the notes store.
//!
//! The document shape is fixed: a Heading 1 title carrying the sanitized
//! case id, one blank paragraph, then one numbered paragraph per note in
//! input order. One new file per call; nothing is ever overwritten or
//! deduplicated.

use std::{
    io::Cursor,
    sync::atomic::{AtomicU64, Ordering},
    time::{SystemTime, UNIX_EPOCH},
};

use docx_rs::{Docx, Paragraph, Run};
use tracing::{debug, info};

use crate::error::AppError;
use crate::storage::NotesStore;

/// Case id used when the client omits one.
pub const DEFAULT_CASE_ID: &str = "lawdio-case";

/// Receipt for a completed export.
#[derive(Debug, Clone)]
pub struct ExportReceipt {
    /// Relative URL the file is retrievable at (`/notes/<filename>`).
    pub download_url: String,
    /// Generated filename inside the notes store.
    pub filename: String,
}

/// Replace every character outside `[A-Za-z0-9-_]` with a hyphen.
/// `None` or an empty string falls back to [`DEFAULT_CASE_ID`].
pub fn sanitize_case_id(raw: Option<&str>) -> String {
    let raw = match raw {
        Some(s) if !s.is_empty() => s,
        _ => DEFAULT_CASE_ID,
    };
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect()
}

/// Epoch-millisecond stamp for filenames, strictly increasing process-wide.
///
/// Returns `max(now_millis, previous + 1)` so two exports landing in the
/// same millisecond still get distinct filenames, while the stamp stays an
/// epoch-millis value whenever the clock is ahead of the counter.
fn next_stamp() -> u64 {
    static LAST: AtomicU64 = AtomicU64::new(0);
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);
    // fetch_update yields the previous value; the stored (returned) stamp is
    // max(now, previous + 1).
    LAST.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
        Some(now.max(last + 1))
    })
    .map(|prev| now.max(prev + 1))
    .unwrap_or(now)
}

/// Serialize the note document to `.docx` bytes.
fn render_docx(safe_case_id: &str, notes: &[String]) -> Result<Vec<u8>, AppError> {
    let mut doc = Docx::new().add_paragraph(
        Paragraph::new()
            .add_run(Run::new().add_text(format!("Lawdio Notes – {safe_case_id}")))
            .style("Heading1"),
    );

    doc = doc.add_paragraph(Paragraph::new());

    for (index, note) in notes.iter().enumerate() {
        doc = doc.add_paragraph(
            Paragraph::new().add_run(Run::new().add_text(format!("{}. {note}", index + 1))),
        );
    }

    let mut buf = Cursor::new(Vec::new());
    doc.build()
        .pack(&mut buf)
        .map_err(|e| AppError::Storage(format!("docx serialization failed: {e}")))?;
    Ok(buf.into_inner())
}

/// Export `notes` under `case_id` into `store`.
///
/// Blocking (document serialization + store write) — handlers call this via
/// `spawn_blocking`. Fails with [`AppError::Validation`] before any side
/// effect when `notes` is empty.
pub fn export_notes(
    store: &dyn NotesStore,
    case_id: Option<&str>,
    notes: &[String],
) -> Result<ExportReceipt, AppError> {
    if notes.is_empty() {
        return Err(AppError::Validation("No notes provided".into()));
    }

    let safe_case_id = sanitize_case_id(case_id);
    let bytes = render_docx(&safe_case_id, notes)?;
    let filename = format!("lawdio-notes-{safe_case_id}-{}.docx", next_stamp());

    debug!(filename = %filename, notes = notes.len(), bytes = bytes.len(), "writing export");
    let download_url = store.put(&filename, &bytes)?;
    info!(%download_url, "session notes exported");

    Ok(ExportReceipt { download_url, filename })
}
