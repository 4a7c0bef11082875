//! Notes Storage — where exported documents live.
//!
//! [`NotesStore`] is the pluggable backend behind the export route and the
//! `/notes/<filename>` download route. The production backend is
//! [`DirStore`] (a directory on disk, created at startup); tests use
//! [`MemStore`] so nothing touches a real filesystem.
//!
//! Stores are `Send + Sync` and use blocking I/O — handlers call them
//! through `tokio::task::spawn_blocking`.

use std::{
    collections::HashMap,
    fs,
    path::PathBuf,
    sync::Mutex,
};

use crate::error::AppError;

/// URL prefix under which stored files are served.
pub const NOTES_URL_PREFIX: &str = "/notes";

/// Pluggable store for exported note documents.
///
/// `put` writes a new file and returns its download URL (`/notes/<name>`).
/// `get` returns the stored bytes, or `None` for unknown names — including
/// names that fail validation, so a traversal attempt is indistinguishable
/// from a missing file.
pub trait NotesStore: Send + Sync {
    fn put(&self, name: &str, bytes: &[u8]) -> Result<String, AppError>;
    fn get(&self, name: &str) -> Result<Option<Vec<u8>>, AppError>;
}

/// A name is storable/retrievable only if it is non-empty and every
/// character is in `[A-Za-z0-9-_.]`. `..` never forms since `/` is excluded,
/// but a name of only dots is rejected anyway.
pub fn valid_name(name: &str) -> bool {
    !name.is_empty()
        && name.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        && !name.chars().all(|c| c == '.')
}

fn download_url(name: &str) -> String {
    format!("{NOTES_URL_PREFIX}/{name}")
}

// ── Directory-backed store ────────────────────────────────────────────────────

/// Directory-backed store. The directory is created (recursively) at open
/// time so every later `put` can assume it exists.
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, AppError> {
        let root = root.into();
        fs::create_dir_all(&root)
            .map_err(|e| AppError::Storage(format!("cannot create {}: {e}", root.display())))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }
}

impl NotesStore for DirStore {
    fn put(&self, name: &str, bytes: &[u8]) -> Result<String, AppError> {
        if !valid_name(name) {
            return Err(AppError::Storage(format!("invalid store name: {name:?}")));
        }
        let path = self.root.join(name);
        fs::write(&path, bytes)
            .map_err(|e| AppError::Storage(format!("cannot write {}: {e}", path.display())))?;
        Ok(download_url(name))
    }

    fn get(&self, name: &str) -> Result<Option<Vec<u8>>, AppError> {
        if !valid_name(name) {
            return Ok(None);
        }
        match fs::read(self.root.join(name)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Storage(format!("cannot read {name}: {e}"))),
        }
    }
}

// ── In-memory store ───────────────────────────────────────────────────────────

/// In-memory store for tests and ephemeral runs.
#[derive(Default)]
pub struct MemStore {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored files.
    pub fn len(&self) -> usize {
        self.files.lock().expect("mem store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NotesStore for MemStore {
    fn put(&self, name: &str, bytes: &[u8]) -> Result<String, AppError> {
        if !valid_name(name) {
            return Err(AppError::Storage(format!("invalid store name: {name:?}")));
        }
        self.files
            .lock()
            .map_err(|_| AppError::Storage("mem store lock poisoned".into()))?
            .insert(name.to_string(), bytes.to_vec());
        Ok(download_url(name))
    }

    fn get(&self, name: &str) -> Result<Option<Vec<u8>>, AppError> {
        if !valid_name(name) {
            return Ok(None);
        }
        Ok(self
            .files
            .lock()
            .map_err(|_| AppError::Storage("mem store lock poisoned".into()))?
            .get(name)
            .cloned())
    }
}
