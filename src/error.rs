//! Application-wide error types.
//!
//! `Validation` carries the client-facing message and maps to HTTP 400;
//! `Storage` maps to HTTP 500 with a generic body (detail is logged only).
//! Upstream provider failures live in [`crate::gateway::ProviderError`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("logger error: {0}")]
    Logger(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("server error: {0}")]
    Server(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
