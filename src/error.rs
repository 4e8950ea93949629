//! Custom error types for the application.
//!
//! This module defines the primary error type, `ImporterError`, for the entire
//! application. Using the `thiserror` crate, it provides a centralized way to
//! handle the different failure classes the importer distinguishes:
//!
//! - **Precondition** failures (`NotConnected`, `TemplatesNotLoaded`,
//!   `InvalidImportFolder`) are rejected before any side effect occurs.
//! - **Transport** failures (`ConnectTimeout`, `ReadTimeout`, `Io`) always
//!   leave the console connection torn down; the caller must reconnect.
//! - Configuration and serialization errors wrap their source crates via
//!   `#[from]` so they propagate cleanly with the `?` operator.
//!
//! Protocol-parse misses (a console reply without the expected marker) are
//! deliberately *not* errors; they degrade to an absent value at the parse
//! site and the flow continues.

use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias for results using the application error type.
pub type AppResult<T> = std::result::Result<T, ImporterError>;

#[derive(Error, Debug)]
pub enum ImporterError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Console is not connected")]
    NotConnected,

    #[error("Connection attempt to {host}:{port} timed out after {timeout_ms} ms")]
    ConnectTimeout {
        host: String,
        port: u16,
        timeout_ms: u64,
    },

    #[error("Console read timed out after {0} ms")]
    ReadTimeout(u64),

    #[error("Script template not found: {0}")]
    TemplateMissing(PathBuf),

    #[error("Script templates are not loaded")]
    TemplatesNotLoaded,

    #[error("Command rendering error: {0}")]
    CommandRender(String),

    #[error("Import folder does not exist or is not a directory: {0}")]
    InvalidImportFolder(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_timeout_message_names_endpoint() {
        let err = ImporterError::ConnectTimeout {
            host: "127.0.0.1".into(),
            port: 3663,
            timeout_ms: 10_000,
        };
        let msg = err.to_string();
        assert!(msg.contains("127.0.0.1:3663"));
        assert!(msg.contains("10000 ms"));
    }

    #[test]
    fn io_error_converts_via_from() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe");
        let err: ImporterError = io.into();
        assert!(matches!(err, ImporterError::Io(_)));
    }
}
