/// Structured error types for claimdesk-core.
///
/// Library crates get `thiserror` enums; the `claimdesk` binary wraps them
/// with `anyhow` context.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for claimdesk-core operations
#[derive(Error, Debug)]
pub enum DeskError {
    /// I/O operation failed
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    /// JSON parsing or serialization failed
    #[error("JSON error at {context}: {source}")]
    Json {
        context: String,
        source: serde_json::Error,
    },

    /// Configuration file could not be parsed
    #[error("Invalid config file {path:?}: {reason}")]
    ConfigFile { path: PathBuf, reason: String },

    /// Configuration error
    #[error("Configuration error: {reason}")]
    Config { reason: String },

    /// Table name is not one of the managed tables
    #[error("Unknown table '{name}'")]
    UnknownTable { name: String },

    /// Row index past the end of a table
    #[error("Row {index} out of range for table '{table}' ({len} rows)")]
    RowOutOfRange {
        table: String,
        index: usize,
        len: usize,
    },
}

/// Result type alias for claimdesk-core operations
pub type Result<T> = std::result::Result<T, DeskError>;

impl DeskError {
    /// Create a JSON error with context
    pub fn json(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Json {
            context: context.into(),
            source,
        }
    }

    /// Create a config error
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// Create an unknown table error
    pub fn unknown_table(name: impl Into<String>) -> Self {
        Self::UnknownTable { name: name.into() }
    }
}

/// Errors raised by a [`Backend`](crate::backend::Backend) implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Request never produced a response (DNS, TLS, connection reset, timeout)
    #[error("transport error: {0}")]
    Transport(String),

    /// Remote service answered with a non-success status
    #[error("backend returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Response body did not have the expected shape
    #[error("could not decode backend response: {0}")]
    Decode(String),

    /// Email/password sign-in was rejected
    #[error("invalid login credentials")]
    InvalidCredentials,
}

impl BackendError {
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }
}
