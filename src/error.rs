//! Error types for every client operation.

use thiserror::Error;
use tonic::{Code, Status};

/// All client errors.
#[derive(Debug, Error)]
pub enum Error {
    /// The transport could not be opened.
    #[error("error opening {endpoint}: {message}")]
    Connect { endpoint: String, message: String },

    /// The backend rejected the access key or signature.
    #[error("credentials rejected: {0}")]
    Auth(String),

    /// The backend holds no row for the key.
    #[error("row not found: {0}")]
    NotFound(String),

    /// The row exists but carries no column value.
    #[error("row {0} has no column value")]
    MissingValue(String),

    /// A batched read returned a row without a key; the whole batch is void.
    #[error("{context}: row is nil")]
    PartialFailure { context: &'static str },

    /// Any other backend failure, prefixed with the call that hit it.
    #[error("{context}: {}", .status.message())]
    Backend {
        context: String,
        #[source]
        status: Status,
    },

    /// The per-RPC deadline expired.
    #[error("{context}: deadline exceeded")]
    Timeout { context: String },

    /// The session was closed before or during the call.
    #[error("session is closed")]
    Closed,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Classify a status returned by the backend for the call named `context`.
    pub fn from_status(context: impl Into<String>, status: Status) -> Self {
        let context = context.into();
        match status.code() {
            Code::Unauthenticated | Code::PermissionDenied => {
                Error::Auth(format!("{}: {}", context, status.message()))
            }
            // A client-side endpoint timeout surfaces as `Cancelled`.
            Code::DeadlineExceeded | Code::Cancelled => Error::Timeout { context },
            _ => Error::Backend { context, status },
        }
    }

    /// Transport-level failures that may succeed if the caller tries again.
    /// Nothing in this crate retries on its own.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Connect { .. } | Error::Timeout { .. } => true,
            Error::Backend { status, .. } => status.code() == Code::Unavailable,
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}
