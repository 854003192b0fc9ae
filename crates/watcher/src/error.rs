//! Error types for a watch run.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from fetching the account timeline.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Credential rejected (401/403).
    #[error("authentication failed ({status}): {body}")]
    Auth { status: u16, body: String },

    /// Upstream throttled the request (429).
    #[error("rate limited by upstream (reset at {reset_at:?})")]
    RateLimited {
        /// Unix epoch seconds from `x-rate-limit-reset`, if sent.
        reset_at: Option<i64>,
    },

    /// Network failure, timeout or unexpected status.
    #[error("transient fetch failure: {0}")]
    Transient(String),

    /// The response could not be decoded.
    #[error("invalid response from upstream: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::InvalidResponse(e.to_string())
        } else {
            Self::Transient(e.to_string())
        }
    }
}

/// Errors reading or writing the state file.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to read state file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("state file {path} is malformed: {source}")]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to write state file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialize state: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Top-level error for a single run.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Some notifications were not delivered; the marker was not advanced.
    #[error(
        "{} of {} notifications failed (ids: {})",
        .failed.len(),
        .failed.len() + .delivered.len(),
        .failed.join(", ")
    )]
    Delivery {
        failed: Vec<String>,
        delivered: Vec<String>,
    },

    #[error(transparent)]
    State(#[from] StateError),
}

impl WatchError {
    /// Process exit code for this error.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Fetch(FetchError::Auth { .. }) => 2,
            Self::Fetch(FetchError::RateLimited { .. }) => 3,
            Self::Fetch(FetchError::Transient(_) | FetchError::InvalidResponse(_)) => 4,
            Self::Delivery { .. } => 5,
            Self::State(_) => 6,
        }
    }
}
