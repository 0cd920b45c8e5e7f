//! Error types for stationsync-fetch.

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("request timeout")]
    Timeout,

    #[error("incomplete transfer: got {got} of {want} bytes")]
    Incomplete { got: u64, want: u64 },

    #[error("max retries exceeded ({attempts} attempts)")]
    MaxRetriesExceeded { attempts: u32 },

    #[error("file I/O error: {0}")]
    Io(#[from] io::Error),
}

impl FetchError {
    /// Whether retrying the request could plausibly succeed.
    ///
    /// Timeouts, connection-level failures, short bodies and 408/429/5xx
    /// responses are transient. Other client errors and local I/O failures
    /// are not; retrying cannot change them.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout | Self::Incomplete { .. } => true,
            Self::Status(code) => matches!(*code, 408 | 429 | 500..=599),
            Self::MaxRetriesExceeded { .. } | Self::Io(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;
