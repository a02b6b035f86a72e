//! Platform error types

use thiserror::Error;

/// Failures reported by the WiFi and network collaborators.
///
/// The monitor never surfaces these to its caller; they are folded into
/// sentinel values and status codes.
#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("HTTP session setup failed: {0}")]
    Session(String),

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Timed out after {0}ms")]
    Timeout(u64),

    #[error("Connection lost: {0}")]
    Transport(String),

    #[error("Scan failed: {0}")]
    Scan(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PlatformError {
    /// Negative client error code, in the numbering embedded HTTP clients use
    pub fn status_code(&self) -> i32 {
        match self {
            PlatformError::Session(_) | PlatformError::Connect(_) => -1,
            PlatformError::Timeout(_) => -11,
            PlatformError::Transport(_) | PlatformError::Scan(_) | PlatformError::Io(_) => -5,
        }
    }
}
