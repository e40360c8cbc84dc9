//! Error taxonomy for TermGate.
//!
//! The variants map one-to-one onto the HTTP statuses the gateway
//! returns: denials are expected and carry a reason, I/O failures are
//! distinct from denials, and internal errors are surfaced to callers
//! only as a generic message.

/// Convenience alias used across TermGate crates.
pub type Result<T> = std::result::Result<T, TermGateError>;

#[derive(Debug, thiserror::Error)]
pub enum TermGateError {
    /// Invalid policy or config file — fatal at startup.
    #[error("configuration error: {0}")]
    Config(String),

    /// Authorization denial. Expected, user-facing, never fatal.
    #[error("access denied: {0}")]
    Denied(String),

    /// Requested file or directory does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Underlying I/O failure (permissions, disk, not-a-directory).
    #[error("i/o error: {0}")]
    Io(String),

    /// Command exceeded its wall-clock budget.
    #[error("timed out after {0} ms")]
    TimedOut(u64),

    /// Unexpected failure. Logged in full server-side, summarized to callers.
    #[error("internal error: {0}")]
    Internal(String),
}

impl TermGateError {
    /// Classify a `std::io::Error` for a file operation on `path`.
    pub fn from_io(err: std::io::Error, path: &str) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_string()),
            _ => Self::Io(format!("{path}: {err}")),
        }
    }
}
