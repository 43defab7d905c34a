//! Error types for the rbportkiller-core library.

use thiserror::Error;

/// Result type alias for rbportkiller operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Whole-operation failures surfaced to callers.
///
/// Per-entry problems during enumeration (an owner that cannot be resolved,
/// a process that vanished, an access-denied probe) never reach this type;
/// they are absorbed where they happen and the entry is dropped.
#[derive(Error, Debug)]
pub enum Error {
    /// No port discovery or process management implementation exists for this host.
    #[error("Platform not supported: {0}")]
    PlatformUnsupported(String),

    /// The caller cancelled the operation.
    #[error("Operation cancelled")]
    Cancelled,

    /// A programming error on the caller's side.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An OS-level socket listing could not be read.
    #[error("Failed to read socket table: {0}")]
    SocketTable(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A background task failed to complete.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether this error is a caller-requested abort rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::PlatformUnsupported("Linux support is not yet implemented".to_string());
        assert!(err.to_string().contains("Linux"));

        let err = Error::InvalidArgument("binding has no owning process".to_string());
        assert!(err.to_string().starts_with("Invalid argument"));
    }

    #[test]
    fn test_is_cancelled() {
        assert!(Error::Cancelled.is_cancelled());
        assert!(!Error::Internal("join".to_string()).is_cancelled());
    }
}
