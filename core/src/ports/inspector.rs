//! Process introspection port (interface).

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Why a process could not be inspected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InspectError {
    /// The process does not exist (or no longer exists).
    #[error("process not found")]
    NotFound,

    /// The caller lacks the rights to inspect the process.
    #[error("access denied")]
    AccessDenied,

    /// Any other OS failure.
    #[error("{0}")]
    Os(String),
}

/// Port for reading process metadata.
pub trait ProcessInspector: Send + Sync {
    /// Short process name, without the `.exe` suffix.
    fn process_name(&self, pid: u32) -> Result<String, InspectError>;

    /// Full path of the process's primary module.
    ///
    /// `Ok(None)` means the process exists but exposes no primary module.
    fn main_module_path(&self, pid: u32) -> Result<Option<String>, InspectError>;

    /// Process start time.
    fn start_time(&self, pid: u32) -> Result<DateTime<Utc>, InspectError>;
}
