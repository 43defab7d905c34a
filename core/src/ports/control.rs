//! Process control port (interface).

use std::time::Duration;

use thiserror::Error;

/// Access level requested when opening a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessAccess {
    /// Terminate, wait for exit and query exit status.
    Cooperative,
    /// The terminate right only.
    TerminateOnly,
}

/// Failure of a process control call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControlError {
    #[error("process not found")]
    NotFound,

    #[error("access denied")]
    AccessDenied,

    /// The process exited while the call was in flight.
    #[error("process has already exited")]
    AlreadyExited,

    #[error("{message} (error code: {code})")]
    Os { code: u32, message: String },
}

impl ControlError {
    pub fn is_access_denied(&self) -> bool {
        matches!(self, ControlError::AccessDenied)
    }

    /// OS error code, when one is known.
    pub fn code(&self) -> Option<u32> {
        match self {
            ControlError::Os { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// An opened process.
///
/// Implementations release the underlying OS handle on drop, so a handle
/// never outlives the call that opened it.
pub trait ControlledProcess {
    /// Whether the process has already exited.
    fn has_exited(&self) -> Result<bool, ControlError>;

    /// Block for at most `timeout` waiting for exit. Returns `true` on exit.
    fn wait_for_exit(&self, timeout: Duration) -> Result<bool, ControlError>;

    /// Force the process to exit with `exit_code`.
    fn terminate(&self, exit_code: u32) -> Result<(), ControlError>;
}

/// Port for opening processes.
pub trait ProcessControl: Send + Sync {
    type Process: ControlledProcess;

    fn open(&self, pid: u32, access: ProcessAccess) -> Result<Self::Process, ControlError>;
}
