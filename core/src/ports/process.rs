//! Process management port (interface).

use tokio_util::sync::CancellationToken;

use crate::domain::TerminationOutcome;
use crate::error::Result;

/// Port for terminating processes.
pub trait ProcessManagement: Send + Sync {
    /// Terminate a process by PID.
    ///
    /// Termination failures are reported inside the outcome. The `Err`
    /// side is reserved for whole-operation aborts such as cancellation.
    fn terminate(
        &self,
        pid: u32,
        cancel: &CancellationToken,
    ) -> impl std::future::Future<Output = Result<TerminationOutcome>> + Send;

    /// Advisory check whether `terminate` is likely to be permitted.
    ///
    /// Never a gate: callers still attempt termination when this is false.
    fn can_terminate(&self, pid: u32) -> bool;
}
