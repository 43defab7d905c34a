//! Process termination.
//!
//! Termination runs in two tiers:
//!
//! 1. **Cooperative**: open the process with terminate, wait and query
//!    rights, terminate it and wait for the exit, bounded by the configured
//!    timeout.
//! 2. **Fallback**: when the cooperative tier is refused with access
//!    denied, open with the terminate right alone and terminate once.
//!
//! Every handle is released before `terminate` returns, whichever path is
//! taken. A process that has already exited counts as terminated, so a
//! repeated call for the same PID succeeds.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::domain::TerminationOutcome;
use crate::error::{Error, Result};
use crate::ports::{ControlError, ControlledProcess, ProcessAccess, ProcessControl, ProcessManagement};

/// Exit code given to terminated processes.
const TERMINATION_EXIT_CODE: u32 = 1;

pub const PROCESS_NOT_FOUND_MESSAGE: &str = "Process not found.";
pub const TIMEOUT_MESSAGE: &str = "Process did not terminate within the timeout period.";

/// Where the cooperative tier left things.
enum Step {
    Finished(TerminationOutcome),
    Escalate,
    Cancelled,
}

/// [`ProcessManagement`] over a [`ProcessControl`] seam.
pub struct ProcessTerminator<C> {
    control: Arc<C>,
    timeout: Duration,
    poll_interval: Duration,
}

impl<C: ProcessControl + 'static> ProcessTerminator<C> {
    pub fn new(control: C, config: &Config) -> Self {
        Self::with_timeouts(control, config.termination_timeout(), config.wait_poll_interval())
    }

    pub fn with_timeouts(control: C, timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            control: Arc::new(control),
            timeout,
            poll_interval: poll_interval.max(Duration::from_millis(1)),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl<C: ProcessControl + 'static> ProcessManagement for ProcessTerminator<C> {
    async fn terminate(&self, pid: u32, cancel: &CancellationToken) -> Result<TerminationOutcome> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let control = Arc::clone(&self.control);
        let cancel = cancel.clone();
        let timeout = self.timeout;
        let poll_interval = self.poll_interval;

        let outcome = tokio::task::spawn_blocking(move || {
            terminate_blocking(control.as_ref(), pid, timeout, poll_interval, &cancel)
        })
        .await
        .map_err(|e| Error::Internal(format!("Termination task failed: {}", e)))??;

        if outcome.success {
            info!(pid = pid, "Process terminated");
        } else {
            warn!(pid = pid, reason = ?outcome.error_message, "Process termination failed");
        }
        Ok(outcome)
    }

    fn can_terminate(&self, pid: u32) -> bool {
        match self.control.open(pid, ProcessAccess::TerminateOnly) {
            Ok(_process) => true,
            Err(ControlError::AccessDenied) => false,
            // Anything else is not a rights problem; let the attempt decide.
            Err(e) => {
                debug!(pid = pid, error = %e, "Termination probe failed");
                true
            }
        }
    }
}

fn terminate_blocking<C: ProcessControl>(
    control: &C,
    pid: u32,
    timeout: Duration,
    poll_interval: Duration,
    cancel: &CancellationToken,
) -> Result<TerminationOutcome> {
    let step = match control.open(pid, ProcessAccess::Cooperative) {
        Ok(process) => cooperative(&process, pid, timeout, poll_interval, cancel),
        Err(e) => cooperative_failure(pid, e),
    };

    match step {
        Step::Finished(outcome) => Ok(outcome),
        Step::Cancelled => {
            debug!(pid = pid, "Termination cancelled");
            Err(Error::Cancelled)
        }
        Step::Escalate => {
            debug!(pid = pid, "Cooperative termination denied, using terminate-only access");
            Ok(fallback(control, pid))
        }
    }
}

fn cooperative<P: ControlledProcess>(
    process: &P,
    pid: u32,
    timeout: Duration,
    poll_interval: Duration,
    cancel: &CancellationToken,
) -> Step {
    match process.has_exited() {
        Ok(true) => {
            debug!(pid = pid, "Process already exited");
            return Step::Finished(TerminationOutcome::succeeded(pid));
        }
        Ok(false) => {}
        Err(e) => return cooperative_failure(pid, e),
    }

    if let Err(e) = process.terminate(TERMINATION_EXIT_CODE) {
        return cooperative_failure(pid, e);
    }

    let deadline = Instant::now() + timeout;
    loop {
        if cancel.is_cancelled() {
            return Step::Cancelled;
        }

        // A spent deadline still gets one zero-length check before timing out.
        let remaining = deadline.saturating_duration_since(Instant::now());
        match process.wait_for_exit(remaining.min(poll_interval)) {
            Ok(true) => return Step::Finished(TerminationOutcome::succeeded(pid)),
            Ok(false) if remaining.is_zero() => {
                return Step::Finished(TerminationOutcome::failed(pid, TIMEOUT_MESSAGE, false))
            }
            Ok(false) => continue,
            Err(e) => return cooperative_failure(pid, e),
        }
    }
}

fn cooperative_failure(pid: u32, error: ControlError) -> Step {
    match error {
        ControlError::AccessDenied => Step::Escalate,
        ControlError::AlreadyExited => Step::Finished(TerminationOutcome::succeeded(pid)),
        ControlError::NotFound => {
            Step::Finished(TerminationOutcome::failed(pid, PROCESS_NOT_FOUND_MESSAGE, false))
        }
        ControlError::Os { message, .. } => Step::Finished(TerminationOutcome::failed(
            pid,
            format!("Failed to terminate process: {}", message),
            false,
        )),
    }
}

fn fallback<C: ProcessControl>(control: &C, pid: u32) -> TerminationOutcome {
    let process = match control.open(pid, ProcessAccess::TerminateOnly) {
        Ok(process) => process,
        Err(ControlError::AccessDenied) => return TerminationOutcome::access_denied(pid),
        Err(ControlError::AlreadyExited) => return TerminationOutcome::succeeded(pid),
        Err(ControlError::NotFound) => {
            return TerminationOutcome::failed(pid, PROCESS_NOT_FOUND_MESSAGE, false)
        }
        Err(ControlError::Os { code, .. }) => {
            return TerminationOutcome::failed(
                pid,
                format!("Failed to open process. Error code: {}", code),
                false,
            )
        }
    };

    match process.terminate(TERMINATION_EXIT_CODE) {
        Ok(()) | Err(ControlError::AlreadyExited) => TerminationOutcome::succeeded(pid),
        Err(ControlError::AccessDenied) => TerminationOutcome::access_denied(pid),
        Err(ControlError::NotFound) => {
            TerminationOutcome::failed(pid, PROCESS_NOT_FOUND_MESSAGE, false)
        }
        Err(ControlError::Os { code, .. }) => TerminationOutcome::failed(
            pid,
            format!("Failed to terminate process. Error code: {}", code),
            false,
        ),
    }
}
