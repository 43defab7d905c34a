//! Process control through `OpenProcess` / `TerminateProcess`.

use std::time::Duration;

use windows::Win32::Foundation::{WAIT_FAILED, WAIT_OBJECT_0, WAIT_TIMEOUT};
use windows::Win32::System::Threading::{
    TerminateProcess, WaitForSingleObject, PROCESS_QUERY_LIMITED_INFORMATION, PROCESS_TERMINATE,
    PROCESS_SYNCHRONIZE,
};

use super::control_error;
use super::handles::OwnedHandle;
use crate::ports::{ControlError, ControlledProcess, ProcessAccess, ProcessControl};

/// Opens processes with Win32 handles.
#[derive(Debug, Default, Clone, Copy)]
pub struct Win32ProcessControl;

impl Win32ProcessControl {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessControl for Win32ProcessControl {
    type Process = Win32Process;

    fn open(&self, pid: u32, access: ProcessAccess) -> Result<Win32Process, ControlError> {
        let rights = match access {
            ProcessAccess::Cooperative => {
                PROCESS_TERMINATE | PROCESS_SYNCHRONIZE | PROCESS_QUERY_LIMITED_INFORMATION
            }
            ProcessAccess::TerminateOnly => PROCESS_TERMINATE,
        };

        let handle = OwnedHandle::open_process(pid, rights).map_err(control_error)?;
        Ok(Win32Process { handle, access })
    }
}

/// An open process handle.
pub struct Win32Process {
    handle: OwnedHandle,
    access: ProcessAccess,
}

impl Win32Process {
    fn wait(&self, millis: u32) -> Result<bool, ControlError> {
        // Terminate-only handles lack SYNCHRONIZE.
        if self.access == ProcessAccess::TerminateOnly {
            return Ok(false);
        }

        // SAFETY: the handle is open for as long as `self` lives.
        let event = unsafe { WaitForSingleObject(self.handle.as_raw(), millis) };
        if event == WAIT_OBJECT_0 {
            Ok(true)
        } else if event == WAIT_TIMEOUT {
            Ok(false)
        } else if event == WAIT_FAILED {
            Err(control_error(windows::core::Error::from_win32()))
        } else {
            Ok(false)
        }
    }
}

impl ControlledProcess for Win32Process {
    fn has_exited(&self) -> Result<bool, ControlError> {
        self.wait(0)
    }

    fn wait_for_exit(&self, timeout: Duration) -> Result<bool, ControlError> {
        let millis = u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX - 1);
        self.wait(millis)
    }

    fn terminate(&self, exit_code: u32) -> Result<(), ControlError> {
        // SAFETY: the handle is open for as long as `self` lives.
        match unsafe { TerminateProcess(self.handle.as_raw(), exit_code) } {
            Ok(()) => Ok(()),
            Err(e) => match control_error(e) {
                // Terminating a process that has exited reports access denied.
                ControlError::AccessDenied if self.has_exited() == Ok(true) => {
                    Err(ControlError::AlreadyExited)
                }
                other => Err(other),
            },
        }
    }
}
