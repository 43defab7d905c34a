//! RAII wrappers for Win32 handles.

use windows::Win32::Foundation::{CloseHandle, HANDLE};
use windows::Win32::System::Diagnostics::ToolHelp::{CreateToolhelp32Snapshot, TH32CS_SNAPPROCESS};
use windows::Win32::System::Threading::{OpenProcess, PROCESS_ACCESS_RIGHTS};

/// An owned Win32 handle, closed on drop.
pub struct OwnedHandle(HANDLE);

impl OwnedHandle {
    /// Open a process with the given access rights.
    pub fn open_process(pid: u32, access: PROCESS_ACCESS_RIGHTS) -> windows::core::Result<Self> {
        // SAFETY: OpenProcess has no pointer arguments; failure comes back as Err.
        let handle = unsafe { OpenProcess(access, false, pid)? };
        Ok(Self(handle))
    }

    /// Snapshot of every process in the system.
    pub fn process_snapshot() -> windows::core::Result<Self> {
        // SAFETY: the PID argument is ignored for process snapshots.
        let handle = unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0)? };
        Ok(Self(handle))
    }

    /// Raw handle; valid only while `self` is alive.
    pub fn as_raw(&self) -> HANDLE {
        self.0
    }
}

impl Drop for OwnedHandle {
    fn drop(&mut self) {
        // SAFETY: we own the handle and close it exactly once.
        unsafe {
            let _ = CloseHandle(self.0);
        }
    }
}
