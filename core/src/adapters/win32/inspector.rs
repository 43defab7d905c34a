//! Process metadata through ToolHelp and the process APIs.

use std::mem;

use chrono::{DateTime, Utc};
use windows::Win32::Foundation::{FILETIME, HMODULE, MAX_PATH};
use windows::Win32::System::Diagnostics::ToolHelp::{
    Process32FirstW, Process32NextW, PROCESSENTRY32W,
};
use windows::Win32::System::ProcessStatus::GetModuleFileNameExW;
use windows::Win32::System::Threading::{
    GetProcessTimes, PROCESS_QUERY_INFORMATION, PROCESS_QUERY_LIMITED_INFORMATION,
    PROCESS_VM_READ,
};

use super::handles::OwnedHandle;
use super::{inspect_error, win32_code};
use crate::domain::strip_exe_suffix;
use crate::ports::{InspectError, ProcessInspector};

/// Seconds between 1601-01-01 (FILETIME epoch) and 1970-01-01.
const FILETIME_UNIX_DIFF: i64 = 11_644_473_600;
const FILETIME_TICKS_PER_SEC: i64 = 10_000_000;
/// Reading a 64-bit process's modules from a 32-bit one fails with this.
const ERROR_PARTIAL_COPY: u32 = 299;

fn wide_to_string(wide: &[u16]) -> String {
    let len = wide.iter().position(|&c| c == 0).unwrap_or(wide.len());
    String::from_utf16_lossy(&wide[..len])
}

fn filetime_to_utc(ft: &FILETIME) -> Option<DateTime<Utc>> {
    let ticks = (((ft.dwHighDateTime as u64) << 32) | ft.dwLowDateTime as u64) as i64;
    let secs = ticks / FILETIME_TICKS_PER_SEC - FILETIME_UNIX_DIFF;
    let nanos = (ticks % FILETIME_TICKS_PER_SEC) * 100;
    DateTime::from_timestamp(secs, nanos as u32)
}

/// [`ProcessInspector`] backed by Win32.
#[derive(Debug, Default, Clone, Copy)]
pub struct Win32Inspector;

impl Win32Inspector {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessInspector for Win32Inspector {
    fn process_name(&self, pid: u32) -> Result<String, InspectError> {
        let snapshot = OwnedHandle::process_snapshot().map_err(inspect_error)?;

        let mut entry = PROCESSENTRY32W {
            dwSize: mem::size_of::<PROCESSENTRY32W>() as u32,
            ..Default::default()
        };

        // SAFETY: valid snapshot handle and an entry with dwSize set.
        let mut next = unsafe { Process32FirstW(snapshot.as_raw(), &mut entry) };
        while next.is_ok() {
            if entry.th32ProcessID == pid {
                let name = wide_to_string(&entry.szExeFile);
                return Ok(strip_exe_suffix(&name).to_string());
            }
            // SAFETY: as above.
            next = unsafe { Process32NextW(snapshot.as_raw(), &mut entry) };
        }

        Err(InspectError::NotFound)
    }

    fn main_module_path(&self, pid: u32) -> Result<Option<String>, InspectError> {
        let handle = OwnedHandle::open_process(pid, PROCESS_QUERY_INFORMATION | PROCESS_VM_READ)
            .map_err(inspect_error)?;

        let mut buffer = [0u16; MAX_PATH as usize];
        // SAFETY: valid handle; a null module selects the executable.
        let len = unsafe { GetModuleFileNameExW(handle.as_raw(), HMODULE::default(), &mut buffer) };

        if len == 0 {
            let error = windows::core::Error::from_win32();
            if win32_code(&error) == ERROR_PARTIAL_COPY {
                return Ok(None);
            }
            return Err(inspect_error(error));
        }

        Ok(Some(String::from_utf16_lossy(&buffer[..len as usize])))
    }

    fn start_time(&self, pid: u32) -> Result<DateTime<Utc>, InspectError> {
        let handle = OwnedHandle::open_process(pid, PROCESS_QUERY_LIMITED_INFORMATION)
            .map_err(inspect_error)?;

        let mut creation_time = FILETIME::default();
        let mut exit_time = FILETIME::default();
        let mut kernel_time = FILETIME::default();
        let mut user_time = FILETIME::default();

        // SAFETY: valid handle and out-pointers to live locals.
        unsafe {
            GetProcessTimes(
                handle.as_raw(),
                &mut creation_time,
                &mut exit_time,
                &mut kernel_time,
                &mut user_time,
            )
        }
        .map_err(inspect_error)?;

        filetime_to_utc(&creation_time)
            .ok_or_else(|| InspectError::Os("process creation time out of range".to_string()))
    }
}
