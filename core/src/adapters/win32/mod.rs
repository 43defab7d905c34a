//! Win32 adapters: IP Helper socket tables, process inspection and control.

mod control;
mod handles;
mod inspector;
mod socket_table;

pub use control::{Win32Process, Win32ProcessControl};
pub use inspector::Win32Inspector;
pub use socket_table::IpHelperSocketTable;

use crate::ports::{ControlError, InspectError};

const ERROR_ACCESS_DENIED: u32 = 5;
/// What `OpenProcess` reports for a PID that does not exist.
const ERROR_INVALID_PARAMETER: u32 = 87;
const FACILITY_WIN32: u32 = 7;

/// Win32 error code carried by a `windows` error.
pub(crate) fn win32_code(error: &windows::core::Error) -> u32 {
    let hresult = error.code().0 as u32;
    if (hresult >> 16) & 0x1FFF == FACILITY_WIN32 {
        hresult & 0xFFFF
    } else {
        hresult
    }
}

pub(crate) fn control_error(error: windows::core::Error) -> ControlError {
    match win32_code(&error) {
        ERROR_ACCESS_DENIED => ControlError::AccessDenied,
        ERROR_INVALID_PARAMETER => ControlError::NotFound,
        code => ControlError::Os {
            code,
            message: error.message().to_string(),
        },
    }
}

pub(crate) fn inspect_error(error: windows::core::Error) -> InspectError {
    match win32_code(&error) {
        ERROR_ACCESS_DENIED => InspectError::AccessDenied,
        ERROR_INVALID_PARAMETER => InspectError::NotFound,
        _ => InspectError::Os(error.message().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use windows::core::HRESULT;

    #[test]
    fn test_error_classification() {
        let denied = windows::core::Error::from(HRESULT(0x8007_0005_u32 as i32));
        assert_eq!(win32_code(&denied), ERROR_ACCESS_DENIED);
        assert_eq!(control_error(denied), ControlError::AccessDenied);

        let missing = windows::core::Error::from(HRESULT(0x8007_0057_u32 as i32));
        assert_eq!(inspect_error(missing), InspectError::NotFound);

        let other = windows::core::Error::from(HRESULT(0x8007_05AA_u32 as i32));
        assert_eq!(control_error(other).code(), Some(1450));
    }
}
