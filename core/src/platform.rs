//! Platform capability dispatch.
//!
//! Port discovery and process management exist for Windows only. On any
//! other host the factories fail with [`crate::Error::PlatformUnsupported`] so the
//! caller stops at startup instead of listing nothing.

use crate::config::Config;
#[cfg(not(windows))]
use crate::error::Error;
use crate::error::Result;

#[cfg(windows)]
use crate::adapters::win32::{IpHelperSocketTable, Win32Inspector, Win32ProcessControl};
#[cfg(windows)]
use crate::adapters::NetstatCommand;
#[cfg(windows)]
use crate::process::ProcessTerminator;
#[cfg(windows)]
use crate::scanner::PortEnumerator;

/// Human-readable name of the host OS family.
pub fn platform_name() -> &'static str {
    if cfg!(windows) {
        "Windows"
    } else if cfg!(target_os = "linux") {
        "Linux"
    } else if cfg!(target_os = "macos") {
        "macOS"
    } else {
        "Unknown"
    }
}

/// Whether this host has port discovery and process management.
pub fn is_supported() -> bool {
    cfg!(windows)
}

#[cfg(windows)]
pub type PlatformDiscovery = PortEnumerator<IpHelperSocketTable, NetstatCommand, Win32Inspector>;

#[cfg(windows)]
pub type PlatformProcessManager = ProcessTerminator<Win32ProcessControl>;

#[cfg(not(windows))]
pub type PlatformDiscovery = Unsupported;

#[cfg(not(windows))]
pub type PlatformProcessManager = Unsupported;

/// Capability type for hosts without an implementation. It has no values.
#[cfg(not(windows))]
#[derive(Debug)]
pub enum Unsupported {}

#[cfg(not(windows))]
impl crate::ports::PortDiscovery for Unsupported {
    async fn discover(
        &self,
        _cancel: &tokio_util::sync::CancellationToken,
    ) -> Result<Vec<crate::domain::PortBinding>> {
        match *self {}
    }
}

#[cfg(not(windows))]
impl crate::ports::ProcessManagement for Unsupported {
    async fn terminate(
        &self,
        _pid: u32,
        _cancel: &tokio_util::sync::CancellationToken,
    ) -> Result<crate::domain::TerminationOutcome> {
        match *self {}
    }

    fn can_terminate(&self, _pid: u32) -> bool {
        match *self {}
    }
}

#[cfg(not(windows))]
fn unsupported() -> Error {
    Error::PlatformUnsupported(format!(
        "{} support is not yet implemented",
        platform_name()
    ))
}

/// Port discovery for the current host.
pub fn create_port_discovery(config: &Config) -> Result<PlatformDiscovery> {
    #[cfg(windows)]
    {
        Ok(PortEnumerator::new(
            IpHelperSocketTable::new(),
            NetstatCommand::from_config(config),
            Win32Inspector::new(),
        ))
    }

    #[cfg(not(windows))]
    {
        let _ = config;
        Err(unsupported())
    }
}

/// Process management for the current host.
pub fn create_process_manager(config: &Config) -> Result<PlatformProcessManager> {
    #[cfg(windows)]
    {
        Ok(ProcessTerminator::new(Win32ProcessControl::new(), config))
    }

    #[cfg(not(windows))]
    {
        let _ = config;
        Err(unsupported())
    }
}
