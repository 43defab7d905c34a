//! Ports layer - Trait definitions (interfaces).
//!
//! This module defines the interfaces that the application layer uses
//! to interact with the operating system. Implementations live in `adapters`.
//!
//! Two groups of traits live here:
//! - capabilities consumed by the application service (`PortDiscovery`,
//!   `ProcessManagement`);
//! - OS seams those capabilities are built on (`SocketTable`,
//!   `DiagnosticSource`, `ProcessInspector`, `ProcessControl`).

mod control;
mod diagnostic;
mod discovery;
mod inspector;
mod process;
mod socket_table;

pub use control::{ControlError, ControlledProcess, ProcessAccess, ProcessControl};
pub use diagnostic::DiagnosticSource;
pub use discovery::PortDiscovery;
pub use inspector::{InspectError, ProcessInspector};
pub use process::ProcessManagement;
pub use socket_table::{SocketTable, TcpConnection};
