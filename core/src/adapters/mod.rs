//! Adapters layer - External system implementations.
//!
//! This module contains implementations of the port traits defined in `ports`.
//! Each adapter handles communication with external systems.

mod netstat;

#[cfg(windows)]
pub mod win32;

pub use netstat::NetstatCommand;
