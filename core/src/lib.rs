//! RBPortKiller Core Library
//!
//! Finds which processes hold network ports open on Windows and terminates
//! them on request. Provides functionality to:
//! - List TCP connections, TCP listeners and UDP listeners with their owners
//! - Keep OS-critical processes out of the listing
//! - Terminate an owner, escalating to a terminate-only handle when needed
//! - Load user configuration
//!
//! # Architecture
//! This library follows hexagonal architecture (ports & adapters):
//! - `domain`: Pure data models
//! - `ports`: Trait definitions (interfaces)
//! - `scanner`, `process`: Core logic written against the ports
//! - `adapters`: External system implementations
//! - `platform`: Picks the adapters for the host OS
//! - `application`: Use case services
//!
//! # Platform Support
//! - Windows: IP Helper socket tables, `netstat -ano` for owners, Win32 process APIs
//! - Other hosts: construction fails with [`Error::PlatformUnsupported`]

// Hexagonal architecture layers
pub mod adapters;
pub mod application;
pub mod domain;
pub mod ports;

pub mod config;
pub mod error;
pub mod platform;
pub mod process;
pub mod scanner;

// Re-export domain types (primary API)
pub use domain::{AddressFamily, PortBinding, Protocol, TerminationOutcome};

// Re-export other commonly used types
pub use application::PortKillerService;
pub use config::{Config, ConfigStore};
pub use error::{Error, Result};
pub use platform::platform_name;
pub use ports::{PortDiscovery, ProcessManagement};
pub use tokio_util::sync::CancellationToken;
