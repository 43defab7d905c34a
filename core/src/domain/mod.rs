//! Domain layer - Pure data models.
//!
//! These types have no I/O dependencies and can be tested in isolation.

mod binding;
mod protocol;
mod termination;

// Re-export all domain types
pub use binding::{display_order, newest_first, strip_exe_suffix, PortBinding, ProcessRecord};
pub use protocol::{AddressFamily, Protocol};
pub use termination::{TerminationOutcome, ACCESS_DENIED_MESSAGE};
