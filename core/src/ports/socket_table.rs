//! Socket table port (interface).

use std::net::SocketAddr;

use crate::error::Result;

/// An active TCP connection as reported by the OS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcpConnection {
    pub local: SocketAddr,
    pub remote: SocketAddr,
    /// OS-reported state, e.g. `ESTABLISHED` or `TIME_WAIT`.
    pub state: String,
}

/// Port for reading the OS socket tables.
///
/// Rows carry endpoints only; owners are resolved separately.
pub trait SocketTable: Send + Sync {
    /// Active TCP connections (all states except listening).
    fn tcp_connections(&self) -> Result<Vec<TcpConnection>>;

    /// Local endpoints of TCP listeners.
    fn tcp_listeners(&self) -> Result<Vec<SocketAddr>>;

    /// Local endpoints of UDP listeners.
    fn udp_listeners(&self) -> Result<Vec<SocketAddr>>;
}
