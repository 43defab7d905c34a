//! Transport protocol and address family.

use serde::{Deserialize, Serialize};

/// Address family of a socket's local endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    Ipv4,
    Ipv6,
}

impl AddressFamily {
    /// Address family of a socket address.
    pub fn of(addr: &std::net::SocketAddr) -> Self {
        if addr.is_ipv6() {
            AddressFamily::Ipv6
        } else {
            AddressFamily::Ipv4
        }
    }
}

/// Protocol of a binding, including the IP version.
///
/// Variant order is the display ordinal used as the final sort tie-breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Protocol {
    #[serde(rename = "TCP")]
    Tcp,
    #[serde(rename = "UDP")]
    Udp,
    #[serde(rename = "TCPv6")]
    TcpV6,
    #[serde(rename = "UDPv6")]
    UdpV6,
}

impl Protocol {
    /// Combine a base protocol with an address family.
    ///
    /// `base` is reduced to TCP or UDP first, so passing an already
    /// versioned protocol is harmless.
    pub fn resolve(base: Protocol, family: AddressFamily) -> Self {
        match (base.base(), family) {
            (Protocol::Udp, AddressFamily::Ipv6) => Protocol::UdpV6,
            (Protocol::Udp, AddressFamily::Ipv4) => Protocol::Udp,
            (_, AddressFamily::Ipv6) => Protocol::TcpV6,
            (_, AddressFamily::Ipv4) => Protocol::Tcp,
        }
    }

    /// The protocol without its IP version (TCP or UDP).
    pub fn base(&self) -> Protocol {
        match self {
            Protocol::Tcp | Protocol::TcpV6 => Protocol::Tcp,
            Protocol::Udp | Protocol::UdpV6 => Protocol::Udp,
        }
    }

    /// Display name, e.g. "TCPv6".
    pub fn name(&self) -> &'static str {
        match self {
            Protocol::Tcp => "TCP",
            Protocol::Udp => "UDP",
            Protocol::TcpV6 => "TCPv6",
            Protocol::UdpV6 => "UDPv6",
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
