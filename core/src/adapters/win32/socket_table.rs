//! Socket tables through the IP Helper API.
//!
//! `GetExtendedTcpTable` / `GetExtendedUdpTable` return a count followed by
//! fixed-size rows. Ports are stored in network byte order in the low 16
//! bits of a DWORD.

use std::ffi::c_void;
use std::mem;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4, SocketAddrV6};

use tracing::debug;
use windows::Win32::NetworkManagement::IpHelper::{
    GetExtendedTcpTable, GetExtendedUdpTable, TCP_TABLE_CLASS, TCP_TABLE_OWNER_PID_CONNECTIONS,
    TCP_TABLE_OWNER_PID_LISTENER, UDP_TABLE_OWNER_PID,
};
use windows::Win32::Networking::WinSock::{AF_INET, AF_INET6};

use crate::error::{Error, Result};
use crate::ports::{SocketTable, TcpConnection};

const NO_ERROR: u32 = 0;
const ERROR_INSUFFICIENT_BUFFER: u32 = 122;
/// The table can grow between the sizing call and the read.
const MAX_READ_ATTEMPTS: usize = 4;

#[repr(C)]
#[derive(Clone, Copy)]
struct Tcp4Row {
    state: u32,
    local_addr: u32,
    local_port: u32,
    remote_addr: u32,
    remote_port: u32,
    owning_pid: u32,
}

#[repr(C)]
#[derive(Clone, Copy)]
struct Tcp6Row {
    local_addr: [u8; 16],
    local_scope_id: u32,
    local_port: u32,
    remote_addr: [u8; 16],
    remote_scope_id: u32,
    remote_port: u32,
    state: u32,
    owning_pid: u32,
}

#[repr(C)]
#[derive(Clone, Copy)]
struct Udp4Row {
    local_addr: u32,
    local_port: u32,
    owning_pid: u32,
}

#[repr(C)]
#[derive(Clone, Copy)]
struct Udp6Row {
    local_addr: [u8; 16],
    local_scope_id: u32,
    local_port: u32,
    owning_pid: u32,
}

/// Netstat-style name of a `MIB_TCP_STATE` value.
fn state_name(state: u32) -> &'static str {
    match state {
        1 => "CLOSED",
        2 => "LISTENING",
        3 => "SYN_SENT",
        4 => "SYN_RECEIVED",
        5 => "ESTABLISHED",
        6 => "FIN_WAIT_1",
        7 => "FIN_WAIT_2",
        8 => "CLOSE_WAIT",
        9 => "CLOSING",
        10 => "LAST_ACK",
        11 => "TIME_WAIT",
        12 => "DELETE_TCB",
        _ => "UNKNOWN",
    }
}

fn port_of(raw: u32) -> u16 {
    u16::from_be(raw as u16)
}

fn v4(addr: u32, port: u32) -> SocketAddr {
    // The address bytes are already in network order in memory.
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::from(addr.to_ne_bytes()), port_of(port)))
}

fn v6(addr: [u8; 16], port: u32, scope_id: u32) -> SocketAddr {
    SocketAddr::V6(SocketAddrV6::new(Ipv6Addr::from(addr), port_of(port), 0, scope_id))
}

/// Run the sizing call, then read the table into a DWORD-aligned buffer.
fn read_table<F>(name: &str, mut fetch: F) -> Result<Vec<u32>>
where
    F: FnMut(Option<*mut c_void>, &mut u32) -> u32,
{
    let mut size: u32 = 0;
    let _ = fetch(None, &mut size);

    for _ in 0..MAX_READ_ATTEMPTS {
        if size == 0 {
            return Ok(Vec::new());
        }

        let mut buffer = vec![0u32; (size as usize).div_ceil(mem::size_of::<u32>())];
        match fetch(Some(buffer.as_mut_ptr().cast()), &mut size) {
            NO_ERROR => return Ok(buffer),
            ERROR_INSUFFICIENT_BUFFER => {
                debug!(table = name, size = size, "Socket table grew, retrying");
            }
            code => {
                return Err(Error::SocketTable(format!(
                    "{} failed with error code {}",
                    name, code
                )))
            }
        }
    }

    Err(Error::SocketTable(format!(
        "{} kept growing after {} attempts",
        name, MAX_READ_ATTEMPTS
    )))
}

/// Decode the rows following the leading entry count.
fn rows<R: Copy>(buffer: &[u32]) -> Vec<R> {
    let Some((&count, body)) = buffer.split_first() else {
        return Vec::new();
    };

    let capacity = mem::size_of_val(body) / mem::size_of::<R>();
    let count = (count as usize).min(capacity);
    let base = body.as_ptr().cast::<R>();

    // SAFETY: `count` rows fit inside `body`; rows are plain DWORD/byte data.
    (0..count)
        .map(|i| unsafe { base.add(i).read_unaligned() })
        .collect()
}

fn tcp_table<R: Copy>(family: u32, class: TCP_TABLE_CLASS) -> Result<Vec<R>> {
    let buffer = read_table("GetExtendedTcpTable", |table, size| {
        // SAFETY: `size` describes the buffer behind `table`.
        unsafe { GetExtendedTcpTable(table, size, false, family, class, 0) }
    })?;
    Ok(rows(&buffer))
}

fn udp_table<R: Copy>(family: u32) -> Result<Vec<R>> {
    let buffer = read_table("GetExtendedUdpTable", |table, size| {
        // SAFETY: `size` describes the buffer behind `table`.
        unsafe { GetExtendedUdpTable(table, size, false, family, UDP_TABLE_OWNER_PID, 0) }
    })?;
    Ok(rows(&buffer))
}

/// [`SocketTable`] over the IPv4 and IPv6 IP Helper tables.
#[derive(Debug, Default, Clone, Copy)]
pub struct IpHelperSocketTable;

impl IpHelperSocketTable {
    pub fn new() -> Self {
        Self
    }
}

impl SocketTable for IpHelperSocketTable {
    fn tcp_connections(&self) -> Result<Vec<TcpConnection>> {
        let v4_rows = tcp_table::<Tcp4Row>(AF_INET.0 as u32, TCP_TABLE_OWNER_PID_CONNECTIONS)?;
        let v6_rows = tcp_table::<Tcp6Row>(AF_INET6.0 as u32, TCP_TABLE_OWNER_PID_CONNECTIONS)?;

        let connections = v4_rows
            .iter()
            .map(|row| TcpConnection {
                local: v4(row.local_addr, row.local_port),
                remote: v4(row.remote_addr, row.remote_port),
                state: state_name(row.state).to_string(),
            })
            .chain(v6_rows.iter().map(|row| TcpConnection {
                local: v6(row.local_addr, row.local_port, row.local_scope_id),
                remote: v6(row.remote_addr, row.remote_port, row.remote_scope_id),
                state: state_name(row.state).to_string(),
            }))
            .collect();

        Ok(connections)
    }

    fn tcp_listeners(&self) -> Result<Vec<SocketAddr>> {
        let v4_rows = tcp_table::<Tcp4Row>(AF_INET.0 as u32, TCP_TABLE_OWNER_PID_LISTENER)?;
        let v6_rows = tcp_table::<Tcp6Row>(AF_INET6.0 as u32, TCP_TABLE_OWNER_PID_LISTENER)?;

        Ok(v4_rows
            .iter()
            .map(|row| v4(row.local_addr, row.local_port))
            .chain(
                v6_rows
                    .iter()
                    .map(|row| v6(row.local_addr, row.local_port, row.local_scope_id)),
            )
            .collect())
    }

    fn udp_listeners(&self) -> Result<Vec<SocketAddr>> {
        let v4_rows = udp_table::<Udp4Row>(AF_INET.0 as u32)?;
        let v6_rows = udp_table::<Udp6Row>(AF_INET6.0 as u32)?;

        Ok(v4_rows
            .iter()
            .map(|row| v4(row.local_addr, row.local_port))
            .chain(
                v6_rows
                    .iter()
                    .map(|row| v6(row.local_addr, row.local_port, row.local_scope_id)),
            )
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_names() {
        assert_eq!(state_name(2), "LISTENING");
        assert_eq!(state_name(5), "ESTABLISHED");
        assert_eq!(state_name(11), "TIME_WAIT");
        assert_eq!(state_name(99), "UNKNOWN");
    }

    #[test]
    fn test_row_decoding() {
        // 127.0.0.1:3000, network byte order
        let addr = u32::from_ne_bytes([127, 0, 0, 1]);
        let port = 3000u16.to_be() as u32;
        let buffer = vec![1, addr, port, 4521];

        let decoded: Vec<Udp4Row> = rows(&buffer);
        assert_eq!(decoded.len(), 1);
        assert_eq!(v4(decoded[0].local_addr, decoded[0].local_port), "127.0.0.1:3000".parse().unwrap());
        assert_eq!(decoded[0].owning_pid, 4521);
    }

    #[test]
    fn test_truncated_buffer_is_clamped() {
        let buffer = vec![10, 0, 0];
        assert!(rows::<Udp4Row>(&buffer).is_empty());
        assert!(rows::<Udp4Row>(&[]).is_empty());
    }

    #[test]
    fn test_live_listener_is_listed() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let local = listener.local_addr().unwrap();

        let listeners = IpHelperSocketTable::new().tcp_listeners().unwrap();
        assert!(listeners.contains(&local));
    }
}
