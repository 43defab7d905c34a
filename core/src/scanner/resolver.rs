//! Owning-process resolution from the diagnostic connection table.
//!
//! The diagnostic command (`netstat -ano` on Windows) prints one row per
//! socket:
//!
//! ```text
//! Active Connections
//!
//!   Proto  Local Address          Foreign Address        State           PID
//!   TCP    0.0.0.0:135            0.0.0.0:0              LISTENING       1020
//!   TCP    [::1]:6379             [::]:0                 LISTENING       8080
//!   UDP    0.0.0.0:5353           *:*                                    2212
//! ```
//!
//! The table is captured at a single instant, so it can disagree with a
//! socket listing taken moments earlier. A miss is reported as PID 0 and
//! the binding is dropped; it is never an error.

use tracing::debug;

use crate::domain::Protocol;
use crate::ports::DiagnosticSource;

/// Find the owner of `port` in diagnostic text. Returns 0 when none matches.
///
/// A row matches when its protocol column is the requested base protocol
/// and its local address ends in `:<port>`, so `:80` never matches
/// `:8080`. The last column of the first matching row with a positive
/// PID wins.
pub fn parse_owner_pid(text: &str, port: u16, protocol: Protocol) -> u32 {
    let protocol_name = protocol.base().name();
    let port_suffix = format!(":{}", port);

    for line in text.lines() {
        let columns: Vec<&str> = line.split_whitespace().collect();

        // Proto, Local Address, ..., PID
        if columns.len() < 3 {
            continue;
        }
        if !columns[0].eq_ignore_ascii_case(protocol_name) {
            continue;
        }
        if !columns[1].ends_with(&port_suffix) {
            continue;
        }

        match columns[columns.len() - 1].parse::<u32>() {
            Ok(pid) if pid > 0 => return pid,
            _ => continue,
        }
    }

    0
}

/// One capture of the diagnostic table.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticSnapshot {
    text: String,
}

impl DiagnosticSnapshot {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Whether the capture produced no text at all.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Owner of `port`/`protocol` in this capture, or 0.
    pub fn owner_of(&self, port: u16, protocol: Protocol) -> u32 {
        parse_owner_pid(&self.text, port, protocol)
    }
}

/// Resolves owning PIDs through a [`DiagnosticSource`].
pub struct OwnerResolver<D> {
    source: D,
}

impl<D: DiagnosticSource> OwnerResolver<D> {
    pub fn new(source: D) -> Self {
        Self { source }
    }

    /// Capture the diagnostic table once, for resolving a whole scan.
    pub async fn snapshot(&self) -> DiagnosticSnapshot {
        let snapshot = DiagnosticSnapshot::new(self.source.capture().await);
        if snapshot.is_empty() {
            debug!("Diagnostic source returned no output; owners will not resolve");
        }
        snapshot
    }

    /// Resolve a single owner against a fresh capture. Returns 0 when none is found.
    pub async fn resolve_owner(&self, port: u16, protocol: Protocol) -> u32 {
        self.snapshot().await.owner_of(port, protocol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NETSTAT_OUTPUT: &str = r#"
Active Connections

  Proto  Local Address          Foreign Address        State           PID
  TCP    0.0.0.0:135            0.0.0.0:0              LISTENING       1020
  TCP    0.0.0.0:8080           0.0.0.0:0              LISTENING       7001
  TCP    127.0.0.1:52000        127.0.0.1:80           ESTABLISHED     6100
  TCP    [::1]:6379             [::]:0                 LISTENING       8080
  UDP    0.0.0.0:5353           *:*                                    2212
  UDP    [::]:5355              *:*                                    2300
"#;

    struct FixedSource(&'static str);

    impl DiagnosticSource for FixedSource {
        async fn capture(&self) -> String {
            self.0.to_string()
        }
    }

    #[test]
    fn test_single_row_example() {
        let text = "TCP 0.0.0.0:3000 0.0.0.0:0 LISTENING 4521";
        assert_eq!(parse_owner_pid(text, 3000, Protocol::Tcp), 4521);
        assert_eq!(parse_owner_pid(text, 300, Protocol::Tcp), 0);
    }

    #[test]
    fn test_port_boundary_is_respected() {
        // 8080 is bound, 80 only appears as a foreign port
        assert_eq!(parse_owner_pid(NETSTAT_OUTPUT, 80, Protocol::Tcp), 0);
        assert_eq!(parse_owner_pid(NETSTAT_OUTPUT, 8080, Protocol::Tcp), 7001);
        assert_eq!(parse_owner_pid(NETSTAT_OUTPUT, 808, Protocol::Tcp), 0);
    }

    #[test]
    fn test_protocol_must_match() {
        assert_eq!(parse_owner_pid(NETSTAT_OUTPUT, 5353, Protocol::Tcp), 0);
        assert_eq!(parse_owner_pid(NETSTAT_OUTPUT, 135, Protocol::Udp), 0);
    }

    #[test]
    fn test_versioned_protocols_match_base_rows() {
        assert_eq!(parse_owner_pid(NETSTAT_OUTPUT, 6379, Protocol::TcpV6), 8080);
        assert_eq!(parse_owner_pid(NETSTAT_OUTPUT, 5355, Protocol::UdpV6), 2300);
    }

    #[test]
    fn test_udp_rows_without_state_resolve() {
        assert_eq!(parse_owner_pid(NETSTAT_OUTPUT, 5353, Protocol::Udp), 2212);
    }

    #[test]
    fn test_unparseable_pid_skips_to_next_row() {
        let text = "\
  TCP    0.0.0.0:3000           0.0.0.0:0              LISTENING       [node.exe]
  TCP    0.0.0.0:3000           0.0.0.0:0              LISTENING       0
  TCP    [::]:3000              [::]:0                 LISTENING       4521
";
        assert_eq!(parse_owner_pid(text, 3000, Protocol::Tcp), 4521);
    }

    #[test]
    fn test_malformed_and_empty_input() {
        assert_eq!(parse_owner_pid("", 3000, Protocol::Tcp), 0);
        assert_eq!(parse_owner_pid("   \n\n", 3000, Protocol::Tcp), 0);
        assert_eq!(parse_owner_pid("TCP 0.0.0.0:3000", 3000, Protocol::Tcp), 0);
        assert_eq!(parse_owner_pid("garbage\u{0}\u{fffd} :3000 ", 3000, Protocol::Tcp), 0);
    }

    #[test]
    fn test_snapshot_is_empty() {
        assert!(DiagnosticSnapshot::default().is_empty());
        assert!(!DiagnosticSnapshot::new(NETSTAT_OUTPUT).is_empty());
    }

    #[tokio::test]
    async fn test_resolve_owner_uses_source() {
        let resolver = OwnerResolver::new(FixedSource(NETSTAT_OUTPUT));
        assert_eq!(resolver.resolve_owner(135, Protocol::Tcp).await, 1020);
        assert_eq!(resolver.resolve_owner(9999, Protocol::Tcp).await, 0);
    }

    #[tokio::test]
    async fn test_failed_source_resolves_nothing() {
        let resolver = OwnerResolver::new(FixedSource(""));
        assert_eq!(resolver.resolve_owner(135, Protocol::Tcp).await, 0);
    }
}
