//! Port binding and process domain models.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Protocol;

// ============================================================================
// PortBinding
// ============================================================================

/// One observed socket binding and the process that holds it open.
///
/// Bindings handed to callers always have `process_id > 0` and
/// `is_system_process == false`; everything else is dropped during discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortBinding {
    /// The local port number.
    pub port: u16,
    /// Protocol including IP version.
    pub protocol: Protocol,
    /// Owning process ID.
    pub process_id: u32,
    /// Owning process name, without the `.exe` suffix.
    pub process_name: String,
    /// Local address the socket is bound to.
    pub local_address: String,
    /// Remote endpoint, for established connections only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_address: Option<String>,
    /// Connection state (`LISTENING` for TCP listeners, none for UDP).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Executable path, when the process could be inspected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_path: Option<String>,
    /// Process start time, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Set by the classifier; never true for a binding returned to a caller.
    pub is_system_process: bool,
}

impl PortBinding {
    /// Get the formatted port number for display (e.g., ":3000").
    pub fn display_port(&self) -> String {
        format!(":{}", self.port)
    }

    /// Check if this binding matches a search query.
    pub fn matches_search(&self, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }
        let query_lower = query.to_lowercase();
        self.process_name.to_lowercase().contains(&query_lower)
            || self.port.to_string().contains(&query_lower)
            || self.process_id.to_string().contains(&query_lower)
            || self.local_address.to_lowercase().contains(&query_lower)
    }
}

impl std::fmt::Display for PortBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{} - {} (PID: {})",
            self.protocol, self.port, self.process_name, self.process_id
        )
    }
}

// ============================================================================
// Ordering
// ============================================================================

/// Newest process first; unknown start times sort last. Ties go to the lower port.
pub fn newest_first(a: &PortBinding, b: &PortBinding) -> Ordering {
    // `None < Some(_)`, so the reversed comparison puts unknown times at the end.
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| a.port.cmp(&b.port))
}

/// Display order: [`newest_first`], then protocol ordinal for full determinism.
pub fn display_order(a: &PortBinding, b: &PortBinding) -> Ordering {
    newest_first(a, b).then_with(|| a.protocol.cmp(&b.protocol))
}

// ============================================================================
// ProcessRecord
// ============================================================================

/// Process metadata gathered for a single resolution.
///
/// Built fresh for every lookup and never cached: the process table can
/// change between calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessRecord {
    pub name: String,
    pub path: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub is_system_process: bool,
}

impl ProcessRecord {
    /// Name reported when the process could not be inspected at all.
    pub const UNKNOWN_NAME: &'static str = "Unknown";

    /// Fail-safe record for a process that could not be inspected.
    ///
    /// Marked as a system process so it is never offered for termination.
    pub fn unknown() -> Self {
        Self {
            name: Self::UNKNOWN_NAME.to_string(),
            path: None,
            start_time: None,
            is_system_process: true,
        }
    }
}

/// Drop a trailing `.exe` (any case) from a process image name.
pub fn strip_exe_suffix(name: &str) -> &str {
    match name.len().checked_sub(4) {
        Some(cut) if name.get(cut..).is_some_and(|ext| ext.eq_ignore_ascii_case(".exe")) => {
            &name[..cut]
        }
        _ => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn binding(port: u16, protocol: Protocol, created_secs: Option<i64>) -> PortBinding {
        PortBinding {
            port,
            protocol,
            process_id: 1234,
            process_name: "node".to_string(),
            local_address: "0.0.0.0".to_string(),
            remote_address: None,
            state: Some("LISTENING".to_string()),
            process_path: None,
            created_at: created_secs.map(|s| Utc.timestamp_opt(s, 0).unwrap()),
            is_system_process: false,
        }
    }

    #[test]
    fn test_display() {
        let b = binding(3000, Protocol::TcpV6, None);
        assert_eq!(b.to_string(), "TCPv6:3000 - node (PID: 1234)");
        assert_eq!(b.display_port(), ":3000");
    }

    #[test]
    fn test_newest_first_puts_unknown_last() {
        let mut bindings = vec![
            binding(80, Protocol::Tcp, None),
            binding(9000, Protocol::Tcp, Some(100)),
            binding(3000, Protocol::Tcp, Some(200)),
            binding(22, Protocol::Tcp, None),
        ];
        bindings.sort_by(newest_first);

        let ports: Vec<u16> = bindings.iter().map(|b| b.port).collect();
        assert_eq!(ports, vec![3000, 9000, 22, 80]);
    }

    #[test]
    fn test_display_order_breaks_ties_by_protocol() {
        let mut bindings = vec![
            binding(5353, Protocol::UdpV6, Some(100)),
            binding(5353, Protocol::Udp, Some(100)),
            binding(5353, Protocol::Tcp, Some(100)),
        ];
        bindings.sort_by(display_order);

        let protocols: Vec<Protocol> = bindings.iter().map(|b| b.protocol).collect();
        assert_eq!(protocols, vec![Protocol::Tcp, Protocol::Udp, Protocol::UdpV6]);
    }

    #[test]
    fn test_matches_search() {
        let b = binding(3000, Protocol::Tcp, None);
        assert!(b.matches_search(""));
        assert!(b.matches_search("NODE"));
        assert!(b.matches_search("300"));
        assert!(!b.matches_search("python"));
    }

    #[test]
    fn test_strip_exe_suffix() {
        assert_eq!(strip_exe_suffix("node.exe"), "node");
        assert_eq!(strip_exe_suffix("NODE.EXE"), "NODE");
        assert_eq!(strip_exe_suffix("System"), "System");
        assert_eq!(strip_exe_suffix(".exe"), "");
        assert_eq!(strip_exe_suffix("exe"), "exe");
        assert_eq!(strip_exe_suffix("caf\u{e9}"), "caf\u{e9}");
    }

    #[test]
    fn test_unknown_record_is_protected() {
        let record = ProcessRecord::unknown();
        assert_eq!(record.name, "Unknown");
        assert!(record.path.is_none());
        assert!(record.start_time.is_none());
        assert!(record.is_system_process);
    }

    #[test]
    fn test_serialization_uses_camel_case() {
        let json = serde_json::to_value(binding(3000, Protocol::Tcp, None)).unwrap();
        assert_eq!(json["processId"], 1234);
        assert_eq!(json["protocol"], "TCP");
        assert!(json.get("remoteAddress").is_none());
    }
}
