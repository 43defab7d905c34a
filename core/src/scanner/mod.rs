//! Port enumeration.
//!
//! A scan walks three OS listings (TCP connections, TCP listeners, UDP
//! listeners), resolves each entry's owner from one diagnostic capture,
//! describes the owner and drops anything unresolved or protected.
//!
//! # Pipeline
//! 1. `OwnerResolver` - port/protocol to PID
//! 2. `ProcessInfoGatherer` - PID to name, path and start time
//! 3. `SystemProcessClassifier` - protected or terminable

mod classifier;
mod gatherer;
mod resolver;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::domain::{newest_first, AddressFamily, PortBinding, Protocol};
use crate::error::{Error, Result};
use crate::ports::{DiagnosticSource, PortDiscovery, ProcessInspector, SocketTable};

pub use classifier::{is_protected_name, is_protected_path, SystemProcessClassifier};
pub use gatherer::ProcessInfoGatherer;
pub use resolver::{parse_owner_pid, DiagnosticSnapshot, OwnerResolver};

/// State reported for every TCP listener.
pub const LISTENING_STATE: &str = "LISTENING";

/// One row of an OS listing, before its owner is known.
#[derive(Debug, Clone)]
struct SocketEntry {
    local: SocketAddr,
    base: Protocol,
    remote: Option<String>,
    state: Option<String>,
}

/// [`PortDiscovery`] built from a socket table, a diagnostic source and a
/// process inspector.
pub struct PortEnumerator<T, D, I> {
    table: Arc<T>,
    resolver: OwnerResolver<D>,
    gatherer: ProcessInfoGatherer<I>,
}

impl<T, D, I> PortEnumerator<T, D, I>
where
    T: SocketTable + 'static,
    D: DiagnosticSource,
    I: ProcessInspector + 'static,
{
    pub fn new(table: T, source: D, inspector: I) -> Self {
        Self {
            table: Arc::new(table),
            resolver: OwnerResolver::new(source),
            gatherer: ProcessInfoGatherer::new(Arc::new(inspector)),
        }
    }
}

impl<T, D, I> PortDiscovery for PortEnumerator<T, D, I>
where
    T: SocketTable + 'static,
    D: DiagnosticSource,
    I: ProcessInspector + 'static,
{
    async fn discover(&self, cancel: &CancellationToken) -> Result<Vec<PortBinding>> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        // The capture can take seconds on a busy host; dropping it kills the child.
        let snapshot = tokio::select! {
            _ = cancel.cancelled() => {
                debug!("Port enumeration cancelled during diagnostic capture");
                return Err(Error::Cancelled);
            }
            snapshot = self.resolver.snapshot() => snapshot,
        };

        let table = Arc::clone(&self.table);
        let gatherer = self.gatherer.clone();
        let cancel = cancel.clone();

        // Table walks and process inspection block; keep them off the caller's thread.
        let mut bindings = tokio::task::spawn_blocking(move || {
            collect_bindings(table.as_ref(), &gatherer, &snapshot, &cancel)
        })
        .await
        .map_err(|e| Error::Internal(format!("Port enumeration task failed: {}", e)))??;

        bindings.sort_by(newest_first);
        debug!(count = bindings.len(), "Port enumeration complete");
        Ok(bindings)
    }
}

fn list_entries<T: SocketTable>(table: &T) -> Result<Vec<SocketEntry>> {
    let mut entries = Vec::new();

    for connection in table.tcp_connections()? {
        entries.push(SocketEntry {
            local: connection.local,
            base: Protocol::Tcp,
            remote: Some(connection.remote.to_string()),
            state: Some(connection.state),
        });
    }

    for local in table.tcp_listeners()? {
        entries.push(SocketEntry {
            local,
            base: Protocol::Tcp,
            remote: None,
            state: Some(LISTENING_STATE.to_string()),
        });
    }

    for local in table.udp_listeners()? {
        entries.push(SocketEntry {
            local,
            base: Protocol::Udp,
            remote: None,
            state: None,
        });
    }

    Ok(entries)
}

fn collect_bindings<T: SocketTable, I: ProcessInspector>(
    table: &T,
    gatherer: &ProcessInfoGatherer<I>,
    snapshot: &DiagnosticSnapshot,
    cancel: &CancellationToken,
) -> Result<Vec<PortBinding>> {
    let entries = list_entries(table)?;
    let mut bindings = Vec::with_capacity(entries.len());

    for entry in entries {
        if cancel.is_cancelled() {
            debug!("Port enumeration cancelled");
            return Err(Error::Cancelled);
        }

        if let Some(binding) = build_binding(entry, gatherer, snapshot) {
            bindings.push(binding);
        }
    }

    Ok(bindings)
}

/// Build a binding for one entry, or `None` when it must be dropped.
fn build_binding<I: ProcessInspector>(
    entry: SocketEntry,
    gatherer: &ProcessInfoGatherer<I>,
    snapshot: &DiagnosticSnapshot,
) -> Option<PortBinding> {
    let port = entry.local.port();

    let process_id = snapshot.owner_of(port, entry.base);
    if process_id == 0 {
        debug!(port = port, protocol = %entry.base, "No owner resolved, dropping entry");
        return None;
    }

    let record = gatherer.describe(process_id);
    if record.is_system_process {
        debug!(port = port, pid = process_id, name = %record.name, "Skipping protected process");
        return None;
    }

    if record.name.is_empty() {
        warn!(port = port, pid = process_id, "Process has an empty name, dropping entry");
        return None;
    }

    Some(PortBinding {
        port,
        protocol: Protocol::resolve(entry.base, AddressFamily::of(&entry.local)),
        process_id,
        process_name: record.name,
        local_address: entry.local.ip().to_string(),
        remote_address: entry.remote,
        state: entry.state,
        process_path: record.path,
        created_at: record.start_time,
        is_system_process: false,
    })
}
