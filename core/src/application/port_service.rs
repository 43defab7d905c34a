//! Port listing and termination service.

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::Config;
use crate::domain::{display_order, PortBinding, TerminationOutcome};
use crate::error::{Error, Result};
use crate::platform::{self, PlatformDiscovery, PlatformProcessManager};
use crate::ports::{PortDiscovery, ProcessManagement};

/// Facade over port discovery and process management.
///
/// Holds no state between calls; every listing is a fresh scan.
pub struct PortKillerService<D, P> {
    discovery: D,
    processes: P,
}

impl PortKillerService<PlatformDiscovery, PlatformProcessManager> {
    /// Wire the capabilities of the current host.
    ///
    /// Fails with [`Error::PlatformUnsupported`] on hosts without an
    /// implementation.
    // Off Windows the capability types have no values, so `Self::new` is never reached.
    #[cfg_attr(not(windows), allow(unreachable_code))]
    pub fn for_current_platform(config: &Config) -> Result<Self> {
        Ok(Self::new(
            platform::create_port_discovery(config)?,
            platform::create_process_manager(config)?,
        ))
    }
}

impl<D: PortDiscovery, P: ProcessManagement> PortKillerService<D, P> {
    pub fn new(discovery: D, processes: P) -> Self {
        Self {
            discovery,
            processes,
        }
    }

    /// List active bindings, newest process first.
    ///
    /// Equal or unknown start times fall back to port, then protocol.
    pub async fn get_active_ports(&self, cancel: &CancellationToken) -> Result<Vec<PortBinding>> {
        let mut bindings = self.discovery.discover(cancel).await?;
        bindings.sort_by(display_order);
        debug!(count = bindings.len(), "Active ports listed");
        Ok(bindings)
    }

    /// Bindings on `port`, in display order.
    pub async fn find_by_port(
        &self,
        port: u16,
        cancel: &CancellationToken,
    ) -> Result<Vec<PortBinding>> {
        let bindings = self.get_active_ports(cancel).await?;
        Ok(bindings.into_iter().filter(|b| b.port == port).collect())
    }

    /// Terminate the process that owns `binding`.
    pub async fn terminate_process(
        &self,
        binding: &PortBinding,
        cancel: &CancellationToken,
    ) -> Result<TerminationOutcome> {
        check_binding(binding)?;
        debug!(pid = binding.process_id, port = binding.port, "Terminating binding owner");
        self.processes.terminate(binding.process_id, cancel).await
    }

    /// Advisory permission check for `binding`'s owner.
    pub fn can_terminate_process(&self, binding: &PortBinding) -> Result<bool> {
        check_binding(binding)?;
        Ok(self.processes.can_terminate(binding.process_id))
    }
}

fn check_binding(binding: &PortBinding) -> Result<()> {
    if binding.process_id == 0 {
        return Err(Error::InvalidArgument(format!(
            "binding {} has no owning process",
            binding.display_port()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Protocol;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio_test::{assert_err, assert_ok};

    /// Mock discovery for testing.
    struct MockDiscovery {
        bindings: Vec<PortBinding>,
    }

    impl PortDiscovery for MockDiscovery {
        async fn discover(&self, cancel: &CancellationToken) -> Result<Vec<PortBinding>> {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            Ok(self.bindings.clone())
        }
    }

    /// Mock process manager that records terminated PIDs.
    #[derive(Default)]
    struct MockProcesses {
        terminated: Mutex<Vec<u32>>,
        probes: AtomicUsize,
        denied: bool,
    }

    impl ProcessManagement for MockProcesses {
        async fn terminate(&self, pid: u32, _cancel: &CancellationToken) -> Result<TerminationOutcome> {
            if self.denied {
                return Ok(TerminationOutcome::access_denied(pid));
            }
            self.terminated.lock().unwrap().push(pid);
            Ok(TerminationOutcome::succeeded(pid))
        }

        fn can_terminate(&self, _pid: u32) -> bool {
            self.probes.fetch_add(1, Ordering::SeqCst);
            !self.denied
        }
    }

    fn binding(port: u16, protocol: Protocol, pid: u32, created_secs: Option<i64>) -> PortBinding {
        PortBinding {
            port,
            protocol,
            process_id: pid,
            process_name: format!("app{}", pid),
            local_address: "0.0.0.0".to_string(),
            remote_address: None,
            state: Some("LISTENING".to_string()),
            process_path: None,
            created_at: created_secs.map(|s| Utc.timestamp_opt(s, 0).unwrap()),
            is_system_process: false,
        }
    }

    fn service(
        bindings: Vec<PortBinding>,
        processes: MockProcesses,
    ) -> PortKillerService<MockDiscovery, MockProcesses> {
        PortKillerService::new(MockDiscovery { bindings }, processes)
    }

    #[tokio::test]
    async fn test_get_active_ports_sorted() {
        let service = service(
            vec![
                binding(8080, Protocol::Udp, 10, Some(100)),
                binding(3000, Protocol::Tcp, 11, None),
                binding(8080, Protocol::Tcp, 12, Some(100)),
                binding(5432, Protocol::Tcp, 13, Some(900)),
                binding(80, Protocol::TcpV6, 14, None),
            ],
            MockProcesses::default(),
        );

        let ports = service.get_active_ports(&CancellationToken::new()).await.unwrap();
        let order: Vec<u32> = ports.iter().map(|b| b.process_id).collect();
        assert_eq!(order, vec![13, 12, 10, 14, 11]);
    }

    #[tokio::test]
    async fn test_cancellation_propagates() {
        let service = service(vec![binding(3000, Protocol::Tcp, 11, None)], MockProcesses::default());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = service.get_active_ports(&cancel).await;
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[tokio::test]
    async fn test_find_by_port() {
        let service = service(
            vec![
                binding(3000, Protocol::Tcp, 11, None),
                binding(3000, Protocol::TcpV6, 11, None),
                binding(8080, Protocol::Tcp, 12, None),
            ],
            MockProcesses::default(),
        );
        let cancel = CancellationToken::new();

        assert_eq!(service.find_by_port(3000, &cancel).await.unwrap().len(), 2);
        assert!(service.find_by_port(9999, &cancel).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_terminate_delegates_by_pid() {
        let service = service(Vec::new(), MockProcesses::default());
        let target = binding(3000, Protocol::Tcp, 4521, None);

        let outcome = assert_ok!(
            service
                .terminate_process(&target, &CancellationToken::new())
                .await
        );
        assert!(outcome.success);
        assert_eq!(*service.processes.terminated.lock().unwrap(), vec![4521]);
    }

    #[tokio::test]
    async fn test_permission_failure_is_an_outcome() {
        let service = service(
            Vec::new(),
            MockProcesses {
                denied: true,
                ..MockProcesses::default()
            },
        );
        let target = binding(3000, Protocol::Tcp, 4521, None);

        assert!(!service.can_terminate_process(&target).unwrap());
        let outcome = service
            .terminate_process(&target, &CancellationToken::new())
            .await
            .unwrap();
        assert!(outcome.is_permission_denied);
    }

    #[tokio::test]
    async fn test_ownerless_binding_is_rejected() {
        let service = service(Vec::new(), MockProcesses::default());
        let orphan = binding(3000, Protocol::Tcp, 0, None);

        let err = assert_err!(service.terminate_process(&orphan, &CancellationToken::new()).await);
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(matches!(
            service.can_terminate_process(&orphan),
            Err(Error::InvalidArgument(_))
        ));
        assert!(service.processes.terminated.lock().unwrap().is_empty());
        assert_eq!(service.processes.probes.load(Ordering::SeqCst), 0);
    }

    #[cfg(not(windows))]
    #[test]
    fn test_for_current_platform_fails_fast() {
        let result = PortKillerService::for_current_platform(&Config::default());
        assert!(matches!(result, Err(Error::PlatformUnsupported(_))));
    }
}
