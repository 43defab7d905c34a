//! Port discovery port (interface).

use tokio_util::sync::CancellationToken;

use crate::domain::PortBinding;
use crate::error::Result;

/// Port for discovering live socket bindings.
///
/// Implementations are per OS family and are built once by the platform
/// dispatcher.
pub trait PortDiscovery: Send + Sync {
    /// List bindings owned by terminable processes.
    ///
    /// Returns `Error::Cancelled` if `cancel` fires mid-scan; a partial
    /// list is never returned.
    fn discover(
        &self,
        cancel: &CancellationToken,
    ) -> impl std::future::Future<Output = Result<Vec<PortBinding>>> + Send;
}
