//! Diagnostic text source port (interface).

/// Port for the external command whose connection table maps ports to PIDs.
pub trait DiagnosticSource: Send + Sync {
    /// Capture the full text output.
    ///
    /// Returns an empty string when the command cannot be run; callers
    /// treat that as "no owner found", never as an error.
    fn capture(&self) -> impl std::future::Future<Output = String> + Send;
}
