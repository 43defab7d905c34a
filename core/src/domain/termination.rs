//! Termination outcome model.

use serde::{Deserialize, Serialize};

/// Message reported when a failure is caused by insufficient rights.
pub const ACCESS_DENIED_MESSAGE: &str = "Access denied. Try running as administrator.";

/// Result of one termination attempt.
///
/// Exactly one of `success` and `error_message` is set; construct through
/// [`TerminationOutcome::succeeded`] and [`TerminationOutcome::failed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminationOutcome {
    pub process_id: u32,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Whether the failure was due to insufficient permissions.
    pub is_permission_denied: bool,
}

impl TerminationOutcome {
    pub fn succeeded(process_id: u32) -> Self {
        Self {
            process_id,
            success: true,
            error_message: None,
            is_permission_denied: false,
        }
    }

    pub fn failed(process_id: u32, message: impl Into<String>, is_permission_denied: bool) -> Self {
        Self {
            process_id,
            success: false,
            error_message: Some(message.into()),
            is_permission_denied,
        }
    }

    /// Failure caused by insufficient rights.
    pub fn access_denied(process_id: u32) -> Self {
        Self::failed(process_id, ACCESS_DENIED_MESSAGE, true)
    }
}

impl std::fmt::Display for TerminationOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.error_message {
            None => write!(f, "Process {} terminated", self.process_id),
            Some(message) => write!(f, "Process {}: {}", self.process_id, message),
        }
    }
}
