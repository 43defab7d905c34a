//! Protected ("system") process classification.
//!
//! Termination cannot be undone, so every ambiguous case classifies as
//! protected. The decision is an ordered rule chain; the first rule that
//! matches wins.

use std::sync::Arc;

use tracing::debug;

use crate::domain::strip_exe_suffix;
use crate::ports::{InspectError, ProcessInspector};

/// PIDs at or below this value belong to the kernel (Idle = 0, System = 4).
const MAX_RESERVED_PID: u32 = 4;

/// Core OS processes that must never be offered for termination.
const PROTECTED_NAMES: &[&str] = &[
    "System",
    "Registry",
    "smss",
    "csrss",
    "wininit",
    "services",
    "lsass",
    "winlogon",
    "svchost",
    "dwm",
    "explorer",
    "taskhostw",
    "RuntimeBroker",
    "ApplicationFrameHost",
    "ShellExperienceHost",
    "SearchUI",
    "SearchApp",
    "StartMenuExperienceHost",
    "SystemSettings",
    "dllhost",
    "conhost",
    "fontdrvhost",
    "WUDFHost",
    "Memory Compression",
    "Secure System",
    "ntoskrnl",
    "audiodg",
];

/// Executables under these prefixes belong to the OS.
const PROTECTED_PATH_PREFIXES: &[&str] = &[
    r"C:\Windows\System32",
    r"C:\Windows\SysWOW64",
    r"C:\Windows\explorer.exe",
    r"C:\Windows\SystemApps",
];

/// One step of the classification chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    ReservedPid,
    ProtectedName,
    ProtectedPath,
    ModuleProbe,
}

const RULE_CHAIN: [Rule; 4] = [
    Rule::ReservedPid,
    Rule::ProtectedName,
    Rule::ProtectedPath,
    Rule::ModuleProbe,
];

/// Check a process name against the protected set (case-insensitive, `.exe` optional).
pub fn is_protected_name(name: &str) -> bool {
    let name = strip_exe_suffix(name);
    PROTECTED_NAMES
        .iter()
        .any(|protected| protected.eq_ignore_ascii_case(name))
}

/// Check an executable path against the protected prefixes (case-insensitive).
pub fn is_protected_path(path: &str) -> bool {
    PROTECTED_PATH_PREFIXES.iter().any(|prefix| {
        path.get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    })
}

/// Decides whether a process is protected from termination.
pub struct SystemProcessClassifier<I> {
    inspector: Arc<I>,
}

impl<I> Clone for SystemProcessClassifier<I> {
    fn clone(&self) -> Self {
        Self {
            inspector: Arc::clone(&self.inspector),
        }
    }
}

impl<I: ProcessInspector> SystemProcessClassifier<I> {
    pub fn new(inspector: Arc<I>) -> Self {
        Self { inspector }
    }

    /// Whether the process must not be offered for termination.
    pub fn is_protected(&self, pid: u32, name: &str, path: Option<&str>) -> bool {
        match RULE_CHAIN
            .iter()
            .find(|rule| self.rule_matches(**rule, pid, name, path))
        {
            Some(rule) => {
                debug!(pid = pid, name = name, rule = ?rule, "Process is protected");
                true
            }
            None => false,
        }
    }

    fn rule_matches(&self, rule: Rule, pid: u32, name: &str, path: Option<&str>) -> bool {
        match rule {
            Rule::ReservedPid => pid <= MAX_RESERVED_PID,
            Rule::ProtectedName => is_protected_name(name),
            Rule::ProtectedPath => path.is_some_and(is_protected_path),
            Rule::ModuleProbe => self.probe_fails(pid),
        }
    }

    /// Re-inspect the primary module. Anything short of a readable,
    /// non-system module counts as a failure.
    fn probe_fails(&self, pid: u32) -> bool {
        match self.inspector.main_module_path(pid) {
            Ok(Some(module)) => is_protected_path(&module),
            Ok(None) => true,
            Err(InspectError::AccessDenied) | Err(InspectError::NotFound) => true,
            Err(e) => {
                debug!(pid = pid, error = %e, "Module probe failed");
                true
            }
        }
    }
}
