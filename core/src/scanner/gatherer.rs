//! Process metadata gathering.

use std::sync::Arc;

use tracing::debug;

use super::classifier::SystemProcessClassifier;
use crate::domain::ProcessRecord;
use crate::ports::ProcessInspector;

/// Turns a PID into a [`ProcessRecord`], classification included.
pub struct ProcessInfoGatherer<I> {
    inspector: Arc<I>,
    classifier: SystemProcessClassifier<I>,
}

impl<I> Clone for ProcessInfoGatherer<I> {
    fn clone(&self) -> Self {
        Self {
            inspector: Arc::clone(&self.inspector),
            classifier: self.classifier.clone(),
        }
    }
}

impl<I: ProcessInspector> ProcessInfoGatherer<I> {
    pub fn new(inspector: Arc<I>) -> Self {
        Self {
            classifier: SystemProcessClassifier::new(Arc::clone(&inspector)),
            inspector,
        }
    }

    /// Describe a process. Never fails.
    ///
    /// A process whose name cannot be read comes back as
    /// [`ProcessRecord::unknown`], which is protected. Path and start time
    /// are fetched independently, so a denied path lookup still leaves the
    /// start time when it is readable.
    pub fn describe(&self, pid: u32) -> ProcessRecord {
        let name = match self.inspector.process_name(pid) {
            Ok(name) => name,
            Err(e) => {
                debug!(pid = pid, error = %e, "Could not read process name");
                return ProcessRecord::unknown();
            }
        };

        let path = match self.inspector.main_module_path(pid) {
            Ok(path) => path,
            Err(e) => {
                debug!(pid = pid, error = %e, "Could not read executable path");
                None
            }
        };

        let start_time = match self.inspector.start_time(pid) {
            Ok(time) => Some(time),
            Err(e) => {
                debug!(pid = pid, error = %e, "Could not read start time");
                None
            }
        };

        let is_system_process = self.classifier.is_protected(pid, &name, path.as_deref());

        ProcessRecord {
            name,
            path,
            start_time,
            is_system_process,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::InspectError;
    use chrono::{DateTime, TimeZone, Utc};

    struct MockInspector {
        name: Result<String, InspectError>,
        path: Result<Option<String>, InspectError>,
        start: Result<DateTime<Utc>, InspectError>,
    }

    impl ProcessInspector for MockInspector {
        fn process_name(&self, _pid: u32) -> Result<String, InspectError> {
            self.name.clone()
        }

        fn main_module_path(&self, _pid: u32) -> Result<Option<String>, InspectError> {
            self.path.clone()
        }

        fn start_time(&self, _pid: u32) -> Result<DateTime<Utc>, InspectError> {
            self.start.clone()
        }
    }

    fn started() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 1, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_describe_user_process() {
        let gatherer = ProcessInfoGatherer::new(Arc::new(MockInspector {
            name: Ok("node".to_string()),
            path: Ok(Some(r"C:\Program Files\nodejs\node.exe".to_string())),
            start: Ok(started()),
        }));

        let record = gatherer.describe(4521);
        assert_eq!(record.name, "node");
        assert_eq!(record.path.as_deref(), Some(r"C:\Program Files\nodejs\node.exe"));
        assert_eq!(record.start_time, Some(started()));
        assert!(!record.is_system_process);
    }

    #[test]
    fn test_unreadable_process_is_unknown_and_protected() {
        let gatherer = ProcessInfoGatherer::new(Arc::new(MockInspector {
            name: Err(InspectError::NotFound),
            path: Err(InspectError::NotFound),
            start: Err(InspectError::NotFound),
        }));

        assert_eq!(gatherer.describe(4521), ProcessRecord::unknown());
    }

    #[test]
    fn test_denied_path_keeps_start_time() {
        let gatherer = ProcessInfoGatherer::new(Arc::new(MockInspector {
            name: Ok("postgres".to_string()),
            path: Err(InspectError::AccessDenied),
            start: Ok(started()),
        }));

        let record = gatherer.describe(5000);
        assert_eq!(record.name, "postgres");
        assert!(record.path.is_none());
        assert_eq!(record.start_time, Some(started()));
        // The module probe is denied too, so the classifier fails closed.
        assert!(record.is_system_process);
    }

    #[test]
    fn test_protected_name_is_flagged() {
        let gatherer = ProcessInfoGatherer::new(Arc::new(MockInspector {
            name: Ok("svchost".to_string()),
            path: Err(InspectError::AccessDenied),
            start: Err(InspectError::AccessDenied),
        }));

        let record = gatherer.describe(1100);
        assert!(record.is_system_process);
        assert!(record.start_time.is_none());
    }
}
