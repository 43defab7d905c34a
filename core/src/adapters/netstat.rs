//! Diagnostic connection table from an external command (`netstat -ano`).

use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::Config;
use crate::ports::DiagnosticSource;

/// Keeps the console window hidden when spawning from a GUI process.
#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// [`DiagnosticSource`] that runs a command and returns its stdout.
#[derive(Debug, Clone)]
pub struct NetstatCommand {
    program: String,
    args: Vec<String>,
}

impl NetstatCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.diagnostic_command.clone(), config.diagnostic_args.clone())
    }
}

impl Default for NetstatCommand {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl DiagnosticSource for NetstatCommand {
    async fn capture(&self) -> String {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        #[cfg(windows)]
        command.creation_flags(CREATE_NO_WINDOW);

        let output = match command.output().await {
            Ok(output) => output,
            Err(e) => {
                warn!(program = %self.program, error = %e, "Failed to run diagnostic command");
                return String::new();
            }
        };

        if !output.status.success() {
            debug!(program = %self.program, status = %output.status, "Diagnostic command exited with failure");
        }

        String::from_utf8_lossy(&output.stdout).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_program_yields_empty_text() {
        let source = NetstatCommand::new("rbportkiller-no-such-program", vec![]);
        assert_eq!(source.capture().await, "");
    }

    #[test]
    fn test_from_config() {
        let source = NetstatCommand::default();
        assert_eq!(source.program, "netstat");
        assert_eq!(source.args, vec!["-ano"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_captures_stdout() {
        let source = NetstatCommand::new(
            "echo",
            vec!["TCP 0.0.0.0:3000 0.0.0.0:0 LISTENING 4521".to_string()],
        );
        let text = source.capture().await;
        assert!(text.contains("LISTENING 4521"));
    }

    #[cfg(windows)]
    #[tokio::test]
    async fn test_captures_stdout() {
        let source = NetstatCommand::new(
            "cmd",
            vec![
                "/C".to_string(),
                "echo TCP 0.0.0.0:3000 0.0.0.0:0 LISTENING 4521".to_string(),
            ],
        );
        let text = source.capture().await;
        assert!(text.contains("LISTENING 4521"));
    }
}
