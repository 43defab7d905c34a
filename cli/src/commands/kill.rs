//! Kill command - terminate every process holding a port.

use std::collections::HashSet;

use anyhow::{bail, Result};
use rbportkiller_core::{
    CancellationToken, PortDiscovery, PortKillerService, ProcessManagement, TerminationOutcome,
};

pub async fn run<D: PortDiscovery, P: ProcessManagement>(
    service: &PortKillerService<D, P>,
    cancel: &CancellationToken,
    port: u16,
    json: bool,
) -> Result<()> {
    let bindings = service.find_by_port(port, cancel).await?;

    if bindings.is_empty() {
        if json {
            println!("[]");
        } else {
            println!("No process found on port {}.", port);
        }
        return Ok(());
    }

    // One attempt per owner, even when it holds the port on several protocols
    let mut seen = HashSet::new();
    let mut outcomes: Vec<TerminationOutcome> = Vec::new();

    for binding in bindings.iter().filter(|b| seen.insert(b.process_id)) {
        if !service.can_terminate_process(binding)? {
            eprintln!(
                "Warning: {} may require administrator rights to terminate.",
                binding
            );
        }

        let outcome = service.terminate_process(binding, cancel).await?;
        if !json {
            if outcome.success {
                println!("Terminated {}", binding);
            } else {
                println!(
                    "Failed to terminate {}: {}",
                    binding,
                    outcome.error_message.as_deref().unwrap_or("unknown error")
                );
            }
        }
        outcomes.push(outcome);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&outcomes)?);
    }

    let failed = outcomes.iter().filter(|o| !o.success).count();
    if failed > 0 {
        bail!("{} of {} process(es) could not be terminated", failed, outcomes.len());
    }
    Ok(())
}
