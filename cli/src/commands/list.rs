//! List command - show ports and the processes holding them.

use anyhow::Result;
use chrono::Local;
use rbportkiller_core::{
    CancellationToken, PortBinding, PortDiscovery, PortKillerService, ProcessManagement,
};

/// Filters applied to the listing.
#[derive(Debug, Default)]
pub struct Filter {
    pub port: Option<u16>,
    pub name: Option<String>,
    pub search: Option<String>,
}

impl Filter {
    fn keeps(&self, binding: &PortBinding) -> bool {
        if self.port.is_some_and(|p| binding.port != p) {
            return false;
        }
        if let Some(ref name) = self.name {
            if !binding
                .process_name
                .to_lowercase()
                .contains(&name.to_lowercase())
            {
                return false;
            }
        }
        self.search
            .as_deref()
            .map_or(true, |query| binding.matches_search(query))
    }
}

pub async fn run<D: PortDiscovery, P: ProcessManagement>(
    service: &PortKillerService<D, P>,
    cancel: &CancellationToken,
    filter: &Filter,
    json: bool,
) -> Result<()> {
    let mut bindings = service.get_active_ports(cancel).await?;
    bindings.retain(|binding| filter.keeps(binding));

    if json {
        println!("{}", serde_json::to_string_pretty(&bindings)?);
        return Ok(());
    }

    if bindings.is_empty() {
        println!("No active ports found.");
        return Ok(());
    }

    // Table header
    println!(
        "{:<6} {:<6} {:<8} {:<20} {:<22} {:<12} STARTED",
        "PROTO", "PORT", "PID", "PROCESS", "ADDRESS", "STATE"
    );
    println!("{}", "-".repeat(90));

    for binding in &bindings {
        println!(
            "{:<6} {:<6} {:<8} {:<20} {:<22} {:<12} {}",
            binding.protocol,
            binding.port,
            binding.process_id,
            truncate(&binding.process_name, 20),
            truncate(&address(binding), 22),
            binding.state.as_deref().unwrap_or("-"),
            started(binding),
        );
    }

    println!("\nTotal: {} ports", bindings.len());
    Ok(())
}

fn address(binding: &PortBinding) -> String {
    match &binding.remote_address {
        Some(remote) => format!("{} -> {}", binding.local_address, remote),
        None => binding.local_address.clone(),
    }
}

fn started(binding: &PortBinding) -> String {
    binding
        .created_at
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max - 1).collect();
        format!("{}…", head)
    }
}
