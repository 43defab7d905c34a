//! Config command - print the effective configuration.

use anyhow::Result;
use rbportkiller_core::platform::{is_supported, platform_name};
use rbportkiller_core::{Config, ConfigStore};

pub fn show(store: &ConfigStore, config: &Config, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(config)?);
        return Ok(());
    }

    println!("Config file:          {}", store.path().display());
    println!(
        "Platform:             {}{}",
        platform_name(),
        if is_supported() { "" } else { " (unsupported)" }
    );
    println!(
        "Diagnostic command:   {} {}",
        config.diagnostic_command,
        config.diagnostic_args.join(" ")
    );
    println!("Termination timeout:  {}s", config.termination_timeout_secs);
    println!("Wait poll interval:   {}ms", config.wait_poll_interval_ms);
    Ok(())
}
