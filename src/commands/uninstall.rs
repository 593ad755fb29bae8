use crate::orchestrator::Orchestrator;
use crate::utils::ensure_linux;
use anyhow::{Context, Result};

/// Handle uninstall command
pub fn handle_uninstall(orchestrator: &Orchestrator<'_>, name: &str) -> Result<()> {
    ensure_linux("uninstall")?;

    let removed = orchestrator
        .uninstall(name)
        .context("Failed to uninstall KubeVela control plane")?;
    if removed {
        println!();
        println!("✓ Successfully uninstall KubeVela control plane!");
    }
    Ok(())
}
