use crate::LoadBalancerCommands;
use crate::orchestrator::Orchestrator;
use crate::services::load_balancer::LoadBalancerManager;
use crate::utils::ensure_linux;
use anyhow::{Context, Result};

/// Handle load-balancer commands
pub fn handle_load_balancer(
    orchestrator: &Orchestrator<'_>,
    command: LoadBalancerCommands,
) -> Result<()> {
    ensure_linux("Load balancer")?;
    let manager = LoadBalancerManager::new(orchestrator.runner(), orchestrator.paths());

    match command {
        LoadBalancerCommands::Install(args) => {
            manager
                .configure(&args)
                .context("Fail to setup load balancer (nginx)")?;
            println!("✓ Successfully setup load balancer!");
        }
        LoadBalancerCommands::Uninstall => {
            manager
                .teardown()
                .context("Fail to uninstall load balancer (nginx)")?;
            println!("✓ Successfully uninstall load balancer!");
        }
    }
    Ok(())
}
