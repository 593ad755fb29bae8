// Command module routing
//
// To add a new command:
// 1. Create a new file in this directory (e.g., `mycommand.rs`)
// 2. Add `pub mod mycommand;` below
// 3. Add the match arm in `handle_command` function

pub mod install;
pub mod kubeconfig;
pub mod load_balancer;
pub mod token;
pub mod uninstall;
pub mod version;

use crate::error::UsageError;
use crate::orchestrator::Orchestrator;
use crate::{Commands, LoadBalancerCommands};
use anyhow::Result;

/// Argument checks that need no host state, run before any config is read
pub fn check_usage(command: &Commands) -> Result<(), UsageError> {
    match command {
        Commands::LoadBalancer {
            command: LoadBalancerCommands::Install(args),
        } => args.validate(),
        Commands::Kubeconfig(args) => args.variant().map(|_| ()),
        _ => Ok(()),
    }
}

/// Dispatch command to appropriate handler
pub fn handle_command(orchestrator: &Orchestrator<'_>, command: Commands) -> Result<()> {
    match command {
        Commands::Install(args) => install::handle_install(orchestrator, &args)?,
        Commands::LoadBalancer { command } => {
            load_balancer::handle_load_balancer(orchestrator, command)?
        }
        Commands::Kubeconfig(args) => kubeconfig::handle_kubeconfig(orchestrator.paths(), &args)?,
        Commands::Token => token::handle_token(orchestrator.paths())?,
        Commands::Uninstall { name } => uninstall::handle_uninstall(orchestrator, &name)?,
        Commands::Version => version::handle_version(),
    }
    Ok(())
}
