// VelaD Library
// Sets up a KubeVela control plane air-gapped, on top of K3s

pub mod apis;
pub mod artifacts;
pub mod cleanup;
mod cli_types;
pub mod commands;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod services;
pub mod stager;
pub mod utils;
pub mod version;

#[cfg(test)]
mod testing;

pub use cli_types::{Commands, LoadBalancerCommands};
pub use commands::handle_command;
pub use orchestrator::{InstallReport, Orchestrator};
