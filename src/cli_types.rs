// CLI types for the velad binary

use crate::apis::{InstallArgs, KubeconfigArgs, LoadBalancerArgs};
use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Quickly set up a KubeVela control plane, using K3s (Linux only)
    Install(InstallArgs),
    /// Configure load balancer between nodes set up by VelaD
    LoadBalancer {
        #[command(subcommand)]
        command: LoadBalancerCommands,
    },
    /// Print kubeconfig to access the control plane
    Kubeconfig(KubeconfigArgs),
    /// Print control plane token, only works if the control plane has been set up
    Token,
    /// Uninstall the control plane
    Uninstall {
        /// The name of the control plane. Only used for container-hosted control planes
        #[arg(short = 'n', long, default_value = "default")]
        name: String,
    },
    /// Print VelaD build version information
    Version,
}

#[derive(Subcommand)]
pub enum LoadBalancerCommands {
    /// Set up load balancer between nodes set up by VelaD
    Install(LoadBalancerArgs),
    /// Uninstall load balancer installed by VelaD
    Uninstall,
}
