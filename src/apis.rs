//! Command arguments shared by the CLI and the services

use crate::error::UsageError;
use clap::{ArgAction, Args};
use std::path::PathBuf;

/// Controller list that enables every kube-controller-manager controller
pub const ALL_CONTROLLERS: &str = "*";

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct InstallArgs {
    /// If set, start cluster without installing vela-core, typically used when restarting a control plane where vela-core has been installed
    #[arg(long)]
    pub cluster_only: bool,
    /// Use an external database to store control plane metadata
    #[arg(long = "database-endpoint", default_value = "")]
    pub db_endpoint: String,
    /// Bind additional hostname or IP in the kubeconfig TLS cert
    #[arg(long, default_value = "")]
    pub bind_ip: String,
    /// Token for identifying the cluster. Can be used to restart the control plane or register other nodes. Generated if not set
    #[arg(long, default_value = "")]
    pub token: String,
    /// Comma separated list of controllers to enable, same syntax as kube-controller-manager --controllers
    #[arg(long, default_value = ALL_CONTROLLERS)]
    pub controllers: String,
    /// The name of the cluster. Only used for container-hosted control planes
    #[arg(long, default_value = "default")]
    pub name: String,
    #[command(flatten)]
    pub chart: ChartArgs,
}

impl Default for InstallArgs {
    fn default() -> Self {
        Self {
            cluster_only: false,
            db_endpoint: String::new(),
            bind_ip: String::new(),
            token: String::new(),
            controllers: ALL_CONTROLLERS.to_string(),
            name: "default".to_string(),
            chart: ChartArgs::default(),
        }
    }
}

/// Arguments forwarded to `vela install`
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ChartArgs {
    /// Set values on the command line (can specify multiple or separate values with commas: key1=val1,key2=val2)
    #[arg(long = "set", value_name = "K=V")]
    pub values: Vec<String>,
    /// Namespace scope for installing KubeVela Core
    #[arg(short = 'n', long, default_value = "vela-system")]
    pub namespace: String,
    /// Show detail log of installation
    #[arg(short = 'd', long, default_value_t = true, action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true")]
    pub detail: bool,
    /// Re-use the user's last supplied values
    #[arg(short = 'r', long, default_value_t = true, action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true")]
    pub reuse: bool,
}

impl Default for ChartArgs {
    fn default() -> Self {
        Self {
            values: Vec::new(),
            namespace: "vela-system".to_string(),
            detail: true,
            reuse: true,
        }
    }
}

#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct KubeconfigArgs {
    /// The name of the cluster. Only used for container-hosted control planes
    #[arg(short = 'n', long, default_value = "default")]
    pub name: String,
    /// Print kubeconfig used inside the container network
    #[arg(long)]
    pub internal: bool,
    /// Print kubeconfig that can be used on other machines
    #[arg(long)]
    pub external: bool,
    /// Print kubeconfig path that can be used on this machine
    #[arg(long)]
    pub host: bool,
}

/// Which kubeconfig the `kubeconfig` command prints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KubeconfigVariant {
    Local,
    Internal,
    External,
    Host,
}

impl KubeconfigArgs {
    /// Resolve the selector flags, rejecting more than one
    pub fn variant(&self) -> Result<KubeconfigVariant, UsageError> {
        let selected: Vec<(&str, KubeconfigVariant)> = [
            ("--internal", self.internal, KubeconfigVariant::Internal),
            ("--external", self.external, KubeconfigVariant::External),
            ("--host", self.host, KubeconfigVariant::Host),
        ]
        .into_iter()
        .filter(|(_, set, _)| *set)
        .map(|(flag, _, variant)| (flag, variant))
        .collect();

        match selected.as_slice() {
            [] => Ok(KubeconfigVariant::Local),
            [(_, variant)] => Ok(*variant),
            many => Err(UsageError::ConflictingKubeconfigFlags(
                many.iter()
                    .map(|(flag, _)| *flag)
                    .collect::<Vec<_>>()
                    .join(" "),
            )),
        }
    }
}

#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadBalancerArgs {
    /// Host IPs of control plane nodes installed by velad, can be repeated or comma separated: IP1,IP2
    #[arg(long = "host", value_delimiter = ',')]
    pub hosts: Vec<String>,
    /// Nginx configuration file to write, overwritten if it exists
    #[arg(short = 'c', long = "conf")]
    pub configuration: Option<PathBuf>,
}

impl LoadBalancerArgs {
    pub fn validate(&self) -> Result<(), UsageError> {
        if self.hosts.is_empty() {
            return Err(UsageError::NoHosts);
        }
        Ok(())
    }
}
