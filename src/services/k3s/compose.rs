//! Translation of install options into K3s setup script arguments

use crate::apis::{ALL_CONTROLLERS, InstallArgs};

/// Convert install args into the arguments passed to the K3s setup script
pub fn compose_args(args: &InstallArgs) -> Vec<String> {
    let mut shell_args = Vec::new();
    if !args.db_endpoint.is_empty() {
        shell_args.push(format!("--datastore-endpoint={}", args.db_endpoint));
    }
    if !args.bind_ip.is_empty() {
        shell_args.push(format!("--tls-san={}", args.bind_ip));
    }
    if !args.token.is_empty() {
        shell_args.push(format!("--token={}", args.token));
    }
    if args.controllers != ALL_CONTROLLERS {
        shell_args.push(format!(
            "--kube-controller-manager-arg=controllers={}",
            args.controllers
        ));
        // Traefik installs itself through a Job
        if !has_controller(&args.controllers, "job") {
            shell_args.push("--disable".to_string());
            shell_args.push("traefik".to_string());
        }
    }
    shell_args
}

/// Whether `controller` runs under a kube-controller-manager `--controllers`
/// list: `name` enables it, `-name` disables it, `*` enables the rest
pub fn has_controller(controllers: &str, controller: &str) -> bool {
    let entries: Vec<&str> = controllers.split(',').map(str::trim).collect();
    for entry in &entries {
        if *entry == controller {
            return true;
        }
        if entry.strip_prefix('-') == Some(controller) {
            return false;
        }
    }
    entries.contains(&ALL_CONTROLLERS)
}
