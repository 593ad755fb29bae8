//! K3s maintenance operations (uninstall)

use crate::config::Paths;
use crate::utils::exec::{CommandSpec, ProcessRunner, run_echoed};
use crate::utils::path_arg;
use anyhow::{Context, Result};

/// Remove K3s with the uninstall script its setup script left behind.
///
/// Returns `false` when there is nothing to uninstall.
pub fn uninstall(runner: &dyn ProcessRunner, paths: &Paths) -> Result<bool> {
    let script = &paths.k3s_uninstall_script;
    if !script.exists() {
        println!("K3s is not installed on this node.");
        return Ok(false);
    }

    println!("Uninstalling K3s server...");
    run_echoed(runner, &CommandSpec::new(path_arg(script)))
        .context("K3s uninstall script failed")?;
    Ok(true)
}
