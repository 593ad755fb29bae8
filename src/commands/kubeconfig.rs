use crate::apis::KubeconfigArgs;
use crate::config::Paths;
use crate::services::k3s::KubeconfigManager;
use anyhow::{Context, Result};
use std::io;

/// Handle kubeconfig command
pub fn handle_kubeconfig(paths: &Paths, args: &KubeconfigArgs) -> Result<()> {
    let variant = args.variant().context("validate kubeconfig args")?;
    let mut stdout = io::stdout().lock();
    KubeconfigManager::new(paths).print(variant, &mut stdout)
}
