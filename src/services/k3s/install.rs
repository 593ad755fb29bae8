//! K3s control plane bring-up from staged artifacts

use super::compose::compose_args;
use crate::apis::InstallArgs;
use crate::cleanup::CleanupGuard;
use crate::stager::ResourceStager;
use crate::utils::exec::{CommandSpec, ProcessRunner, run_echoed};
use crate::utils::path_arg;
use anyhow::{Context, Result};

/// Tells the setup script that binary and images are already in place
pub const SKIP_DOWNLOAD_ENV: &str = "INSTALL_K3S_SKIP_DOWNLOAD";

pub struct ClusterInstaller<'a> {
    stager: &'a ResourceStager<'a>,
    runner: &'a dyn ProcessRunner,
}

impl<'a> ClusterInstaller<'a> {
    pub fn new(stager: &'a ResourceStager<'a>, runner: &'a dyn ProcessRunner) -> Self {
        Self { stager, runner }
    }

    /// Stage script, binary and images, then run the setup script.
    ///
    /// Whether re-running on a configured node restarts or reconfigures it is
    /// up to the script; only its exit status is interpreted here.
    pub fn setup(&self, args: &InstallArgs, cleanup: &mut CleanupGuard) -> Result<()> {
        println!("Preparing cluster setup script...");
        let script = self
            .stager
            .stage_script(cleanup)
            .context("Fail to prepare k3s setup script")?;

        println!("Preparing k3s binary...");
        self.stager
            .stage_binary()
            .context("Fail to prepare k3s binary")?;

        println!("Preparing k3s images...");
        self.stager
            .stage_images()
            .context("Fail to prepare k3s images")?;

        println!("Setting up cluster...");
        let setup = CommandSpec::new("/bin/bash")
            .arg(path_arg(&script))
            .args(compose_args(args))
            .env(SKIP_DOWNLOAD_ENV, "true");
        run_echoed(self.runner, &setup).context("K3s install script failed")?;

        println!("✓ K3s control plane is up");
        Ok(())
    }
}
