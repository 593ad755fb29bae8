//! Install and uninstall flows
//!
//! The orchestrator owns step ordering and failure policy. It holds its
//! collaborators explicitly so each command receives the same handler value
//! and tests can hand in fakes.

use crate::apis::InstallArgs;
use crate::artifacts::ArtifactProvider;
use crate::cleanup::CleanupGuard;
use crate::config::Paths;
use crate::services::k3s::{self, ClusterInstaller, KubeconfigManager};
use crate::services::vela::{self, ChartInstaller};
use crate::stager::ResourceStager;
use crate::utils::exec::ProcessRunner;
use anyhow::{Context, Result};
use std::fs;
use std::io;

/// Outcome of a successful install
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub chart_installed: bool,
    /// Failures that were reported but did not fail the install
    pub warnings: Vec<String>,
}

pub struct Orchestrator<'a> {
    artifacts: &'a dyn ArtifactProvider,
    runner: &'a dyn ProcessRunner,
    charts: &'a dyn ChartInstaller,
    paths: &'a Paths,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        artifacts: &'a dyn ArtifactProvider,
        runner: &'a dyn ProcessRunner,
        charts: &'a dyn ChartInstaller,
        paths: &'a Paths,
    ) -> Self {
        Self {
            artifacts,
            runner,
            charts,
            paths,
        }
    }

    pub fn runner(&self) -> &'a dyn ProcessRunner {
        self.runner
    }

    pub fn paths(&self) -> &'a Paths {
        self.paths
    }

    fn stager(&self) -> ResourceStager<'a> {
        ResourceStager::new(self.artifacts, self.runner, self.paths)
    }

    /// Bring up the control plane and deploy vela-core on it.
    ///
    /// Every step up to loading images aborts the install on failure. The
    /// chart install is best effort: cluster bring-up is what this command
    /// promises, and `vela install` can be retried by hand.
    pub fn install(&self, args: &InstallArgs) -> Result<InstallReport> {
        let mut cleanup = CleanupGuard::new();
        let stager = self.stager();
        let mut report = InstallReport::default();

        // Step 1: K3s as control plane cluster
        ClusterInstaller::new(&stager, self.runner)
            .setup(args, &mut cleanup)
            .context("Fail to set up cluster")?;

        // Step 2: kubeconfig
        let kubeconfig = KubeconfigManager::new(self.paths);
        kubeconfig
            .derive_remote(&args.bind_ip)
            .context("Fail to generate kubeconfig")?;
        kubeconfig
            .install_default()
            .context("Fail to set kubeconfig")?;

        // Step 3: vela CLI
        vela::link_cli(&stager, self.paths).context("Fail to link vela CLI")?;

        // Step 4: vela-core images
        vela::load_images(&stager, self.runner, self.paths, &mut cleanup)
            .context("Fail to load vela images")?;

        if args.cluster_only {
            return Ok(report);
        }

        // Step 5: vela-core chart and VelaUX addon
        let chart = vela::prepare_chart(&stager, &mut cleanup)
            .context("Fail to prepare vela chart")?;
        vela::prepare_ux(&stager, self.paths).context("Fail to prepare vela UX")?;

        // Step 6: vela-core
        println!("Installing vela-core Helm chart...");
        match self.charts.install(&vela::chart_install_args(args, &chart)) {
            Ok(()) => report.chart_installed = true,
            Err(e) => {
                let warning = format!(
                    "Didn't install vela-core in control plane: {:#}. You can try \"vela install\" later",
                    e
                );
                eprintln!("⚠️  Warning: {}", warning);
                report.warnings.push(warning);
            }
        }

        Ok(report)
    }

    /// Tear down the control plane called `name`.
    ///
    /// K3s runs directly on this host, so there is exactly one control plane
    /// and `name` only shows up in logs. Returns `false` if nothing was
    /// installed.
    pub fn uninstall(&self, name: &str) -> Result<bool> {
        log::debug!("uninstalling control plane {}", name);
        let removed = k3s::uninstall(self.runner, self.paths)?;
        if !removed {
            return Ok(false);
        }

        if let Err(e) = vela::unlink_cli(self.paths) {
            eprintln!("⚠️  Warning: {:#}", e);
        }
        match fs::remove_file(&self.paths.external_kubeconfig) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => eprintln!(
                "⚠️  Warning: Failed to remove {}: {}",
                self.paths.external_kubeconfig.display(),
                e
            ),
            _ => {}
        }
        Ok(true)
    }
}
