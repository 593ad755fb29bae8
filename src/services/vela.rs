//! KubeVela deployment on top of the control plane
//!
//! Links the vela CLI, loads the vela-core images into the K3s containerd,
//! and installs the vela-core chart through the CLI.

use crate::apis::{ALL_CONTROLLERS, ChartArgs, InstallArgs};
use crate::artifacts::Artifact;
use crate::cleanup::CleanupGuard;
use crate::config::Paths;
use crate::services::k3s::has_controller;
use crate::stager::ResourceStager;
use crate::utils::exec::{CommandSpec, ProcessRunner, run_echoed};
use crate::utils::path_arg;
use crate::version::VELA_VERSION;
use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};

/// Deploys the vela-core chart given the full `vela install` argument list
pub trait ChartInstaller {
    fn install(&self, args: &[String]) -> Result<()>;
}

/// Runs the linked vela CLI against the new control plane
pub struct VelaCliInstaller<'a> {
    runner: &'a dyn ProcessRunner,
    paths: &'a Paths,
}

impl<'a> VelaCliInstaller<'a> {
    pub fn new(runner: &'a dyn ProcessRunner, paths: &'a Paths) -> Self {
        Self { runner, paths }
    }
}

impl ChartInstaller for VelaCliInstaller<'_> {
    fn install(&self, args: &[String]) -> Result<()> {
        let install = CommandSpec::new(path_arg(&self.paths.vela_link))
            .arg("install")
            .args(args.iter().cloned())
            .env("KUBECONFIG", path_arg(&self.paths.kubeconfig));
        run_echoed(self.runner, &install)?;
        Ok(())
    }
}

/// Place the vela CLI and link it into PATH
pub fn link_cli(stager: &ResourceStager<'_>, paths: &Paths) -> Result<()> {
    stager.stage_to(Artifact::VelaCli, &paths.vela_binary, 0o755)?;

    let link = &paths.vela_link;
    match fs::symlink_metadata(link) {
        Ok(_) => fs::remove_file(link)
            .with_context(|| format!("Failed to replace {}", link.display()))?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e).with_context(|| format!("Failed to inspect {}", link.display())),
    }
    if let Some(parent) = link.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    symlink(&paths.vela_binary, link)
        .with_context(|| format!("Failed to link {}", link.display()))?;

    println!("✓ Linked vela CLI at {}", link.display());
    Ok(())
}

/// Import the vela-core images into the K3s containerd
pub fn load_images(
    stager: &ResourceStager<'_>,
    runner: &dyn ProcessRunner,
    paths: &Paths,
    cleanup: &mut CleanupGuard,
) -> Result<()> {
    let archive = stager.stage_temp(Artifact::VelaImages, "vela-images-", ".tar", cleanup)?;
    let import = CommandSpec::new(path_arg(&paths.k3s_binary))
        .args(["ctr", "images", "import"])
        .arg(path_arg(&archive));
    run_echoed(runner, &import).context("Failed to import vela images")?;
    println!("✓ Loaded vela images");
    Ok(())
}

/// Write the vela-core chart to a temporary file and return its path
pub fn prepare_chart(stager: &ResourceStager<'_>, cleanup: &mut CleanupGuard) -> Result<PathBuf> {
    stager.stage_temp(Artifact::VelaChart, "vela-core-", ".tgz", cleanup)
}

/// Place the VelaUX addon where `vela addon enable` finds local addons
pub fn prepare_ux(stager: &ResourceStager<'_>, paths: &Paths) -> Result<PathBuf> {
    let target = paths
        .addon_dir
        .join(format!("velaux-{}.tgz", VELA_VERSION));
    stager.stage_to(Artifact::VelaUxAddon, &target, 0o644)?;
    Ok(target)
}

/// Remove the linked CLI. Missing files are fine.
pub fn unlink_cli(paths: &Paths) -> Result<()> {
    for path in [&paths.vela_link, &paths.vela_binary] {
        match fs::remove_file(path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to remove {}", path.display()));
            }
        }
    }
    Ok(())
}

/// Without the deployment controller vela-core has to run as a bare pod
pub fn deploy_by_pod(controllers: &str) -> bool {
    controllers != ALL_CONTROLLERS && !has_controller(controllers, "deployment")
}

/// Full `vela install` argument list for the staged chart
pub fn chart_install_args(args: &InstallArgs, chart: &Path) -> Vec<String> {
    let mut install_args = vec![
        "--file".to_string(),
        path_arg(chart),
        "--detail=false".to_string(),
        "--version".to_string(),
        VELA_VERSION.to_string(),
    ];
    if deploy_by_pod(&args.controllers) {
        install_args.push("--set".to_string());
        install_args.push("deployByPod=true".to_string());
    }
    install_args.extend(user_chart_args(&args.chart));
    install_args
}

fn user_chart_args(chart: &ChartArgs) -> Vec<String> {
    let mut args = Vec::new();
    for value in &chart.values {
        args.push("--set".to_string());
        args.push(value.clone());
    }
    args.push("--namespace".to_string());
    args.push(chart.namespace.clone());
    args.push(format!("--detail={}", chart.detail));
    args.push(format!("--reuse={}", chart.reuse));
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingRunner, StaticArtifacts};

    #[test]
    fn test_chart_args_default() {
        let args = chart_install_args(&InstallArgs::default(), Path::new("/tmp/vela-core-1.tgz"));
        assert_eq!(
            args,
            vec![
                "--file",
                "/tmp/vela-core-1.tgz",
                "--detail=false",
                "--version",
                VELA_VERSION,
                "--namespace",
                "vela-system",
                "--detail=true",
                "--reuse=true",
            ]
        );
    }

    #[test]
    fn test_chart_args_deploy_by_pod_and_values() {
        let mut install = InstallArgs {
            controllers: "job,node".to_string(),
            ..Default::default()
        };
        install.chart.values = vec!["replicas=2".to_string(), "image.pullPolicy=Never".to_string()];
        let args = chart_install_args(&install, Path::new("chart.tgz"));

        let set_values: Vec<&str> = args
            .windows(2)
            .filter(|w| w[0] == "--set")
            .map(|w| w[1].as_str())
            .collect();
        assert_eq!(
            set_values,
            vec!["deployByPod=true", "replicas=2", "image.pullPolicy=Never"]
        );
    }

    #[test]
    fn test_deploy_by_pod() {
        assert!(!deploy_by_pod("*"));
        assert!(!deploy_by_pod("*,-job"));
        assert!(!deploy_by_pod("deployment,replicaset"));
        assert!(deploy_by_pod("job,node"));
    }

    #[test]
    fn test_link_cli_replaces_existing_link() {
        let root = tempfile::tempdir().unwrap();
        let paths = Paths::rooted_at(root.path());
        let artifacts = StaticArtifacts::new();
        let runner = RecordingRunner::new();
        let stager = ResourceStager::new(&artifacts, &runner, &paths);

        link_cli(&stager, &paths).unwrap();
        link_cli(&stager, &paths).unwrap();

        assert_eq!(fs::read_link(&paths.vela_link).unwrap(), paths.vela_binary);
        assert_eq!(
            fs::read(&paths.vela_link).unwrap(),
            StaticArtifacts::payload(Artifact::VelaCli)
        );

        unlink_cli(&paths).unwrap();
        assert!(fs::symlink_metadata(&paths.vela_link).is_err());
        unlink_cli(&paths).unwrap();
    }

    #[test]
    fn test_load_images_imports_through_k3s() {
        let root = tempfile::tempdir().unwrap();
        let paths = Paths::rooted_at(root.path());
        let artifacts = StaticArtifacts::new();
        let runner = RecordingRunner::new();
        let stager = ResourceStager::new(&artifacts, &runner, &paths);

        let mut cleanup = CleanupGuard::new();
        load_images(&stager, &runner, &paths, &mut cleanup).unwrap();

        let calls = runner.calls();
        assert_eq!(calls[0].program, path_arg(&paths.k3s_binary));
        assert_eq!(&calls[0].args[..3], &["ctr", "images", "import"]);
        assert_eq!(calls[0].args[3], path_arg(&cleanup.registered()[0]));
    }

    #[test]
    fn test_cli_installer_points_at_k3s_kubeconfig() {
        let root = tempfile::tempdir().unwrap();
        let paths = Paths::rooted_at(root.path());
        let runner = RecordingRunner::new().respond("vela", 1, "Error: install failed\n");

        let err = VelaCliInstaller::new(&runner, &paths)
            .install(&["--version".to_string(), VELA_VERSION.to_string()])
            .unwrap_err();
        assert!(err.to_string().contains("vela install"));

        let call = &runner.calls()[0];
        assert_eq!(call.args[0], "install");
        assert_eq!(
            call.env,
            vec![("KUBECONFIG".to_string(), path_arg(&paths.kubeconfig))]
        );
    }
}
