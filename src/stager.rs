//! Artifact staging
//!
//! Copies artifacts out of the provider to the places K3s and vela look for
//! them. Fixed destinations are replaced atomically, so staging a binary that
//! is currently executing works and the last stage wins.

use crate::artifacts::{Artifact, ArtifactProvider};
use crate::cleanup::CleanupGuard;
use crate::config::Paths;
use crate::utils::exec::{CommandSpec, ProcessRunner, run_echoed};
use crate::utils::path_arg;
use anyhow::{Context, Result};
use std::fs::{self, Permissions};
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

pub const K3S_IMAGE_ARCHIVE: &str = "k3s-airgap-images-amd64.tar.gz";

pub struct ResourceStager<'a> {
    artifacts: &'a dyn ArtifactProvider,
    runner: &'a dyn ProcessRunner,
    paths: &'a Paths,
}

impl<'a> ResourceStager<'a> {
    pub fn new(
        artifacts: &'a dyn ArtifactProvider,
        runner: &'a dyn ProcessRunner,
        paths: &'a Paths,
    ) -> Self {
        Self {
            artifacts,
            runner,
            paths,
        }
    }

    /// Write the K3s setup script to a fresh temporary file owned by `cleanup`
    pub fn stage_script(&self, cleanup: &mut CleanupGuard) -> Result<PathBuf> {
        self.stage_temp(Artifact::K3sScript, "k3s-setup-", ".sh", cleanup)
    }

    /// Place the K3s binary at its fixed path with execute permission
    pub fn stage_binary(&self) -> Result<()> {
        let target = &self.paths.k3s_binary;
        self.stage_to(Artifact::K3sBinary, target, 0o755)?;
        println!("✓ Placed k3s binary at {}", target.display());
        Ok(())
    }

    /// Unpack the K3s airgap images into the directory K3s imports from
    pub fn stage_images(&self) -> Result<()> {
        let image_dir = &self.paths.k3s_image_dir;
        fs::create_dir_all(image_dir).with_context(|| {
            format!("Failed to create image directory: {}", image_dir.display())
        })?;

        let archive = image_dir.join(K3S_IMAGE_ARCHIVE);
        self.stage_to(Artifact::K3sImages, &archive, 0o600)?;

        let gunzip = CommandSpec::new("gzip").args(["-f", "-d"]).arg(path_arg(&archive));
        run_echoed(self.runner, &gunzip)
            .with_context(|| format!("Failed to decompress {}", archive.display()))?;

        println!("✓ Prepared k3s images");
        Ok(())
    }

    /// Write an artifact to a new temporary file named `<prefix>*<suffix>`.
    /// The file survives until `cleanup` is released.
    pub fn stage_temp(
        &self,
        artifact: Artifact,
        prefix: &str,
        suffix: &str,
        cleanup: &mut CleanupGuard,
    ) -> Result<PathBuf> {
        let mut reader = self.artifacts.open(artifact)?;

        let temp_dir = &self.paths.temp_dir;
        fs::create_dir_all(temp_dir)
            .with_context(|| format!("Failed to create directory: {}", temp_dir.display()))?;
        let mut file = tempfile::Builder::new()
            .prefix(prefix)
            .suffix(suffix)
            .tempfile_in(temp_dir)
            .with_context(|| format!("Failed to create temporary file in {}", temp_dir.display()))?;

        io::copy(&mut reader, &mut file)
            .with_context(|| format!("Failed to write {}", artifact.relative_path()))?;

        let (_, path) = file
            .keep()
            .context("Failed to keep temporary file")?;
        cleanup.register(&path);
        log::debug!("staged {} at {}", artifact.relative_path(), path.display());
        Ok(path)
    }

    /// Replace `target` with the artifact's bytes and set `mode`
    pub fn stage_to(&self, artifact: Artifact, target: &Path, mode: u32) -> Result<()> {
        let mut reader = self.artifacts.open(artifact)?;

        let parent = target
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;

        let mut file = tempfile::NamedTempFile::new_in(parent)
            .with_context(|| format!("Failed to create temporary file in {}", parent.display()))?;
        io::copy(&mut reader, &mut file)
            .with_context(|| format!("Failed to write {}", target.display()))?;
        fs::set_permissions(file.path(), Permissions::from_mode(mode))
            .with_context(|| format!("Failed to set permissions on {}", target.display()))?;
        file.persist(target)
            .with_context(|| format!("Failed to place {}", target.display()))?;

        log::debug!("staged {} at {}", artifact.relative_path(), target.display());
        Ok(())
    }
}
