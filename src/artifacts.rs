//! Installer artifacts
//!
//! The K3s setup script, binary and airgap images, plus the vela CLI, chart,
//! UI addon and images, are opaque blobs produced by the build. They are
//! either compiled into the binary (`embedded` feature) or read from a
//! directory laid out the same way.

use crate::config::VeladConfig;
use crate::error::ArtifactError;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Artifact {
    K3sScript,
    K3sBinary,
    K3sImages,
    VelaCli,
    VelaImages,
    VelaChart,
    VelaUxAddon,
}

impl Artifact {
    #[cfg(test)]
    pub const ALL: [Artifact; 7] = [
        Artifact::K3sScript,
        Artifact::K3sBinary,
        Artifact::K3sImages,
        Artifact::VelaCli,
        Artifact::VelaImages,
        Artifact::VelaChart,
        Artifact::VelaUxAddon,
    ];

    /// Location relative to the artifact root
    pub fn relative_path(self) -> &'static str {
        match self {
            Artifact::K3sScript => "k3s/setup.sh",
            Artifact::K3sBinary => "k3s/k3s",
            Artifact::K3sImages => "k3s/k3s-airgap-images-amd64.tar.gz",
            Artifact::VelaCli => "vela/vela",
            Artifact::VelaImages => "vela/images/vela-images.tar",
            Artifact::VelaChart => "vela/charts/vela-core.tgz",
            Artifact::VelaUxAddon => "vela/addons/velaux.tgz",
        }
    }
}

/// Source of artifact bytes
pub trait ArtifactProvider {
    fn open(&self, artifact: Artifact) -> Result<Box<dyn Read + '_>>;
}

/// Artifacts compiled into the binary
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbeddedArtifacts;

#[cfg(feature = "embedded")]
mod compiled {
    use super::Artifact;

    macro_rules! static_file {
        ($rel:literal) => {
            include_bytes!(concat!(env!("VELAD_STATIC_DIR"), "/", $rel))
        };
    }

    pub fn bytes(artifact: Artifact) -> Option<&'static [u8]> {
        let bytes: &'static [u8] = match artifact {
            Artifact::K3sScript => static_file!("k3s/setup.sh"),
            Artifact::K3sBinary => static_file!("k3s/k3s"),
            Artifact::K3sImages => static_file!("k3s/k3s-airgap-images-amd64.tar.gz"),
            Artifact::VelaCli => static_file!("vela/vela"),
            Artifact::VelaImages => static_file!("vela/images/vela-images.tar"),
            Artifact::VelaChart => static_file!("vela/charts/vela-core.tgz"),
            Artifact::VelaUxAddon => static_file!("vela/addons/velaux.tgz"),
        };
        Some(bytes)
    }
}

#[cfg(not(feature = "embedded"))]
mod compiled {
    use super::Artifact;

    pub fn bytes(_artifact: Artifact) -> Option<&'static [u8]> {
        None
    }
}

impl ArtifactProvider for EmbeddedArtifacts {
    fn open(&self, artifact: Artifact) -> Result<Box<dyn Read + '_>> {
        let bytes = compiled::bytes(artifact)
            .ok_or(ArtifactError::NotEmbedded(artifact.relative_path()))?;
        Ok(Box::new(bytes))
    }
}

/// Artifacts read from a directory on the host
#[derive(Debug, Clone)]
pub struct DirectoryArtifacts {
    root: PathBuf,
}

impl DirectoryArtifacts {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ArtifactProvider for DirectoryArtifacts {
    fn open(&self, artifact: Artifact) -> Result<Box<dyn Read + '_>> {
        let path = self.root.join(artifact.relative_path());
        match File::open(&path) {
            Ok(file) => Ok(Box::new(file)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(ArtifactError::NotFound(path).into())
            }
            Err(e) => {
                Err(e).with_context(|| format!("Failed to open artifact: {}", path.display()))
            }
        }
    }
}

/// Pick the artifact source for this build: an explicitly configured
/// directory wins, then compiled-in artifacts, then the default directory.
pub fn provider_for(config: &VeladConfig) -> Box<dyn ArtifactProvider> {
    if config.artifacts_dir.is_none() && cfg!(feature = "embedded") {
        return Box::new(EmbeddedArtifacts);
    }
    Box::new(DirectoryArtifacts::new(config.artifacts_dir()))
}
