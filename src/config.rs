//! Host layout and installer configuration
//!
//! Every file the installer creates or reads lives at a well-known path.
//! The defaults match what K3s and the vela CLI expect; an optional TOML file
//! can move any of them.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "VELAD_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "/etc/velad/config.toml";
const DEFAULT_ARTIFACTS_DIR: &str = "/usr/share/velad/static";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VeladConfig {
    /// Directory holding the staged artifacts when they are not compiled in
    pub artifacts_dir: Option<PathBuf>,
    pub paths: Paths,
}

impl VeladConfig {
    pub fn artifacts_dir(&self) -> PathBuf {
        self.artifacts_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ARTIFACTS_DIR))
    }
}

/// Persisted control plane state and staging locations
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Paths {
    pub token: PathBuf,
    pub kubeconfig: PathBuf,
    pub external_kubeconfig: PathBuf,
    pub k3s_binary: PathBuf,
    pub k3s_image_dir: PathBuf,
    pub k3s_uninstall_script: PathBuf,
    pub vela_binary: PathBuf,
    pub vela_link: PathBuf,
    pub user_kubeconfig: PathBuf,
    pub addon_dir: PathBuf,
    pub nginx_config: PathBuf,
    /// Where `load-balancer install` notes the nginx config it wrote
    pub nginx_config_record: PathBuf,
    pub temp_dir: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        let home = home_dir();
        Self {
            token: PathBuf::from("/var/lib/rancher/k3s/server/token"),
            kubeconfig: PathBuf::from("/etc/rancher/k3s/k3s.yaml"),
            external_kubeconfig: PathBuf::from("/etc/rancher/k3s/k3s-external.yaml"),
            k3s_binary: PathBuf::from("/usr/local/bin/k3s"),
            k3s_image_dir: PathBuf::from("/var/lib/rancher/k3s/agent/images"),
            k3s_uninstall_script: PathBuf::from("/usr/local/bin/k3s-uninstall.sh"),
            vela_binary: PathBuf::from("/usr/local/share/velad/vela"),
            vela_link: PathBuf::from("/usr/local/bin/vela"),
            user_kubeconfig: home.join(".kube").join("config"),
            addon_dir: home.join(".vela").join("addons"),
            nginx_config: PathBuf::from("/etc/nginx/nginx.conf"),
            nginx_config_record: PathBuf::from("/var/lib/velad/load-balancer-conf"),
            temp_dir: std::env::temp_dir(),
        }
    }
}

impl Paths {
    /// Lay out every default location beneath `root`.
    pub fn rooted_at(root: &Path) -> Self {
        let defaults = Self::default();
        let rebase = |p: &Path| root.join(p.strip_prefix("/").unwrap_or(p));
        Self {
            token: rebase(&defaults.token),
            kubeconfig: rebase(&defaults.kubeconfig),
            external_kubeconfig: rebase(&defaults.external_kubeconfig),
            k3s_binary: rebase(&defaults.k3s_binary),
            k3s_image_dir: rebase(&defaults.k3s_image_dir),
            k3s_uninstall_script: rebase(&defaults.k3s_uninstall_script),
            vela_binary: rebase(&defaults.vela_binary),
            vela_link: rebase(&defaults.vela_link),
            user_kubeconfig: root.join("home/.kube/config"),
            addon_dir: root.join("home/.vela/addons"),
            nginx_config: rebase(&defaults.nginx_config),
            nginx_config_record: rebase(&defaults.nginx_config_record),
            temp_dir: root.join("tmp"),
        }
    }
}

fn home_dir() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/root"))
}

pub fn config_file_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

pub fn load_config() -> Result<VeladConfig> {
    load_config_from(&config_file_path())
}

pub fn load_config_from(config_path: &Path) -> Result<VeladConfig> {
    if !config_path.exists() {
        return Ok(VeladConfig::default());
    }

    let content = fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

    let config: VeladConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

    log::debug!("loaded config from {}", config_path.display());
    Ok(config)
}
