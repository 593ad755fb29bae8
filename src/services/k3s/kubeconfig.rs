//! K3s kubeconfig management

use crate::apis::KubeconfigVariant;
use crate::config::Paths;
use crate::error::UsageError;
use anyhow::{Context, Result};
use std::fs::{self, Permissions};
use std::io::{self, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// API server address K3s writes into its own kubeconfig
pub const LOOPBACK: &str = "127.0.0.1";

pub struct KubeconfigManager<'a> {
    paths: &'a Paths,
}

impl<'a> KubeconfigManager<'a> {
    pub fn new(paths: &'a Paths) -> Self {
        Self { paths }
    }

    /// Write a copy of the K3s kubeconfig that points at `bind_ip` instead of
    /// the loopback address. The K3s kubeconfig itself is left untouched.
    ///
    /// An empty `bind_ip` means no remote access was asked for; nothing is
    /// written and `None` is returned.
    pub fn derive_remote(&self, bind_ip: &str) -> Result<Option<PathBuf>> {
        if bind_ip.is_empty() {
            return Ok(None);
        }

        let external = &self.paths.external_kubeconfig;
        println!(
            "Generating kubeconfig for remote access into {}",
            external.display()
        );

        let local = &self.paths.kubeconfig;
        let origin = fs::read_to_string(local)
            .with_context(|| format!("Failed to read kubeconfig: {}", local.display()))?;
        let remote = substitute_loopback(&origin, bind_ip)
            .with_context(|| format!("Cannot derive remote kubeconfig from {}", local.display()))?;

        write_private(external, remote.as_bytes())?;
        println!("✓ Generated kubeconfig at {}", external.display());
        Ok(Some(external.clone()))
    }

    /// Make the K3s kubeconfig the user's default one. A different existing
    /// default is kept next to it with a `.bak` suffix. An existing backup is
    /// never replaced, so it keeps holding the config from before the first
    /// install.
    pub fn install_default(&self) -> Result<PathBuf> {
        let local = &self.paths.kubeconfig;
        let content = fs::read(local)
            .with_context(|| format!("Failed to read kubeconfig: {}", local.display()))?;

        let target = &self.paths.user_kubeconfig;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        match fs::read(target) {
            Ok(existing) if existing == content => {
                println!("  Kubeconfig at {} is already up to date", target.display());
                return Ok(target.clone());
            }
            Ok(_) => {
                let backup = backup_path(target);
                if backup.exists() {
                    println!("  Keeping earlier backup at {}", backup.display());
                } else {
                    fs::rename(target, &backup).with_context(|| {
                        format!("Failed to back up existing kubeconfig to {}", backup.display())
                    })?;
                    println!("  Moved existing kubeconfig to {}", backup.display());
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read kubeconfig: {}", target.display()));
            }
        }

        write_private(target, &content)?;
        println!("✓ Kubeconfig set up at {}", target.display());
        Ok(target.clone())
    }

    /// Print the requested kubeconfig variant
    pub fn print(&self, variant: KubeconfigVariant, out: &mut dyn Write) -> Result<()> {
        match variant {
            KubeconfigVariant::Host => {
                writeln!(out, "{}", self.paths.kubeconfig.display())?;
            }
            KubeconfigVariant::Internal => {
                return Err(UsageError::InternalKubeconfigUnsupported.into());
            }
            KubeconfigVariant::External => {
                let external = &self.paths.external_kubeconfig;
                if !external.exists() {
                    anyhow::bail!(
                        "No kubeconfig for remote access at {}.\n\
                         Re-run install with --bind-ip=<reachable IP> to generate one.",
                        external.display()
                    );
                }
                out.write_all(&read(external)?)?;
            }
            KubeconfigVariant::Local => {
                out.write_all(&read(&self.paths.kubeconfig)?)?;
            }
        }
        Ok(())
    }
}

/// Replace the one loopback reference. Zero or several references mean the
/// file is not the kubeconfig K3s generates and is rejected.
pub fn substitute_loopback(content: &str, address: &str) -> Result<String> {
    match content.matches(LOOPBACK).count() {
        1 => Ok(content.replacen(LOOPBACK, address, 1)),
        0 => anyhow::bail!("kubeconfig does not reference {}", LOOPBACK),
        n => anyhow::bail!(
            "kubeconfig references {} {} times, expected exactly once",
            LOOPBACK,
            n
        ),
    }
}

fn read(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("Failed to read kubeconfig: {}", path.display()))
}

/// Replace `path` with `content`. The bytes go to a 0600 temporary file next
/// to it first, so the credentials are never readable by others.
fn write_private(path: &Path, content: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let mut file = tempfile::Builder::new()
        .permissions(Permissions::from_mode(0o600))
        .tempfile_in(parent)
        .with_context(|| format!("Failed to create temporary file in {}", parent.display()))?;
    file.write_all(content)
        .with_context(|| format!("Failed to write kubeconfig: {}", path.display()))?;
    file.persist(path)
        .with_context(|| format!("Failed to write kubeconfig: {}", path.display()))?;
    Ok(())
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".bak");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    const K3S_YAML: &str = "apiVersion: v1\n\
        clusters:\n\
        - cluster:\n    \
            certificate-authority-data: LS0tLS1CRUdJTg==\n    \
            server: https://127.0.0.1:6443\n  \
          name: default\n\
        kind: Config\n";

    fn scratch() -> (tempfile::TempDir, Paths) {
        let root = tempfile::tempdir().unwrap();
        let paths = Paths::rooted_at(root.path());
        fs::create_dir_all(paths.kubeconfig.parent().unwrap()).unwrap();
        fs::write(&paths.kubeconfig, K3S_YAML).unwrap();
        (root, paths)
    }

    #[test]
    fn test_derive_remote_empty_bind_ip_is_noop() {
        let (_root, paths) = scratch();
        let result = KubeconfigManager::new(&paths).derive_remote("").unwrap();
        assert!(result.is_none());
        assert!(!paths.external_kubeconfig.exists());
        assert_eq!(fs::read_to_string(&paths.kubeconfig).unwrap(), K3S_YAML);
    }

    #[test]
    fn test_derive_remote_substitutes_once() {
        let (_root, paths) = scratch();
        let written = KubeconfigManager::new(&paths)
            .derive_remote("10.0.0.5")
            .unwrap();

        assert_eq!(written.as_ref(), Some(&paths.external_kubeconfig));
        assert_eq!(
            fs::read_to_string(&paths.external_kubeconfig).unwrap(),
            K3S_YAML.replace("https://127.0.0.1:6443", "https://10.0.0.5:6443")
        );
        assert_eq!(fs::read_to_string(&paths.kubeconfig).unwrap(), K3S_YAML);
    }

    #[test]
    fn test_derive_remote_missing_local_kubeconfig() {
        let root = tempfile::tempdir().unwrap();
        let paths = Paths::rooted_at(root.path());
        let err = KubeconfigManager::new(&paths)
            .derive_remote("10.0.0.5")
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read kubeconfig"));
    }

    #[test]
    fn test_substitute_rejects_ambiguous_input() {
        assert!(substitute_loopback("server: https://localhost:6443", "10.0.0.5").is_err());
        assert!(substitute_loopback("127.0.0.1 127.0.0.1", "10.0.0.5").is_err());
    }

    #[test]
    fn test_install_default_backs_up_different_config() {
        let (_root, paths) = scratch();
        fs::create_dir_all(paths.user_kubeconfig.parent().unwrap()).unwrap();
        fs::write(&paths.user_kubeconfig, "old: config\n").unwrap();

        KubeconfigManager::new(&paths).install_default().unwrap();

        assert_eq!(fs::read_to_string(&paths.user_kubeconfig).unwrap(), K3S_YAML);
        assert_eq!(
            fs::read_to_string(backup_path(&paths.user_kubeconfig)).unwrap(),
            "old: config\n"
        );
    }

    #[test]
    fn test_install_default_keeps_first_backup_across_reinstall() {
        let (_root, paths) = scratch();
        fs::create_dir_all(paths.user_kubeconfig.parent().unwrap()).unwrap();
        fs::write(&paths.user_kubeconfig, "users-own-config\n").unwrap();
        let manager = KubeconfigManager::new(&paths);

        manager.install_default().unwrap();
        let reinstalled = K3S_YAML.replace("LS0tLS1CRUdJTg==", "LS0tLS1SRUlOU1RBTEw=");
        fs::write(&paths.kubeconfig, &reinstalled).unwrap();
        manager.install_default().unwrap();

        assert_eq!(fs::read_to_string(&paths.user_kubeconfig).unwrap(), reinstalled);
        assert_eq!(
            fs::read_to_string(backup_path(&paths.user_kubeconfig)).unwrap(),
            "users-own-config\n"
        );
    }

    #[test]
    fn test_written_kubeconfigs_are_private() {
        let (_root, paths) = scratch();
        fs::create_dir_all(paths.user_kubeconfig.parent().unwrap()).unwrap();
        fs::write(&paths.external_kubeconfig, "stale").unwrap();
        fs::set_permissions(&paths.external_kubeconfig, Permissions::from_mode(0o644)).unwrap();
        let manager = KubeconfigManager::new(&paths);

        manager.derive_remote("10.0.0.5").unwrap();
        manager.install_default().unwrap();

        for written in [&paths.external_kubeconfig, &paths.user_kubeconfig] {
            let mode = fs::metadata(written).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600, "{}", written.display());
        }
        let leftovers = fs::read_dir(paths.external_kubeconfig.parent().unwrap())
            .unwrap()
            .count();
        assert_eq!(leftovers, 2);
    }

    #[test]
    fn test_install_default_is_idempotent() {
        let (_root, paths) = scratch();
        let manager = KubeconfigManager::new(&paths);
        manager.install_default().unwrap();
        manager.install_default().unwrap();
        assert!(!backup_path(&paths.user_kubeconfig).exists());
    }

    #[test]
    fn test_print_variants() {
        let (_root, paths) = scratch();
        let manager = KubeconfigManager::new(&paths);

        let mut out = Vec::new();
        manager.print(KubeconfigVariant::Local, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), K3S_YAML);

        let mut out = Vec::new();
        manager.print(KubeconfigVariant::Host, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!("{}\n", paths.kubeconfig.display())
        );

        let mut out = Vec::new();
        let err = manager
            .print(KubeconfigVariant::External, &mut out)
            .unwrap_err();
        assert!(err.to_string().contains("--bind-ip"));

        let err = manager
            .print(KubeconfigVariant::Internal, &mut out)
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<UsageError>(),
            Some(&UsageError::InternalKubeconfigUnsupported)
        );
    }
}
