//! Nginx load balancer in front of several control plane nodes
//!
//! Every node runs its own K3s server; nginx forwards the API server and
//! ingress ports to all of them so clients can use a single address.

use crate::apis::LoadBalancerArgs;
use crate::config::Paths;
use crate::utils::exec::{CommandSpec, ProcessRunner, run_echoed};
use crate::utils::path_arg;
use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Upstream name and the port forwarded on every node
const FORWARDED_PORTS: [(&str, u16); 3] = [
    ("k3s_servers", 6443),
    ("http_servers", 80),
    ("https_servers", 443),
];

pub struct LoadBalancerManager<'a> {
    runner: &'a dyn ProcessRunner,
    paths: &'a Paths,
}

impl<'a> LoadBalancerManager<'a> {
    pub fn new(runner: &'a dyn ProcessRunner, paths: &'a Paths) -> Self {
        Self { runner, paths }
    }

    /// Write the nginx configuration for `args.hosts` and start or reload
    /// nginx with it
    pub fn configure(&self, args: &LoadBalancerArgs) -> Result<PathBuf> {
        args.validate()?;

        let conf = args
            .configuration
            .clone()
            .unwrap_or_else(|| self.paths.nginx_config.clone());
        create_parent(&conf)?;
        fs::write(&conf, render_nginx_config(&args.hosts))
            .with_context(|| format!("Failed to write nginx configuration: {}", conf.display()))?;
        self.record(&conf)?;
        println!("✓ Wrote load balancer configuration to {}", conf.display());

        if self.runner.find_processes(NGINX)?.is_empty() {
            println!("Starting nginx...");
            let start = CommandSpec::new(NGINX).arg("-c").arg(path_arg(&conf));
            run_echoed(self.runner, &start).context("Failed to start nginx")?;
        } else {
            println!("Reloading nginx...");
            let reload = CommandSpec::new(NGINX)
                .args(["-s", "reload", "-c"])
                .arg(path_arg(&conf));
            run_echoed(self.runner, &reload).context("Failed to reload nginx")?;
        }
        Ok(conf)
    }

    /// Remove the configuration written by the last `configure` and kill
    /// nginx. Safe to repeat.
    pub fn teardown(&self) -> Result<()> {
        let conf = self.recorded()?;
        remove_if_present(&conf, "nginx configuration")?;
        remove_if_present(&self.paths.nginx_config_record, "load balancer record")?;

        for pid in self.runner.find_processes(NGINX)? {
            if self.runner.kill(pid)? {
                println!("  Killed nginx process {}", pid);
            } else {
                log::debug!("nginx process {} already exited", pid);
            }
        }
        Ok(())
    }

    fn record(&self, conf: &Path) -> Result<()> {
        let record = &self.paths.nginx_config_record;
        create_parent(record)?;
        fs::write(record, path_arg(conf))
            .with_context(|| format!("Failed to write {}", record.display()))
    }

    /// The configuration path noted by `configure`, or the default one
    fn recorded(&self) -> Result<PathBuf> {
        let record = &self.paths.nginx_config_record;
        match fs::read_to_string(record) {
            Ok(noted) if !noted.trim().is_empty() => Ok(PathBuf::from(noted.trim())),
            Ok(_) => Ok(self.paths.nginx_config.clone()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(self.paths.nginx_config.clone()),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", record.display())),
        }
    }
}

const NGINX: &str = "nginx";

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    Ok(())
}

fn remove_if_present(path: &Path, what: &str) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            println!("✓ Removed {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => {
            Err(e).with_context(|| format!("Failed to remove {}: {}", what, path.display()))
        }
    }
}

/// Render a complete nginx.conf that streams each forwarded port to every
/// host, in the order given
pub fn render_nginx_config(hosts: &[String]) -> String {
    let mut conf = String::new();
    conf.push_str("# Generated by velad load-balancer install. Changes will be overwritten.\n");
    conf.push_str("worker_processes auto;\n\n");
    conf.push_str("events {\n    worker_connections 1024;\n}\n\n");
    conf.push_str("stream {\n");
    for (upstream, port) in FORWARDED_PORTS {
        let _ = writeln!(conf, "    upstream {} {{", upstream);
        for host in hosts {
            let _ = writeln!(conf, "        server {}:{} max_fails=3 fail_timeout=5s;", host, port);
        }
        conf.push_str("    }\n\n");
        let _ = writeln!(conf, "    server {{\n        listen {};", port);
        let _ = writeln!(conf, "        proxy_pass {};\n    }}\n", upstream);
    }
    conf.push_str("}\n");
    conf
}
