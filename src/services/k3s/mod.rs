//! K3s cluster management service
//!
//! Handles air-gapped K3s installation, kubeconfig handling, token lookup
//! and removal.

// Module declarations
mod compose;
mod install;
mod kubeconfig;
mod maintenance;
mod token;

pub use compose::{compose_args, has_controller};
pub use install::{ClusterInstaller, SKIP_DOWNLOAD_ENV};
pub use kubeconfig::{KubeconfigManager, LOOPBACK, substitute_loopback};
pub use maintenance::uninstall;
pub use token::{TokenState, TokenStore};
