//! Typed error conditions callers need to tell apart.
//!
//! Everything else travels as `anyhow::Error` with stage context attached at
//! each layer boundary; these types sit at the bottom of such chains and can
//! be recovered with `downcast_ref`.

use std::path::PathBuf;
use thiserror::Error;

/// The command was invoked in a way that can never succeed on this host.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UsageError {
    #[error("Must specify one host at least")]
    NoHosts,
    #[error("--internal, --external and --host are mutually exclusive (got {0})")]
    ConflictingKubeconfigFlags(String),
    #[error("--internal only applies to control planes running inside a container")]
    InternalKubeconfigUnsupported,
    #[error("{0} is only supported on linux")]
    UnsupportedPlatform(&'static str),
}

/// A staged artifact could not be found. This points at a broken build or
/// package, not at a condition worth recovering from.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact {0} was not compiled into this binary (build with --features embedded)")]
    NotEmbedded(&'static str),
    #[error("artifact not found: {}", .0.display())]
    NotFound(PathBuf),
}
