// Utils module - process execution and host checks shared by the services
pub mod exec;

pub use exec::{CommandSpec, ProcessOutput, ProcessRunner, SystemRunner, run_echoed};

use crate::error::UsageError;
use std::path::Path;

/// Bail out early on hosts where K3s runs natively only on Linux
pub fn ensure_linux(feature: &'static str) -> Result<(), UsageError> {
    if cfg!(target_os = "linux") {
        Ok(())
    } else {
        Err(UsageError::UnsupportedPlatform(feature))
    }
}

/// Render a path as a command line argument
pub fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
