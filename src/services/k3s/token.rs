//! Cluster token lookup

use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::PathBuf;

/// What the token file says about the control plane
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenState {
    Found(Vec<u8>),
    /// No token file yet, so no control plane has been set up
    NotConfigured,
}

/// Read-only view of the token K3s writes on first start
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn read(&self) -> Result<TokenState> {
        match fs::read(&self.path) {
            Ok(content) => Ok(TokenState::Found(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(TokenState::NotConfigured),
            Err(e) => Err(e)
                .with_context(|| format!("Fail to read token file: {}", self.path.display())),
        }
    }
}
