use crate::config::Paths;
use crate::services::k3s::{TokenState, TokenStore};
use anyhow::Result;

/// Handle token command
pub fn handle_token(paths: &Paths) -> Result<()> {
    match TokenStore::new(&paths.token).read()? {
        TokenState::Found(token) => println!("{}", String::from_utf8_lossy(&token)),
        TokenState::NotConfigured => println!("No token found, control plane not set up yet."),
    }
    Ok(())
}
