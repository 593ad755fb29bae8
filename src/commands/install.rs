use crate::apis::InstallArgs;
use crate::config::Paths;
use crate::orchestrator::Orchestrator;
use crate::services::k3s::{TokenState, TokenStore};
use crate::utils::ensure_linux;
use anyhow::Result;

/// Handle install command
pub fn handle_install(orchestrator: &Orchestrator<'_>, args: &InstallArgs) -> Result<()> {
    ensure_linux("install")?;

    let report = orchestrator.install(args)?;

    warn_save_token(&args.token, orchestrator.paths());
    println!();
    if report.warnings.is_empty() {
        println!("✓ Successfully install KubeVela control plane! Try: vela components");
    } else {
        println!("✓ Control plane is up, see warnings above. Try: vela install");
    }
    Ok(())
}

/// A generated token is the only way to restart this control plane or join
/// more nodes, so show it once
fn warn_save_token(given: &str, paths: &Paths) {
    if !given.is_empty() {
        return;
    }
    match TokenStore::new(&paths.token).read() {
        Ok(state) => {
            if let Some(hint) = token_hint(&state) {
                println!("{}", hint);
            }
        }
        Err(e) => eprintln!("⚠️  Warning: {:#}", e),
    }
}

fn token_hint(state: &TokenState) -> Option<String> {
    match state {
        TokenState::Found(token) => Some(format!(
            "Keep the token below in case of restarting the control plane or joining nodes:\n  {}",
            String::from_utf8_lossy(token).trim()
        )),
        TokenState::NotConfigured => None,
    }
}
