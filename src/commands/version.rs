use crate::version::{VELA_VERSION, VELAD_VERSION};

/// Handle version command
pub fn handle_version() {
    println!("Core Version: {}", VELA_VERSION);
    println!("VelaD Version: {}", VELAD_VERSION);
}
