/// KubeVela release the staged chart, CLI and images belong to
pub const VELA_VERSION: &str = match option_env!("VELA_VERSION") {
    Some(version) => version,
    None => "v1.9.11",
};

pub const VELAD_VERSION: &str = env!("CARGO_PKG_VERSION");
