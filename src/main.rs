use anyhow::Result;
use clap::Parser;
use velad::services::vela::VelaCliInstaller;
use velad::utils::SystemRunner;
use velad::{Commands, Orchestrator, artifacts, commands, config};

#[derive(Parser)]
#[command(name = "velad")]
#[command(version)]
#[command(about = "Setup a KubeVela control plane air-gapped")]
#[command(long_about = "Setup a KubeVela control plane air-gapped, using K3s and only for Linux now")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

fn main() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli.command) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(command: Commands) -> Result<()> {
    if let Commands::Version = command {
        commands::version::handle_version();
        return Ok(());
    }

    commands::check_usage(&command)?;
    let config = config::load_config()?;
    let artifacts = artifacts::provider_for(&config);
    let runner = SystemRunner;
    let charts = VelaCliInstaller::new(&runner, &config.paths);
    let orchestrator = Orchestrator::new(artifacts.as_ref(), &runner, &charts, &config.paths);

    commands::handle_command(&orchestrator, command)
}
