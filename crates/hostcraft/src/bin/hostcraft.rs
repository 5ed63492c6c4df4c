use std::process;

use anyhow::Context;
use clap::Parser;
use hostcraft::{cli::Cli, telemetry};

#[tokio::main]
async fn main() {
    if let Err(e) = try_main().await {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

async fn try_main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (config, config_path) = cli
        .load_config()
        .context("Failed to load configuration")?;
    telemetry::init_logging(&config.logging)?;

    hostcraft::cli::run(cli.command, config, config_path)
        .await
        .map_err(anyhow::Error::from)
}
