use anyhow::Context;
use clap::Parser;
use services::{DashboardServices, services::config::DashboardConfig};
use utils::logging;

mod commands;

use commands::Command;

/// Command-line front end for the clients/projects/finances dashboard.
#[derive(Debug, Parser)]
#[command(name = "dashboard", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logging::init(logging::DEFAULT_DIRECTIVES).context("failed to install logger")?;

    let cli = Cli::parse();
    let config = DashboardConfig::from_env().context("invalid configuration")?;
    let services = DashboardServices::from_config(config)?;

    commands::run(&services, cli.command).await
}
