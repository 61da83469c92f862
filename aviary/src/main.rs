//! Aviary server binary.

use anyhow::Context;
use clap::Parser;

use aviary::{
    config::{Cli, Config},
    db::Database,
    server, telemetry,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_cli(&cli)?;

    telemetry::init(&config.log).context("failed to install the tracing subscriber")?;

    let db = Database::from_config(&config.db)?;
    server::serve(&config, db)
        .await
        .with_context(|| format!("failed to serve on {}", config.socket_addr()))
}
