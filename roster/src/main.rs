use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use roster::{
    EmployeeService,
    config::{Cli, Command},
    http::{AppState, ServerConfig, run_server},
    seed, telemetry,
};

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine; flags and the real environment still apply.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    telemetry::init_tracing(cli.verbose)?;

    let store = cli
        .open_store()
        .await
        .with_context(|| format!("failed to open document store at {}", cli.mongodb_url))?;
    info!(database = %cli.database, "document store opened");

    let state = Arc::new(AppState::new(EmployeeService::new(store)));

    let outcome = match cli.command() {
        Command::Serve => run_server(state.clone(), ServerConfig { bind_addr: cli.bind }).await,
        Command::Seed => seed::run(&state.employees).await.map_err(Into::into),
    };

    state.employees.shutdown().await?;

    outcome
}
