use std::io;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use nkust_rollcall::account::{AccountStore, JsonFileBackend};
use nkust_rollcall::batch::Orchestrator;
use nkust_rollcall::cli::Cli;
use nkust_rollcall::client::RollcallClient;
use nkust_rollcall::interactive::Console;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so they stay out of the menu
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .with_writer(io::stderr)
        .init();

    let config = cli.resolve_config();

    let backend = JsonFileBackend::new(&config.storage.accounts_file);
    info!("Accounts file: {}", backend.path().display());
    let store = AccountStore::open(backend);

    let client = RollcallClient::from_config(&config)?;
    info!("Check-in endpoint: {}", client.url());
    let orchestrator = Orchestrator::new(Arc::new(client));

    let stdin = io::stdin();
    let mut console = Console::new(stdin.lock(), io::stdout(), store, orchestrator);
    console.run().await?;
    Ok(())
}
