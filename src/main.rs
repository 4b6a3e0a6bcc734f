use std::sync::Arc;

use anyhow::Context;
use serde_json::json;

use k9_journal_sync::{
    Config, FileStore, HttpJournalClient, JournalApi, LegacyStore, MigrationAgent, SyncError,
};

enum Command {
    Migrate,
    Check,
    Dogs,
}

impl Command {
    fn parse(arg: Option<&str>) -> anyhow::Result<Self> {
        match arg {
            None | Some("migrate") => Ok(Command::Migrate),
            Some("check") => Ok(Command::Check),
            Some("dogs") => Ok(Command::Dogs),
            Some(other) => anyhow::bail!("unknown command {:?}; expected migrate, check or dogs", other),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "k9_journal_sync=debug".into()),
        )
        .json()
        .with_writer(std::io::stderr)
        .init();

    let arg = std::env::args().nth(1);
    let command = Command::parse(arg.as_deref())?;

    let config = Config::from_env()?;
    tracing::info!(base_url = %config.api_base_url, "Using journal API");

    let client = Arc::new(HttpJournalClient::new(config.clone())?);

    let summary = match command {
        Command::Check => {
            let dogs = client.check_connectivity().await?;
            json!({ "reachable": true, "dogs": dogs })
        }
        Command::Dogs => serde_json::to_value(client.list_dogs().await?)?,
        Command::Migrate => {
            let file_store =
                FileStore::open(&config.legacy_store_path).context("opening legacy store")?;
            tracing::info!(path = %file_store.path().display(), "Migrating legacy journals");
            let store: Arc<dyn LegacyStore> = Arc::new(file_store);
            let agent = MigrationAgent::new(client.clone(), store);
            match agent.run().await {
                Ok(outcome) => serde_json::to_value(&outcome)?,
                Err(e) => {
                    report_failure(&e);
                    return Err(e.into());
                }
            }
        }
    };

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn report_failure(err: &SyncError) {
    if err.is_retryable() {
        tracing::error!(error = %err, "Migration did not complete; legacy journals are untouched and it can be run again");
    } else {
        tracing::error!(error = %err, "Migration failed");
    }
}
