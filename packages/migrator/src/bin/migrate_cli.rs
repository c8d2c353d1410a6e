//! CLI for the PasteMe 2.x -> 3.x paste migration
//!
//! Reads the legacy connection settings and the destination DATABASE_URL from
//! the environment, runs the migration once, and exits non-zero on the first
//! fatal error.

use anyhow::{Context, Result};
use clap::Parser;
use migrator_core::config::Config;
use migrator_core::data_migrations::{
    MigrationOptions, MigrationReport, PasteMigration, ShardPlan, DEFAULT_PERMANENT_SHARDS,
    DEFAULT_PROGRESS_EVERY,
};
use migrator_core::kernel::{MySqlLegacySource, MySqlPasteStore};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "migrate_cli")]
#[command(about = "Migrate pastes from the PasteMe 2.x schema into 3.x")]
struct Cli {
    /// Number of permanent shards (perm0..permN-1) in the legacy database
    #[arg(long, default_value_t = DEFAULT_PERMANENT_SHARDS)]
    permanent_shards: u8,

    /// Save every row inside the transaction, then roll back instead of committing
    #[arg(long)]
    dry_run: bool,

    /// Print the final report as a JSON line on stdout
    #[arg(long)]
    json: bool,

    /// Log progress every N migrated rows (0 disables)
    #[arg(long, default_value_t = DEFAULT_PROGRESS_EVERY)]
    progress_every: u64,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,migrator_core=info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    let cli = Cli::parse();
    tracing::debug!(?cli, "Parsed arguments");

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(
        host = %config.legacy.host,
        port = config.legacy.port,
        database = %config.legacy.database,
        "Configuration loaded"
    );

    let source = MySqlLegacySource::connect(&config.legacy.connection_url()).await?;
    let store = MySqlPasteStore::connect(&config.database_url).await?;
    tracing::info!("Connected to legacy and destination databases");

    let options = MigrationOptions {
        shards: ShardPlan::new(cli.permanent_shards),
        dry_run: cli.dry_run,
        progress_every: cli.progress_every,
    };

    let mut migration = PasteMigration::new(&source, &store, options);
    let report = match migration.run().await {
        Ok(report) => report,
        Err(err) => {
            let phase = migration
                .failed_after()
                .map(|phase| phase.as_str())
                .unwrap_or("unknown");
            return Err(err).with_context(|| format!("Migration failed after phase {}", phase));
        }
    };

    if cli.json {
        output(&report)?;
    }

    Ok(())
}

fn output(report: &MigrationReport) -> Result<()> {
    println!("{}", serde_json::to_string(report)?);
    Ok(())
}
