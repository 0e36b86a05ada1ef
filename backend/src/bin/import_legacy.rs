//! Import a legacy profile snapshot file for one account into PostgreSQL.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::env;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use profile_sync::cap_fs::read_file_to_string;
use profile_sync::domain::ports::ProfileCommand;
use profile_sync::domain::{AccountId, DefaultSettings, LegacyBlob, ProfileSyncService};
use profile_sync::outbound::persistence::{
    DbPool, DieselProfileStore, PoolConfig, run_pending_migrations,
};
use tokio::runtime::Builder;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

/// Imports are single large transactions; allow them more time than requests.
const IMPORT_TIMEOUT: Duration = Duration::from_secs(120);

/// `import-legacy` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "import-legacy",
    about = "Import a legacy profile snapshot for one account",
    version
)]
struct CliArgs {
    /// Account that owns the imported data.
    #[arg(long = "account-id", value_name = "id")]
    account_id: AccountId,
    /// Path to the legacy JSON snapshot.
    #[arg(long = "input", value_name = "path")]
    input: PathBuf,
    /// Database connection URL. Falls back to `DATABASE_URL` when omitted.
    #[arg(long = "database-url", value_name = "url")]
    database_url: Option<String>,
}

fn main() -> io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| io::Error::other(format!("create Tokio runtime: {error}")))?;
    runtime.block_on(async_main())
}

async fn async_main() -> io::Result<()> {
    let args = CliArgs::try_parse().map_err(io::Error::other)?;
    let blob = read_blob(&args.input)?;
    info!(
        account_id = %args.account_id,
        keys = blob.len(),
        input = %args.input.display(),
        "read legacy snapshot"
    );

    let database_url = resolve_database_url(args.database_url)?;
    run_pending_migrations(&database_url)
        .await
        .map_err(|error| io::Error::other(format!("apply migrations: {error}")))?;
    let pool = DbPool::new(PoolConfig::new(&database_url).with_max_size(1))
        .await
        .map_err(|error| io::Error::other(format!("create database pool: {error}")))?;

    let service = ProfileSyncService::new(
        Arc::new(DieselProfileStore::new(pool)),
        DefaultSettings::builtin(),
        IMPORT_TIMEOUT,
    );
    let outcome = service
        .import_legacy(args.account_id, blob)
        .await
        .map_err(|error| io::Error::other(format!("import failed: {error}")))?;

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "account_id={}", args.account_id)?;
    writeln!(stdout, "settings={}", outcome.settings)?;
    writeln!(stdout, "loadouts={}", outcome.loadouts)?;
    writeln!(stdout, "tags={}", outcome.tags)?;
    writeln!(stdout, "skipped={}", outcome.skipped)?;

    Ok(())
}

fn read_blob(path: &Path) -> io::Result<LegacyBlob> {
    let raw = read_file_to_string(path).map_err(|error| {
        io::Error::other(format!("read input file '{}': {error}", path.display()))
    })?;
    parse_blob(&raw)
}

fn parse_blob(raw: &str) -> io::Result<LegacyBlob> {
    serde_json::from_str(raw).map_err(|error| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("input is not a legacy snapshot object: {error}"),
        )
    })
}

fn resolve_database_url(explicit: Option<String>) -> io::Result<String> {
    if let Some(value) = explicit {
        if value.trim().is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "--database-url must not be empty when provided",
            ));
        }
        return Ok(value);
    }

    let from_env = env::var("DATABASE_URL").map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "database URL missing: set --database-url or DATABASE_URL",
        )
    })?;
    if from_env.trim().is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "DATABASE_URL must not be empty",
        ));
    }
    Ok(from_env)
}
