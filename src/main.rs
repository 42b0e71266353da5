//! cabletrack: cable inventory API server and migration tool.

use anyhow::{anyhow, Context, Result};
use cabletrack::config::AppConfig;
use cabletrack::config::DEFAULT_CONFIG_PATH;
use cabletrack::http::{self, Router};
use cabletrack::labels::TsplLabelIssuer;
use cabletrack::migration::Migrator;
use cabletrack::{connect, ConnectionPool, Inventory, MemoryStore, PgStore};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "cabletrack")]
#[command(about = "Cable box inventory: numbering, consumption and labels")]
#[command(version)]
struct Cli {
    /// Configuration file (optional; environment variables override it)
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Database connection URL (overrides the configured one)
    #[arg(long)]
    database_url: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet output (errors only)
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending migrations and serve the HTTP API
    Serve {
        /// Keep everything in memory instead of PostgreSQL
        #[arg(long)]
        in_memory: bool,
    },

    /// Apply pending migrations and exit
    Migrate,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    dotenv::dotenv().ok();
    let level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let mut config = AppConfig::load_from(&cli.config)
        .with_context(|| format!("failed to load configuration ({})", cli.config.display()))?;
    if let Some(url) = cli.database_url {
        config.database.url = url;
    }
    may::config().set_workers(config.server.workers.max(1));

    match cli.command {
        Commands::Migrate => migrate(&config),
        Commands::Serve { in_memory } => serve(&config, in_memory),
    }
}

fn migrator(config: &AppConfig) -> Migrator {
    Migrator::embedded().with_lock_timeout(Duration::from_secs(
        config.database.migration_lock_timeout_seconds,
    ))
}

fn migrate(config: &AppConfig) -> Result<()> {
    let client = connect(&config.database.url).context("failed to connect to PostgreSQL")?;
    let applied = migrator(config)
        .run(&client)
        .context("migration failed")?;
    log::info!("{applied} migration(s) applied");
    Ok(())
}

fn serve(config: &AppConfig, in_memory: bool) -> Result<()> {
    let issuer = Arc::new(
        TsplLabelIssuer::from_config(&config.labels).context("invalid label configuration")?,
    );

    let server = if in_memory {
        log::warn!("serving from memory; nothing will be persisted");
        http::start(
            Router::new(Inventory::new(MemoryStore::new(), issuer)),
            &config.server.listen,
        )
    } else {
        let pool = ConnectionPool::from_config(&config.database)
            .context("failed to build connection pool")?;
        {
            let conn = pool.acquire().context("no connection for migrations")?;
            let applied = migrator(config).run(&conn).context("migration failed")?;
            log::info!("{applied} migration(s) applied");
        }
        http::start(
            Router::new(Inventory::new(PgStore::new(pool), issuer)),
            &config.server.listen,
        )
    }
    .with_context(|| format!("failed to listen on {}", config.server.listen))?;

    server
        .join()
        .map_err(|e| anyhow!("server stopped: {:?}", e))?;
    Ok(())
}
