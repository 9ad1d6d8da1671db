//! Todo API server
//!
//! Task-tracking HTTP service backed by SQLite.

use anyhow::Result;
use clap::Parser;
use todo_api::cli::{Cli, Command};
use todo_api::config::{Config, ConfigLoader};
use todo_api::db::{Database, TaskStore};
use todo_api::http::{self, AppState, ServeLimits, ServeOutcome};
use todo_api::logging::{self, LogTarget};
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut loader = ConfigLoader::load(cli.config.clone())?;

    // CLI flags override file and environment
    let config = loader.config_mut();
    if let Some(database) = &cli.database {
        config.storage_path = database.clone();
    }
    if let Some(address) = &cli.address {
        config.http_server.address = address.clone();
    }

    let config_path = loader.config_path().cloned();
    let source = loader.source();
    let config = loader.into_config()?;

    logging::init(&LogTarget::parse(&cli.log), cli.verbose, config.env)?;

    info!(
        "Starting todo-api v{} ({:?})",
        env!("CARGO_PKG_VERSION"),
        config.env
    );
    match config_path {
        Some(path) => info!("Config: {} ({})", path.display(), source),
        None => info!("Config: {}", source),
    }

    match cli.command.unwrap_or(Command::Serve) {
        Command::Init => run_init(&config),
        Command::Serve => run_server(config).await,
    }
}

fn open_database(config: &Config) -> Result<Database> {
    config.ensure_db_dir()?;
    let db = Database::open(&config.storage_path)?;
    info!("Database: {:?}", config.storage_path);
    Ok(db)
}

/// Create the database and schema, then exit.
fn run_init(config: &Config) -> Result<()> {
    let db = open_database(config)?;
    let schema = db.get_schema(false)?;
    for table in &schema.tables {
        let columns: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
        info!("Table {}: {}", table.name, columns.join(", "));
    }
    info!(
        "Schema ready (SQLite {}, {} tasks)",
        schema.sqlite_version,
        db.task_count()?
    );
    db.close()?;
    Ok(())
}

/// Run the HTTP server until SIGINT/SIGTERM.
async fn run_server(config: Config) -> Result<()> {
    let db = open_database(&config)?;
    debug!("Database initialized successfully");

    let state = AppState::new(TaskStore::new(db.clone()), config.http_server.timeout());
    let app = http::router(state);

    let addr = config.http_server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        "Listening on http://{} (request timeout {} ms, idle timeout {} ms)",
        listener.local_addr()?,
        config.http_server.timeout_ms,
        config.http_server.idle_timeout_ms
    );

    let limits = ServeLimits {
        idle_timeout: config.http_server.idle_timeout(),
        shutdown_grace: config.http_server.shutdown_grace(),
    };
    let outcome = http::serve(listener, app, http::shutdown_signal(), limits).await?;

    if outcome == ServeOutcome::GraceElapsed {
        warn!("Some requests were still running when the grace period ended");
    }

    // Handlers cut off by the grace period may still hold store clones; the
    // connection then closes when the last of them drops.
    if db.close()? {
        info!("Database closed");
    } else {
        warn!("Database still in use at exit, leaving it to drop");
    }

    Ok(())
}
