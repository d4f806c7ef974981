//! `subhubd` — the subhub CRM server binary.
//!
//! Usage:
//!   subhubd -c <context-name-or-path> [--listen <addr>]
//!
//! The context name resolves to `/etc/subhub/<name>.toml`.
//! If a path with `/` or `.` is given, it's used directly.

mod config;
mod routes;

use std::sync::Arc;

use clap::Parser;
use tracing::info;

use subhub_crm::CrmService;
use subhub_sql::SqliteStore;

use config::ServerConfig;

/// subhub CRM server.
#[derive(Parser, Debug)]
#[command(name = "subhubd", about = "subhub CRM server")]
struct Cli {
    /// Context name or path to config file.
    #[arg(short = 'c', long = "config", required = true)]
    config: String,

    /// Listen address (overrides default 0.0.0.0:8080).
    #[arg(long = "listen", default_value = "0.0.0.0:8080")]
    listen: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    // Load server configuration and refuse to start without a store.
    let config_path = ServerConfig::resolve_path(&cli.config);
    info!("Loading configuration from {}", config_path.display());
    let server_config = ServerConfig::load(&config_path)?;
    server_config.validate()?;

    let data_dir = std::path::PathBuf::from(&server_config.storage.data_dir);
    std::fs::create_dir_all(&data_dir)?;

    let sqlite_path = server_config.resolve_sqlite_path();
    info!("Opening database at {}", sqlite_path.display());
    let sql = SqliteStore::open(&sqlite_path)
        .map_err(|e| anyhow::anyhow!("failed to open SQL store: {}", e))?;

    let service = Arc::new(
        CrmService::new(Box::new(sql))
            .map_err(|e| anyhow::anyhow!("failed to initialize CRM service: {}", e))?,
    );

    let app = routes::build_router(service);

    info!("subhubd listening on {}", cli.listen);
    let listener = tokio::net::TcpListener::bind(&cli.listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
