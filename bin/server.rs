// CNPJ Registry - Web Server
// REST API with Axum

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

use cnpj_registry::api::{router, AppState};
use cnpj_registry::{Config, HttpLookupProvider, Resolver, SqliteStore};

#[tokio::main]
async fn main() -> Result<()> {
    cnpj_registry::logging::init("info,tower_http=debug");

    // Optional first argument: path to a config file
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = Config::load(config_path.as_deref())?;

    let store = SqliteStore::open(&config.database_path)
        .with_context(|| format!("Failed to open database {}", config.database_path.display()))?;
    tracing::info!(path = %config.database_path.display(), "database opened");

    let provider = HttpLookupProvider::new(&config.provider.base_url, config.provider.timeout())
        .context("Failed to build lookup provider client")?;
    tracing::info!(
        base_url = %config.provider.base_url,
        timeout_secs = config.provider.timeout_secs,
        "lookup provider configured"
    );

    let state = AppState {
        resolver: Resolver::new(Arc::new(store), Arc::new(provider)),
    };
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.server.bind_addr))?;

    tracing::info!(addr = %config.server.bind_addr, "server running");

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}
