// src/main.rs
use std::env;
use std::sync::Arc;

use budget_snapshots::config::{AppConfig, RemoteCredentials};
use budget_snapshots::database::db::connection::get_db_pool;
use budget_snapshots::database::db::documents::SqliteDocumentStore;
use budget_snapshots::database::db::migrate;
use budget_snapshots::{backend, cli, telemetry};
use dotenvy::dotenv;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    telemetry::init();

    let config = AppConfig::from_env()?;
    let args: Vec<String> = env::args().collect();

    if args.len() > 1 && args[1] == "server" {
        tracing::info!("Starting backend server...");
        let pool = get_db_pool(&config.database_url).await?;
        migrate::run_migrations(&pool).await?;

        let state = backend::AppState {
            docs: Arc::new(SqliteDocumentStore::new(pool)),
            credentials: RemoteCredentials::from_env().ok(),
        };
        backend::run_server(state, config.server_addr).await?;
    } else {
        cli::run(&config).await?;
    }
    Ok(())
}
