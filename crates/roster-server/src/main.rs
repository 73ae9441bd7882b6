//! Roster Server — application entry point.
//!
//! Connects to SurrealDB using environment-driven configuration and
//! brings the schema up to date. The transport layer in front of the
//! membership service is deployed separately.

use roster_db::{DbConfig, DbManager};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("roster_db=info".parse().unwrap())
                .add_directive("roster_server=info".parse().unwrap()),
        )
        .json()
        .init();

    tracing::info!("Starting Roster server...");

    let config = DbConfig::from_env();
    let manager = match DbManager::connect(&config).await {
        Ok(manager) => manager,
        Err(error) => {
            tracing::error!(%error, "Failed to connect to SurrealDB");
            std::process::exit(1);
        }
    };

    if let Err(error) = roster_db::run_migrations(manager.client()).await {
        tracing::error!(%error, "Schema migration failed");
        std::process::exit(1);
    }

    tracing::info!("Schema is up to date. Roster server stopped.");
}
