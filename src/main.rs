//! ledgercore server entry point
//!
//! Loads `config/{env}.yaml`, initializes logging, connects the store and
//! serves the gateway. Without a `postgres_url` the server falls back to the
//! in-memory store, which is only suitable for local development.

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use ledgercore::config::AppConfig;
use ledgercore::db::Database;
use ledgercore::gateway;
use ledgercore::logging::init_logging;
use ledgercore::transfer::{PgTransferStore, TransferService, TransferStore};

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let config = AppConfig::load(&env);
    let _log_guard = init_logging(&config);

    info!(env = %env, "Starting ledgercore");

    let store: Arc<dyn TransferStore> = if let Some(url) = &config.postgres_url {
        let db = Database::connect(url)
            .await
            .context("Failed to connect to PostgreSQL")?;
        db.health_check().await.context("PostgreSQL ping failed")?;
        Arc::new(PgTransferStore::new(db.pool().clone()))
    } else {
        #[cfg(feature = "mem-store")]
        {
            warn!("postgres_url not set; using in-memory store (development only)");
            Arc::new(ledgercore::transfer::MemTransferStore::new())
        }
        #[cfg(not(feature = "mem-store"))]
        {
            anyhow::bail!("postgres_url is required (mem-store feature disabled)")
        }
    };

    info!(store = store.name(), "Transfer store ready");

    let service = Arc::new(TransferService::new(store));

    gateway::start_gateway(&config, service)
        .await
        .context("Gateway server error")?;

    Ok(())
}
