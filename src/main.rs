use log::{error, info};
use std::sync::Arc;

use labrange::configuration::Config;
use labrange::container_runtime::DockerCli;
use labrange::lab_management::LabManager;
use labrange::storage::SqliteStore;
use labrange::web_interface::WebServer;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_target(false)
        .init();

    let config = Config::from_args();
    info!("Starting labrange v{}", env!("CARGO_PKG_VERSION"));

    let store = match SqliteStore::connect(&config.database_path).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!("Unable to open session store: {}, exiting...", e);
            std::process::exit(1);
        }
    };

    let manager = Arc::new(LabManager::new(
        Arc::new(DockerCli::new()),
        store,
        config.lab_catalog(),
        config.base_port,
    ));

    if config.purge {
        match manager.purge_all().await {
            Ok(removed) => info!("Purge complete: {} container(s) removed", removed),
            Err(e) => {
                error!("Purge failed: {}, exiting...", e);
                std::process::exit(1);
            }
        }
        return;
    }

    // Resynchronize persisted sessions with the runtime; a failure here is
    // logged but does not prevent serving (the store may simply be empty).
    if let Err(e) = manager.reconcile_from_store().await {
        error!("Startup reconciliation failed: {}", e);
    }
    manager.preflight_images().await;

    info!("Serving lab API on http://{}", config.bind_address);
    let server = WebServer::new(manager);
    server.start(config.bind_address).await;
}
