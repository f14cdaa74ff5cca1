//! ChemEquip Server - Main entry point

use anyhow::Result;
use chemequip_common::logging::{init_logging, LogConfig};
use tracing::info;

use chemequip_server::{api, config::Config};

#[tokio::main]
async fn main() -> Result<()> {
    let log_config = LogConfig::builder()
        .log_file_prefix("chemequip-server")
        .filter_directives("chemequip_server=debug,chemequip_ingest=debug,tower_http=debug,sqlx=warn")
        .build()
        .with_env()?;

    // Keep the guard alive so buffered file output is flushed on exit
    let _guard = init_logging(&log_config)?;

    info!("Starting ChemEquip Server");

    let config = Config::load()?;
    info!(
        host = %config.server.host,
        port = config.server.port,
        retention_limit = config.ingest.retention_limit,
        row_error_policy = %config.ingest.row_error_policy,
        "Configuration loaded"
    );

    api::serve(config).await
}
