//! Development server command.

use std::path::Path;

use anyhow::Result;
use lectern_server::{DevServer, DevServerConfig};

use crate::config::Config;

/// Run the dev server.
pub async fn run(config_path: &Path, host: String, port: u16, open: bool) -> Result<()> {
    tracing::info!("Starting development server on {}:{}", host, port);

    let config = DevServerConfig {
        build: Config::load(config_path)?.to_build_config(),
        port,
        host,
        open,
    };

    DevServer::new(config).start().await?;

    Ok(())
}
