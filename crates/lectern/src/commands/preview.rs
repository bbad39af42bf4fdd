//! Preview server command.

use std::path::{Path, PathBuf};

use anyhow::Result;
use lectern_static::page::normalize_base_url;

use crate::config::Config;

/// Run the preview command.
pub async fn run(config_path: &Path, port: u16, dir: Option<PathBuf>, open: bool) -> Result<()> {
    let config = Config::load(config_path)?;
    let dir = dir.unwrap_or_else(|| config.resolve(&config.docs.output));

    if !dir.join("index.html").exists() {
        anyhow::bail!(
            "No built site found in {}. Run 'lectern build' first.",
            dir.display()
        );
    }

    let base_url = normalize_base_url(&config.site.base_url);
    tracing::info!("Previewing {}", dir.display());

    let app = lectern_server::site_router(&dir, &base_url);
    lectern_server::serve(app, "127.0.0.1", port, &base_url, open).await?;

    Ok(())
}
