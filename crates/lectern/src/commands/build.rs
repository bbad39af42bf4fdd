//! Static site build command.

use std::path::{Path, PathBuf};

use anyhow::Result;
use lectern_static::StaticBuilder;

use crate::config::Config;

/// Run the build command.
pub async fn run(config_path: &Path, output: Option<PathBuf>, minify: Option<bool>) -> Result<()> {
    tracing::info!("Building static site...");

    let mut config = Config::load(config_path)?.to_build_config();
    if let Some(output) = output {
        config.output_dir = output;
    }
    if let Some(minify) = minify {
        config.minify = minify;
    }

    let result = StaticBuilder::new(config).build().await?;

    let warnings = result.report.warnings().count();
    tracing::info!(
        "Built {} pages in {}ms ({} warnings)",
        result.pages,
        result.duration_ms,
        warnings
    );

    tracing::info!("Output: {}", result.output_dir.display());

    Ok(())
}
