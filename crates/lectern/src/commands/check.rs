//! Validate the site without writing output.

use std::path::Path;

use anyhow::Result;
use lectern_static::{LintReport, StaticBuilder};

use crate::config::Config;

/// Run the check command.
pub async fn run(config_path: &Path, deny_warnings: bool) -> Result<()> {
    let config = Config::load(config_path)?.to_build_config();

    let site = StaticBuilder::new(config).load()?;
    site.report.log();

    tracing::info!(
        "Checked {} pages: {} errors, {} warnings",
        site.pages.len(),
        site.report.errors().count(),
        site.report.warnings().count()
    );

    verdict(&site.report, deny_warnings)
}

fn verdict(report: &LintReport, deny_warnings: bool) -> Result<()> {
    let errors = report.errors().count();
    let warnings = report.warnings().count();

    if errors > 0 {
        anyhow::bail!("Check failed with {} error(s)", errors);
    }
    if deny_warnings && warnings > 0 {
        anyhow::bail!("Check failed with {} warning(s) (--deny-warnings)", warnings);
    }

    Ok(())
}
