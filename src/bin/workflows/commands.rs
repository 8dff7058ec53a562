use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use debugger_frontend_sync::process::SystemRunner;
use debugger_frontend_sync::term::Palette;
use debugger_frontend_sync::{SyncConfig, SyncPipeline};

use crate::workflows::{locate_package_dir, Cli};

pub(crate) fn run_sync(cli: &Cli, palette: Palette) -> Result<()> {
    let options = cli.run_options();
    options.validate()?;

    let config = SyncConfig::resolve(cli.config.as_deref())?;
    let package_path = resolve_package_path(cli, &config)?;
    tracing::debug!(package = %package_path.display(), "resolved package directory");

    let runner = SystemRunner::new(palette);
    let summary = SyncPipeline::new(&runner, &config, package_path, palette).run(&options)?;

    if let Some(scratch) = &summary.kept_scratch {
        tracing::info!(scratch = %scratch.display(), "scratch directory kept");
    }
    Ok(())
}

/// Absolute package directory; commands later run with it as their cwd.
fn resolve_package_path(cli: &Cli, config: &SyncConfig) -> Result<PathBuf> {
    let dir = match &cli.package_dir {
        Some(dir) => dir.clone(),
        None => {
            let cwd = std::env::current_dir().context("resolving current directory")?;
            locate_package_dir(&cwd, &config.package_dir)?
        }
    };
    fs::canonicalize(&dir)
        .with_context(|| format!("resolving package directory '{}'", dir.display()))
}
