//! gclient workspace setup around a devtools-frontend checkout.

use std::path::Path;

use anyhow::{Context, Result};

use crate::process::{CommandRunner, Invocation};

/// Keeps depot_tools from updating itself mid-sync.
pub const DEPOT_TOOLS_UPDATE_ENV: &str = "DEPOT_TOOLS_UPDATE";

#[derive(Debug, Clone, Copy, Default)]
pub struct GclientSyncOptions {
    /// Skip post-sync hooks.
    pub nohooks: bool,
}

/// Register `checkout` as an unmanaged solution rooted at `scratch`, then
/// sync its dependencies without history.
pub fn setup_gclient_workspace(
    runner: &dyn CommandRunner,
    scratch: &Path,
    checkout: &Path,
    solution_name: &str,
    options: GclientSyncOptions,
) -> Result<()> {
    println!("Setting up gclient workspace");

    runner
        .run(
            &Invocation::new("gclient")
                .args(["config", "--unmanaged"])
                .path_arg(checkout)
                .args(["--name", solution_name])
                .current_dir(scratch),
        )
        .with_context(|| format!("configuring gclient for '{}'", checkout.display()))?;

    let mut sync = Invocation::new("gclient").args(["sync", "--no-history"]);
    if options.nohooks {
        sync = sync.arg("--nohooks");
    }
    runner
        .run(
            &sync
                .env(DEPOT_TOOLS_UPDATE_ENV, "0")
                .current_dir(scratch),
        )
        .context("syncing gclient dependencies")?;

    println!();
    Ok(())
}
