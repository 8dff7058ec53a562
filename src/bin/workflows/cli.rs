use std::path::PathBuf;

use clap::Parser;
use debugger_frontend_sync::RunOptions;

/// Sync and build the Chrome DevTools frontend into the debugger-frontend
/// package.
#[derive(Parser, Debug)]
#[command(name = "debugger-frontend-sync", version, about)]
pub(crate) struct Cli {
    /// Build from this devtools-frontend checkout instead of cloning
    #[arg(value_name = "CHECKOUT")]
    pub(crate) local_checkout: Option<PathBuf>,

    /// Branch of the devtools-frontend repository to clone
    #[arg(long, value_name = "NAME")]
    pub(crate) branch: Option<String>,

    /// Skip gclient hooks when syncing dependencies
    #[arg(long)]
    pub(crate) nohooks: bool,

    /// Leave the scratch directory in place after the run
    #[arg(long)]
    pub(crate) keep_scratch: bool,

    /// Commit the updated package and submit a draft diff (Meta-only)
    #[arg(long)]
    pub(crate) create_diff: bool,

    /// Only check out and record BUILD_INFO; do not build or copy files
    #[arg(long)]
    pub(crate) no_build: bool,

    /// Sync config file (TOML)
    #[arg(long, value_name = "PATH")]
    pub(crate) config: Option<PathBuf>,

    /// debugger-frontend package directory [default: located from the working directory]
    #[arg(long, value_name = "PATH")]
    pub(crate) package_dir: Option<PathBuf>,
}

impl Cli {
    pub(crate) fn run_options(&self) -> RunOptions {
        RunOptions {
            branch: self.branch.clone(),
            local_checkout: self.local_checkout.clone(),
            keep_scratch: self.keep_scratch,
            nohooks: self.nohooks,
            create_diff: self.create_diff,
            no_build: self.no_build,
        }
    }
}
