//! Release build of a devtools-frontend checkout with gn and autoninja.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::process::{CommandRunner, Invocation};
use crate::term::Palette;

/// Build output directory, relative to the checkout.
pub const RELEASE_OUT_DIR: &str = "out/Release";
pub const GN_ARGS_FILE: &str = "args.gn";
/// `is_official_build` only enables release optimisations; it has nothing to
/// do with branding.
pub const GN_ARGS: &str = "is_official_build=true\n";
/// gn summary recorded when the build is skipped.
pub const NOT_BUILT: &str = "<not built>";

#[derive(Debug, Clone)]
pub struct ReleaseBuild {
    pub build_path: PathBuf,
    /// Output of `gn args --overrides-only`, trimmed.
    pub gn_args_summary: String,
}

/// Write `args.gn`, generate ninja files, record the overridden gn args and
/// run the build.
pub fn perform_release_build(
    runner: &dyn CommandRunner,
    checkout: &Path,
    palette: &Palette,
) -> Result<ReleaseBuild> {
    println!("Performing release build of devtools-frontend");
    let build_path = checkout.join(RELEASE_OUT_DIR);
    write_gn_args(&build_path)?;

    runner
        .run(
            &Invocation::new("gn")
                .args(["gen", RELEASE_OUT_DIR])
                .current_dir(checkout),
        )
        .context("generating build files with gn")?;

    let args = runner
        .run(
            &Invocation::new("gn")
                .args(["args", RELEASE_OUT_DIR, "--list", "--short", "--overrides-only"])
                .current_dir(checkout)
                .capture_stdout(),
        )
        .context("listing overridden gn args")?;
    let gn_args_summary = args.stdout.trim().to_string();
    println!("{}", palette.dim(&gn_args_summary));

    runner
        .run(
            &Invocation::new("autoninja")
                .args(["-C", RELEASE_OUT_DIR])
                .current_dir(checkout),
        )
        .context("building devtools-frontend with autoninja")?;

    println!();
    Ok(ReleaseBuild {
        build_path,
        gn_args_summary,
    })
}

fn write_gn_args(build_path: &Path) -> Result<()> {
    fs::create_dir_all(build_path)
        .with_context(|| format!("creating build directory '{}'", build_path.display()))?;
    let args_path = build_path.join(GN_ARGS_FILE);
    fs::write(&args_path, GN_ARGS)
        .with_context(|| format!("writing gn args '{}'", args_path.display()))
}
