//! Installing built frontend files into the debugger-frontend package.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};

use super::filesystem::{copy_file_creating_parents, list_files, remove_dir_if_exists};
use super::manifest::read_manifest;

/// Destination of generated files, relative to the package directory.
pub const DEST_DIR_IN_PACKAGE: &str = "dist/third-party";
pub const LICENSE_FILENAME: &str = "LICENSE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub dest: PathBuf,
    pub files_copied: usize,
}

/// Replace `<package>/dist/third-party` with the manifest files of
/// `build_path` plus the checkout's license.
///
/// A failed copy leaves whatever was already copied in place.
pub fn install_artifacts(
    build_path: &Path,
    checkout: &Path,
    package_path: &Path,
) -> Result<InstallReport> {
    let dest = package_path.join(DEST_DIR_IN_PACKAGE);
    clean_package_files(&dest)?;

    println!("Copying built devtools-frontend files to debugger-frontend");
    println!();
    let files = read_manifest(build_path)?;
    let files_copied = copy_manifest_files(&build_path.join("gen"), &dest, &files)?;

    copy_license_to_package(checkout, &dest)?;

    let installed = list_files(&dest)?;
    tracing::debug!(files = installed.len(), dest = %dest.display(), "package files after install");

    Ok(InstallReport { dest, files_copied })
}

/// Remove stale generated files. Safe on a missing directory.
pub fn clean_package_files(dest: &Path) -> Result<()> {
    println!("Cleaning stale generated files in debugger-frontend");
    if remove_dir_if_exists(dest)? {
        tracing::info!(dest = %dest.display(), "removed stale package files");
    }
    println!();
    Ok(())
}

/// Copy `files` from `gen_dir` to `dest`, preserving relative layout.
///
/// Copies run on a small pool of scoped threads; each copy creates its own
/// parent directories before writing the file.
pub fn copy_manifest_files(gen_dir: &Path, dest: &Path, files: &[PathBuf]) -> Result<usize> {
    if files.is_empty() {
        return Ok(0);
    }

    let workers = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
        .min(files.len());
    let batch_size = files.len().div_ceil(workers);

    std::thread::scope(|scope| {
        let handles: Vec<_> = files
            .chunks(batch_size)
            .map(|batch| {
                scope.spawn(move || -> Result<()> {
                    for file in batch {
                        copy_file_creating_parents(&gen_dir.join(file), &dest.join(file))?;
                    }
                    Ok(())
                })
            })
            .collect();

        // Join every worker before reporting so no copy is still in flight.
        let mut first_error = None;
        for handle in handles {
            let result = handle
                .join()
                .map_err(|_| anyhow!("artifact copy worker panicked"))
                .and_then(|r| r);
            if let Err(err) = result {
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(files.len()),
        }
    })
    .with_context(|| format!("copying build outputs into '{}'", dest.display()))
}

pub fn copy_license_to_package(checkout: &Path, dest: &Path) -> Result<()> {
    println!("Copying LICENSE from devtools-frontend to debugger-frontend package");
    println!();
    copy_file_creating_parents(&checkout.join(LICENSE_FILENAME), &dest.join(LICENSE_FILENAME))
        .context("copying the devtools-frontend license")
}
