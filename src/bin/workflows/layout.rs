use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

/// Nearest ancestor of `start` containing `package_dir`, joined with it.
pub(crate) fn locate_package_dir(start: &Path, package_dir: &Path) -> Result<PathBuf> {
    for ancestor in start.ancestors() {
        let candidate = ancestor.join(package_dir);
        if candidate.is_dir() {
            return Ok(candidate);
        }
    }
    bail!(
        "unable to locate '{}' from '{}'; run inside the repository or pass --package-dir",
        package_dir.display(),
        start.display()
    )
}
