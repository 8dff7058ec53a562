//! Resolving the devtools-frontend checkout to build from.
//!
//! Either a user-supplied local checkout is used as-is, or the requested
//! branch is shallow-cloned into the scratch directory and then unshallowed
//! (commits only) so that changelog generation has the ancestry it needs.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::process::{CommandRunner, Invocation};

/// Where the checkout came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutKind {
    Local,
    Fresh { branch: String },
}

#[derive(Debug, Clone)]
pub struct Checkout {
    pub path: PathBuf,
    pub kind: CheckoutKind,
}

impl Checkout {
    pub fn is_local(&self) -> bool {
        self.kind == CheckoutKind::Local
    }

    pub fn branch(&self) -> Option<&str> {
        match &self.kind {
            CheckoutKind::Fresh { branch } => Some(branch.as_str()),
            CheckoutKind::Local => None,
        }
    }
}

/// Use `local` when given, otherwise clone `branch` under `scratch`.
pub fn resolve_checkout(
    runner: &dyn CommandRunner,
    repo_url: &str,
    scratch: &Path,
    checkout_name: &str,
    local: Option<&Path>,
    branch: Option<&str>,
) -> Result<Checkout> {
    if let Some(path) = local {
        if !path.is_dir() {
            bail!("local checkout '{}' is not a directory", path.display());
        }
        // Later steps run with other working directories.
        let path = fs::canonicalize(path)
            .with_context(|| format!("resolving local checkout '{}'", path.display()))?;
        tracing::info!(path = %path.display(), "using local checkout");
        return Ok(Checkout {
            path,
            kind: CheckoutKind::Local,
        });
    }

    let Some(branch) = branch else {
        bail!("a branch is required when no local checkout is given");
    };

    let path = scratch.join(checkout_name);
    clone_devtools_frontend(runner, repo_url, &path, branch)?;
    Ok(Checkout {
        path,
        kind: CheckoutKind::Fresh {
            branch: branch.to_string(),
        },
    })
}

/// Shallow single-branch clone followed by a blobless unshallow fetch.
pub fn clone_devtools_frontend(
    runner: &dyn CommandRunner,
    repo_url: &str,
    checkout_path: &Path,
    branch: &str,
) -> Result<()> {
    println!("Checking out devtools-frontend");
    fs::create_dir_all(checkout_path).with_context(|| {
        format!(
            "creating checkout directory '{}'",
            checkout_path.display()
        )
    })?;

    runner
        .run(
            &Invocation::new("git")
                .args(["clone", repo_url, "--branch", branch, "--single-branch"])
                .args(["--depth", "1"])
                .path_arg(checkout_path),
        )
        .with_context(|| format!("cloning branch '{branch}' of {repo_url}"))?;

    // Commit history only, no file contents.
    runner
        .run(
            &Invocation::new("git")
                .args(["fetch", "--all", "--unshallow", "--filter=blob:none"])
                .current_dir(checkout_path),
        )
        .context("fetching full history of the devtools-frontend checkout")?;

    println!();
    Ok(())
}
