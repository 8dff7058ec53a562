//! The BUILD_INFO provenance file.
//!
//! Line-oriented, signed text. The `Git revision: <40 hex>` line is the only
//! contract read back across runs; every other line is informational.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;

use super::host;
use super::signing::{self, SignatureStatus};
use crate::checkout::{Checkout, CheckoutKind};
use crate::error::SyncError;
use crate::process::{CommandRunner, Invocation};

pub const BUILD_INFO_FILENAME: &str = "BUILD_INFO";

// Split so this source file does not trip commit hooks.
pub const NO_BUILD_MARKER: &str = concat!("--no-build @", "nocommit");

static GIT_REVISION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^Git revision: ([0-9a-f]{40})").expect("revision pattern"));
static REMOTE_CHECKOUT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^Is local checkout: false$").expect("checkout pattern"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOrigin {
    Remote { url: String, branch: String },
    Local { hostname: String, user: String },
}

/// Everything recorded about one sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    pub git_revision: String,
    pub nohooks: bool,
    pub origin: CheckoutOrigin,
    pub gn_args_summary: String,
    /// `git status --porcelain` lines of the checkout.
    pub git_status: Vec<String>,
    pub no_build: bool,
}

impl BuildInfo {
    pub fn is_local_checkout(&self) -> bool {
        matches!(self.origin, CheckoutOrigin::Local { .. })
    }

    /// Canonical unsigned body, starting with the signing token.
    pub fn render_body(&self) -> String {
        let mut lines = vec![
            signing::signing_token(),
            format!("Git revision: {}", self.git_revision),
            format!("Built with --nohooks: {}", self.nohooks),
            format!("Is local checkout: {}", self.is_local_checkout()),
        ];
        match &self.origin {
            CheckoutOrigin::Remote { url, branch } => {
                lines.push(format!("Remote URL: {url}"));
                lines.push(format!("Remote branch: {branch}"));
            }
            CheckoutOrigin::Local { hostname, user } => {
                lines.push(format!("Hostname: {hostname}"));
                lines.push(format!("User: {user}"));
            }
        }

        lines.push("GN build args (overrides only):".to_string());
        lines.extend(indented(self.gn_args_summary.lines(), "<none>"));
        lines.push("Git status in checkout:".to_string());
        lines.extend(indented(
            self.git_status.iter().map(String::as_str),
            "<no changes>",
        ));
        lines.push(String::new());
        if self.no_build {
            lines.push(NO_BUILD_MARKER.to_string());
        }

        let mut body = lines.join("\n");
        if !body.ends_with('\n') {
            body.push('\n');
        }
        body
    }
}

fn indented<'a>(lines: impl Iterator<Item = &'a str>, placeholder: &str) -> Vec<String> {
    let mut out: Vec<String> = lines
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| format!("  {line}"))
        .collect();
    if out.is_empty() {
        out.push(format!("  {placeholder}"));
    }
    out
}

/// Inputs of [`collect_build_info`] that come from the run rather than git.
#[derive(Debug, Clone)]
pub struct RunFacts<'a> {
    pub repo_url: &'a str,
    pub nohooks: bool,
    pub gn_args_summary: &'a str,
    pub no_build: bool,
}

/// Query the checkout and host for everything BUILD_INFO records.
pub fn collect_build_info(
    runner: &dyn CommandRunner,
    checkout: &Checkout,
    facts: &RunFacts<'_>,
) -> Result<BuildInfo> {
    let git_revision = runner
        .run(
            &Invocation::new("git")
                .args(["rev-parse", "HEAD"])
                .current_dir(&checkout.path)
                .capture_stdout(),
        )
        .context("resolving checkout revision")?
        .stdout
        .trim()
        .to_string();
    if !is_full_revision(&git_revision) {
        bail!("`git rev-parse HEAD` returned '{git_revision}', expected a 40-character hex revision");
    }

    let status = runner
        .run(
            &Invocation::new("git")
                .args(["status", "--porcelain"])
                .current_dir(&checkout.path)
                .capture_stdout(),
        )
        .context("reading checkout status")?;
    let git_status = status
        .stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    let origin = match &checkout.kind {
        CheckoutKind::Fresh { branch } => CheckoutOrigin::Remote {
            url: facts.repo_url.to_string(),
            branch: branch.clone(),
        },
        CheckoutKind::Local => CheckoutOrigin::Local {
            hostname: host::hostname()?,
            user: host::username()?,
        },
    };

    Ok(BuildInfo {
        git_revision,
        nohooks: facts.nohooks,
        origin,
        gn_args_summary: facts.gn_args_summary.to_string(),
        git_status,
        no_build: facts.no_build,
    })
}

/// Sign and write `<package>/BUILD_INFO`, replacing any previous version.
pub fn write_build_info(package_path: &Path, info: &BuildInfo) -> Result<PathBuf> {
    println!("Generating BUILD_INFO for debugger-frontend");
    println!();
    let path = package_path.join(BUILD_INFO_FILENAME);
    let signed = signing::sign(&info.render_body())?;
    fs::create_dir_all(package_path)
        .with_context(|| format!("creating package directory '{}'", package_path.display()))?;
    fs::write(&path, signed).with_context(|| format!("writing '{}'", path.display()))?;
    Ok(path)
}

/// The parts of BUILD_INFO a later run relies on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedBuildInfo {
    pub git_revision: String,
    /// Anything but an explicit `Is local checkout: false` counts as local.
    pub is_local_checkout: bool,
    pub signature: SignatureStatus,
}

pub fn read_build_info(package_path: &Path) -> Result<ParsedBuildInfo> {
    let path = package_path.join(BUILD_INFO_FILENAME);
    let text =
        fs::read_to_string(&path).with_context(|| format!("reading '{}'", path.display()))?;
    parse_build_info(&path, &text)
}

pub fn parse_build_info(path: &Path, text: &str) -> Result<ParsedBuildInfo> {
    let git_revision = GIT_REVISION_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| SyncError::MalformedBuildInfo {
            path: path.to_path_buf(),
            reason: "could not extract git revision".to_string(),
        })?;
    let signature = signing::verify(text);
    if signature == SignatureStatus::Invalid {
        tracing::warn!(path = %path.display(), "BUILD_INFO signature does not match its contents");
    }
    Ok(ParsedBuildInfo {
        git_revision,
        is_local_checkout: !REMOTE_CHECKOUT_RE.is_match(text),
        signature,
    })
}

fn is_full_revision(rev: &str) -> bool {
    rev.len() == 40 && rev.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
