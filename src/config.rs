//! Process-wide configuration for a sync run.
//!
//! Every field defaults to the constant the sync has always used, so running
//! without a config file behaves exactly like the stock pipeline. A TOML file
//! only needs the fields it overrides.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

/// Upstream mirror of the DevTools frontend.
pub const DEVTOOLS_FRONTEND_REPO_URL: &str =
    "https://github.com/facebook/react-native-devtools-frontend";

/// File name looked up in the user's config directory.
pub const USER_CONFIG_FILENAME: &str = "debugger-frontend-sync.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    pub repo_url: String,
    /// Package location relative to the repository root.
    pub package_dir: PathBuf,
    pub scratch_prefix: String,
    /// Directory name of the fresh checkout and its gclient solution name.
    pub checkout_name: String,
    pub diff: DiffConfig,
}

/// Conventions of the internal review flow.
///
/// Templates take `{name}` placeholders; see [`render_template`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiffConfig {
    pub vcs: String,
    pub review_tool: String,
    pub project_id: String,
    pub internal_email_domain: String,
    pub changelog_max_rows: usize,
    /// Placeholders: `{base}`, `{new}` (short revisions).
    pub title_template: String,
    pub do_not_land_prefix: String,
    /// Placeholders: `{package_label}`, `{base}`, `{new}`.
    pub summary_template: String,
    pub package_label: String,
    pub upstream_label: String,
    pub test_plan: String,
    pub reviewers: Vec<String>,
    pub tags: Vec<String>,
    /// Placeholders: `{count}`, `{commits}` ("commit" or "commits").
    pub truncation_template: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            repo_url: DEVTOOLS_FRONTEND_REPO_URL.to_string(),
            package_dir: PathBuf::from("packages/debugger-frontend"),
            scratch_prefix: "debugger-frontend-build-".to_string(),
            checkout_name: "devtools-frontend".to_string(),
            diff: DiffConfig::default(),
        }
    }
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            vcs: "hg".to_string(),
            review_tool: "jf".to_string(),
            project_id: "fbsource".to_string(),
            internal_email_domain: "@meta.com".to_string(),
            changelog_max_rows: 50,
            title_template: "[RN] Update debugger-frontend from {base}...{new}".to_string(),
            do_not_land_prefix: "DO NOT LAND ".to_string(),
            summary_template:
                "Changelog: [Internal] - Update `{package_label}` from {base}...{new}".to_string(),
            package_label: "@react-native/debugger-frontend".to_string(),
            upstream_label: "rn-chrome-devtools-frontend".to_string(),
            test_plan: "CI".to_string(),
            reviewers: vec!["#rn-debugging".to_string()],
            tags: vec!["msdkland[metro]".to_string()],
            truncation_template: "{count} more {commits} not shown".to_string(),
        }
    }
}

impl SyncConfig {
    /// Load a config file. Missing fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading sync config '{}'", path.display()))?;
        let config: SyncConfig = toml::from_str(&text)
            .with_context(|| format!("parsing sync config '{}'", path.display()))?;
        config
            .validate()
            .with_context(|| format!("validating sync config '{}'", path.display()))?;
        Ok(config)
    }

    /// Resolve the config for this run.
    ///
    /// An explicit path must exist. Otherwise the user config directory is
    /// consulted, falling back to built-in defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        if let Some(path) = user_config_path().filter(|p| p.is_file()) {
            tracing::info!(path = %path.display(), "using user sync config");
            return Self::load(&path);
        }
        Ok(Self::default())
    }

    fn validate(&self) -> Result<()> {
        if self.repo_url.trim().is_empty() {
            bail!("repo_url must not be empty");
        }
        if self.package_dir.is_absolute() {
            bail!(
                "package_dir must be relative to the repository root, got '{}'",
                self.package_dir.display()
            );
        }
        if self.checkout_name.is_empty() || self.checkout_name.contains('/') {
            bail!(
                "checkout_name must be a single path component, got '{}'",
                self.checkout_name
            );
        }
        if self.diff.changelog_max_rows == 0 {
            bail!("diff.changelog_max_rows must be at least 1");
        }
        Ok(())
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(USER_CONFIG_FILENAME))
}

/// Substitute `{name}` placeholders. Unknown placeholders stay verbatim.
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (name, value) in vars {
        out = out.replace(&format!("{{{name}}}"), value);
    }
    out
}
