//! Creating a review diff for a sync.
//!
//! Preconditions are checked before any build work starts, so a run that
//! cannot produce a diff fails in seconds rather than after a full build.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::changelog::{generate_changelog_table, ChangelogStyle};
use crate::config::{render_template, SyncConfig};
use crate::error::SyncError;
use crate::process::{CommandRunner, Invocation};
use crate::provenance::{read_build_info, BUILD_INFO_FILENAME};

pub const PROJECT_ID_FILENAME: &str = ".projectid";
pub const COMMIT_MESSAGE_FILENAME: &str = "commit-msg";

/// Baseline captured from the package before the new build overwrites it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffBaseInfo {
    pub package_path: PathBuf,
    pub base_git_revision: String,
}

/// Verify a diff can be created and capture the baseline revision.
pub fn check_can_create_diff(
    runner: &dyn CommandRunner,
    package_path: &Path,
    config: &SyncConfig,
) -> Result<DiffBaseInfo> {
    println!("Checking that we can create a diff");
    let diff = &config.diff;

    check_internal_checkout(runner, package_path, config).map_err(|err| {
        err.context(SyncError::DiffPrecondition {
            reason: format!("'{}' is not in a usable source checkout", package_path.display()),
            hint: format!(
                "Must be in an {} checkout (Meta-only) to create a diff",
                diff.project_id
            ),
        })
    })?;

    read_clean_baseline(runner, package_path, config).map_err(|err| {
        err.context(SyncError::DiffPrecondition {
            reason: format!("no usable baseline {BUILD_INFO_FILENAME}"),
            hint: format!("Must have a clean {BUILD_INFO_FILENAME} file to create a diff"),
        })
    })
}

fn check_internal_checkout(
    runner: &dyn CommandRunner,
    package_path: &Path,
    config: &SyncConfig,
) -> Result<()> {
    let diff = &config.diff;
    let root = runner
        .run(
            &Invocation::new(&diff.vcs)
                .arg("root")
                .current_dir(package_path)
                .capture_stdout(),
        )
        .context("locating the repository root")?;
    let repo_root = PathBuf::from(root.stdout.trim());

    let project_id_path = repo_root.join(PROJECT_ID_FILENAME);
    let project_id = fs::read_to_string(&project_id_path)
        .with_context(|| format!("reading '{}'", project_id_path.display()))?;
    let project_id = project_id.trim();
    if project_id != diff.project_id {
        bail!(
            "Expected {PROJECT_ID_FILENAME} to contain \"{}\" but found: {project_id}",
            diff.project_id
        );
    }

    runner
        .run(
            &Invocation::new(&diff.review_tool)
                .arg("-v")
                .current_dir(package_path)
                .quiet(),
        )
        .with_context(|| format!("checking that `{}` is available", diff.review_tool))?;
    Ok(())
}

fn read_clean_baseline(
    runner: &dyn CommandRunner,
    package_path: &Path,
    config: &SyncConfig,
) -> Result<DiffBaseInfo> {
    let status = runner
        .run(
            &Invocation::new(&config.diff.vcs)
                .args(["status", BUILD_INFO_FILENAME])
                .current_dir(package_path)
                .capture_stdout(),
        )
        .with_context(|| format!("checking the status of {BUILD_INFO_FILENAME}"))?;
    if !status.stdout.trim().is_empty() {
        bail!(
            "{BUILD_INFO_FILENAME} has uncommitted changes: {}",
            status.stdout.trim()
        );
    }

    let parsed = read_build_info(package_path)?;
    Ok(DiffBaseInfo {
        package_path: package_path.to_path_buf(),
        base_git_revision: parsed.git_revision,
    })
}

/// Inputs of the commit message that vary per run.
#[derive(Debug, Clone)]
pub struct CommitMessageInputs<'a> {
    pub base_revision: &'a str,
    pub new_revision: &'a str,
    pub do_not_land: bool,
    pub changelog_table: &'a str,
}

pub fn compose_commit_message(inputs: &CommitMessageInputs<'_>, config: &SyncConfig) -> String {
    let diff = &config.diff;
    let base = short_revision(inputs.base_revision);
    let new = short_revision(inputs.new_revision);
    let vars = [
        ("base", base),
        ("new", new),
        ("package_label", diff.package_label.as_str()),
    ];

    let mut title = render_template(&diff.title_template, &vars);
    if inputs.do_not_land {
        title.insert_str(0, &diff.do_not_land_prefix);
    }

    [
        title,
        String::new(),
        "Summary:".to_string(),
        render_template(&diff.summary_template, &vars),
        String::new(),
        format!(
            "Resyncs `{}` from GitHub - see `{}` [changelog]({}/compare/{}...{}).",
            diff.package_label,
            diff.upstream_label,
            config.repo_url,
            inputs.base_revision,
            inputs.new_revision
        ),
        String::new(),
        inputs.changelog_table.to_string(),
        String::new(),
        format!("Test Plan: {}", diff.test_plan),
        String::new(),
        format!("Reviewers: {}", diff.reviewers.join(", ")),
        String::new(),
        format!("Tags: {}", diff.tags.join(", ")),
        String::new(),
    ]
    .join("\n")
}

fn short_revision(rev: &str) -> &str {
    rev.get(..7).unwrap_or(rev)
}

/// Where [`create_sync_diff`] reads from and writes to.
#[derive(Debug, Clone, Copy)]
pub struct DiffContext<'a> {
    pub scratch: &'a Path,
    pub checkout: &'a Path,
    pub no_build: bool,
}

/// Commit the package and submit it for review.
///
/// `--no-build` diffs are abandoned right after submission; they only
/// exercise the diff mechanics.
pub fn create_sync_diff(
    runner: &dyn CommandRunner,
    base: &DiffBaseInfo,
    ctx: DiffContext<'_>,
    config: &SyncConfig,
) -> Result<()> {
    println!("Creating a sync diff");
    let diff = &config.diff;
    let package_path = &base.package_path;

    let new = read_build_info(package_path).context("reading the freshly written BUILD_INFO")?;

    let changelog_table = generate_changelog_table(
        runner,
        ctx.checkout,
        &base.base_git_revision,
        &new.git_revision,
        &ChangelogStyle {
            repo_url: &config.repo_url,
            internal_email_domain: &diff.internal_email_domain,
            max_rows: diff.changelog_max_rows,
            truncation_template: &diff.truncation_template,
        },
    )?;

    let message = compose_commit_message(
        &CommitMessageInputs {
            base_revision: &base.base_git_revision,
            new_revision: &new.git_revision,
            do_not_land: new.is_local_checkout || ctx.no_build,
            changelog_table: &changelog_table,
        },
        config,
    );

    let message_path = ctx.scratch.join(COMMIT_MESSAGE_FILENAME);
    fs::write(&message_path, message)
        .with_context(|| format!("writing commit message '{}'", message_path.display()))?;

    runner
        .run(
            &Invocation::new(&diff.vcs)
                .arg("commit")
                .path_arg(package_path)
                .args(["--addremove", "-l"])
                .path_arg(&message_path)
                .current_dir(package_path),
        )
        .context("committing the updated package")?;

    runner
        .run(
            &Invocation::new(&diff.review_tool)
                .args(["submit", "--draft"])
                .current_dir(package_path),
        )
        .context("submitting the diff for review")?;

    if ctx.no_build {
        runner
            .run(
                &Invocation::new(&diff.review_tool)
                    .args(["action", "--abandon"])
                    .current_dir(package_path),
            )
            .context("abandoning the --no-build diff")?;
    }

    Ok(())
}
