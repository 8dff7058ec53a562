//! Markdown changelog between two devtools-frontend revisions.
//!
//! Only first-parent history is listed, so commits that arrived through a
//! merged side branch are summarised by their merge commit.

use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::config::render_template;
use crate::process::{CommandRunner, Invocation};

/// NUL-separated so that pipes and other punctuation in subjects survive.
pub const LOG_FORMAT: &str = "%h%x00%an%x00%ae%x00%aI%x00%s";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogEntry {
    pub short_hash: String,
    pub author_name: String,
    pub author_email: String,
    /// Strict ISO-8601 author date.
    pub timestamp: String,
    pub subject: String,
}

/// How a changelog table is rendered.
#[derive(Debug, Clone)]
pub struct ChangelogStyle<'a> {
    pub repo_url: &'a str,
    /// Emails ending with this suffix render as an internal `@handle`.
    pub internal_email_domain: &'a str,
    pub max_rows: usize,
    pub truncation_template: &'a str,
}

/// Parse `git log --pretty=format:LOG_FORMAT` output, newest first.
pub fn parse_log(output: &str) -> Result<Vec<ChangelogEntry>> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let fields: Vec<&str> = line.splitn(5, '\0').collect();
            let [hash, name, email, timestamp, subject] = fields.as_slice() else {
                bail!("unexpected git log line: {line:?}");
            };
            Ok(ChangelogEntry {
                short_hash: hash.trim().to_string(),
                author_name: name.to_string(),
                author_email: email.to_string(),
                timestamp: timestamp.to_string(),
                subject: subject.to_string(),
            })
        })
        .collect()
}

/// Commits in `base..new` on the first-parent path.
pub fn query_changelog(
    runner: &dyn CommandRunner,
    checkout: &Path,
    base: &str,
    new: &str,
) -> Result<Vec<ChangelogEntry>> {
    let range = format!("{base}..{new}");
    let output = runner
        .run(
            &Invocation::new("git")
                .args(["log", "--first-parent"])
                .arg(format!("--pretty=format:{LOG_FORMAT}"))
                .arg(&range)
                .current_dir(checkout)
                .capture_stdout(),
        )
        .with_context(|| format!("reading devtools-frontend history for {range}"))?;
    parse_log(&output.stdout)
}

/// Render a markdown table, or an empty string when there are no commits.
pub fn render_table(entries: &[ChangelogEntry], style: &ChangelogStyle<'_>) -> String {
    if entries.is_empty() {
        return String::new();
    }

    let mut rows = vec![
        String::new(),
        "### Changelog".to_string(),
        String::new(),
        "| Commit | Author | Date/Time | Subject |".to_string(),
        "| ------ | ------ | --------- | ------- |".to_string(),
    ];

    for entry in entries.iter().take(style.max_rows) {
        let commit_url = format!("{}/commit/{}", style.repo_url, entry.short_hash);
        rows.push(format!(
            "| [{hash}]({url}) | {author} | {timestamp} | [{subject}]({url}) |",
            hash = entry.short_hash,
            url = commit_url,
            author = author_text(entry, style.internal_email_domain),
            timestamp = entry.timestamp,
            subject = entry.subject.replace('|', "\\|"),
        ));
    }

    if entries.len() > style.max_rows {
        let remaining = entries.len() - style.max_rows;
        let count = remaining.to_string();
        let noun = if remaining == 1 { "commit" } else { "commits" };
        let note = render_template(
            style.truncation_template,
            &[("count", count.as_str()), ("commits", noun)],
        );
        rows.push(format!("| ... | ... | ... | {note} |"));
    }

    rows.join("\n")
}

fn author_text(entry: &ChangelogEntry, internal_domain: &str) -> String {
    match entry.author_email.strip_suffix(internal_domain) {
        Some(handle) if !internal_domain.is_empty() && !handle.is_empty() => {
            format!("{} (@{handle})", entry.author_name)
        }
        _ => format!("{} ({})", entry.author_name, entry.author_email),
    }
}

/// Query and render the changelog for `base..new`.
pub fn generate_changelog_table(
    runner: &dyn CommandRunner,
    checkout: &Path,
    base: &str,
    new: &str,
    style: &ChangelogStyle<'_>,
) -> Result<String> {
    println!("Generating changelog table");
    let entries = query_changelog(runner, checkout, base, new)?;
    tracing::info!(commits = entries.len(), "collected changelog");
    Ok(render_table(&entries, style))
}
