//! End-to-end sync of devtools-frontend into the debugger-frontend package.
//!
//! A run is strictly linear:
//!
//! ```text
//! validate options
//!     -> preflight tools
//!     -> create scratch
//!     -> [--create-diff] capture diff baseline
//!     -> resolve or clone checkout
//!     -> [!--no-build] gclient workspace -> release build -> install artifacts
//!     -> write BUILD_INFO
//!     -> [--create-diff] create diff
//!     -> clean up scratch
//! ```
//!
//! The first failing step ends the run. Nothing is rolled back and the
//! scratch directory is left behind for inspection.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::artifact::{install_artifacts, InstallReport};
use crate::build::{perform_release_build, NOT_BUILT};
use crate::checkout::resolve_checkout;
use crate::config::SyncConfig;
use crate::diff::{check_can_create_diff, create_sync_diff, DiffContext};
use crate::error::SyncError;
use crate::preflight::check_host_tools;
use crate::process::CommandRunner;
use crate::provenance::{collect_build_info, write_build_info, RunFacts};
use crate::term::Palette;
use crate::workspace::{setup_gclient_workspace, GclientSyncOptions};

/// Options of a single run, as given on the command line.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub branch: Option<String>,
    /// Build from this checkout instead of cloning `branch`.
    pub local_checkout: Option<PathBuf>,
    pub keep_scratch: bool,
    pub nohooks: bool,
    pub create_diff: bool,
    pub no_build: bool,
}

impl RunOptions {
    /// Reject option sets that cannot name a checkout.
    pub fn validate(&self) -> Result<()> {
        if self.local_checkout.is_none() && self.branch.as_deref().map_or(true, str::is_empty) {
            return Err(SyncError::Usage("Missing option --branch".to_string()).into());
        }
        Ok(())
    }
}

/// Uniquely named directory holding the checkout and gclient state.
#[derive(Debug)]
pub struct ScratchWorkspace {
    path: PathBuf,
}

impl ScratchWorkspace {
    /// Create a fresh directory under `parent`.
    ///
    /// The directory outlives this value; only [`ScratchWorkspace::finish`]
    /// removes it.
    pub fn create_in(parent: &Path, prefix: &str) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(prefix)
            .tempdir_in(parent)
            .with_context(|| format!("creating scratch directory under '{}'", parent.display()))?;
        Ok(Self { path: dir.keep() })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the directory unless `keep`. Returns the path when kept.
    pub fn finish(self, keep: bool) -> Result<Option<PathBuf>> {
        if keep {
            println!("Not cleaning up temporary files because of --keep-scratch");
            return Ok(Some(self.path));
        }
        println!("Cleaning up temporary files");
        std::fs::remove_dir_all(&self.path).with_context(|| {
            format!("removing scratch directory '{}'", self.path.display())
        })?;
        Ok(None)
    }
}

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub build_info_path: PathBuf,
    /// `None` for `--no-build` runs.
    pub installed: Option<InstallReport>,
    pub git_revision: String,
    pub diff_created: bool,
    /// Set when `--keep-scratch` left the scratch directory in place.
    pub kept_scratch: Option<PathBuf>,
}

/// Drives one sync against a single package directory.
pub struct SyncPipeline<'a> {
    runner: &'a dyn CommandRunner,
    config: &'a SyncConfig,
    package_path: PathBuf,
    palette: Palette,
    scratch_root: PathBuf,
}

impl<'a> SyncPipeline<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        config: &'a SyncConfig,
        package_path: PathBuf,
        palette: Palette,
    ) -> Self {
        Self {
            runner,
            config,
            package_path,
            palette,
            scratch_root: std::env::temp_dir(),
        }
    }

    /// Create scratch directories under `root` instead of the system temp dir.
    pub fn with_scratch_root(mut self, root: PathBuf) -> Self {
        self.scratch_root = root;
        self
    }

    pub fn run(&self, options: &RunOptions) -> Result<RunSummary> {
        options.validate()?;
        let runner = self.runner;
        let config = self.config;

        let mut banner = String::from("Syncing debugger-frontend");
        if options.no_build {
            banner.push_str(" (--no-build)");
        }
        println!("{}", self.palette.banner(&banner));
        println!();
        tracing::info!(
            package = %self.package_path.display(),
            branch = ?options.branch,
            local_checkout = ?options.local_checkout,
            no_build = options.no_build,
            create_diff = options.create_diff,
            "starting sync"
        );

        check_host_tools(runner, !options.no_build)?;

        let scratch = ScratchWorkspace::create_in(&self.scratch_root, &config.scratch_prefix)?;
        println!(
            "{}",
            self.palette
                .dim(&format!("Scratch path: {}", scratch.path().display()))
        );
        println!();

        let diff_base = if options.create_diff {
            Some(check_can_create_diff(runner, &self.package_path, config)?)
        } else {
            None
        };

        let checkout = resolve_checkout(
            runner,
            &config.repo_url,
            scratch.path(),
            &config.checkout_name,
            options.local_checkout.as_deref(),
            options.branch.as_deref(),
        )?;

        let (gn_args_summary, installed) = if options.no_build {
            tracing::info!("skipping build");
            (NOT_BUILT.to_string(), None)
        } else {
            setup_gclient_workspace(
                runner,
                scratch.path(),
                &checkout.path,
                &config.checkout_name,
                GclientSyncOptions {
                    nohooks: options.nohooks,
                },
            )?;
            let build = perform_release_build(runner, &checkout.path, &self.palette)?;
            let report = install_artifacts(&build.build_path, &checkout.path, &self.package_path)?;
            tracing::info!(files = report.files_copied, dest = %report.dest.display(), "installed artifacts");
            (build.gn_args_summary, Some(report))
        };

        let info = collect_build_info(
            runner,
            &checkout,
            &RunFacts {
                repo_url: &config.repo_url,
                nohooks: options.nohooks,
                gn_args_summary: &gn_args_summary,
                no_build: options.no_build,
            },
        )?;
        let build_info_path = write_build_info(&self.package_path, &info)?;

        if let Some(base) = &diff_base {
            create_sync_diff(
                runner,
                base,
                DiffContext {
                    scratch: scratch.path(),
                    checkout: &checkout.path,
                    no_build: options.no_build,
                },
                config,
            )?;
        }

        let kept_scratch = scratch.finish(options.keep_scratch)?;

        if !options.no_build {
            println!();
            println!(
                "{}",
                self.palette.success(&format!(
                    "Sync done. Check in any updated files under {}.",
                    self.package_path.display()
                ))
            );
        }

        Ok(RunSummary {
            build_info_path,
            installed,
            git_revision: info.git_revision,
            diff_created: diff_base.is_some(),
            kept_scratch,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::testing::ScriptedRunner;
    use crate::provenance::{read_build_info, BuildInfo, CheckoutOrigin, SignatureStatus};
    use crate::provenance::build_info::NO_BUILD_MARKER;
    use std::fs;
    use tempfile::TempDir;

    const REV_A: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const REV_B: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

    /// A repository root with a package dir, a local devtools-frontend
    /// checkout whose build output already exists, and a scratch root.
    struct Fixture {
        _temp: TempDir,
        root: PathBuf,
        package: PathBuf,
        checkout: PathBuf,
        scratch_root: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            Self::with_temp(TempDir::new().unwrap())
        }

        fn with_temp(temp: TempDir) -> Self {
            let root = temp.path().join("repo");
            let package = root.join("packages/debugger-frontend");
            let checkout = temp.path().join("devtools-frontend");
            let scratch_root = temp.path().join("tmp");
            fs::create_dir_all(&package).unwrap();
            fs::create_dir_all(&scratch_root).unwrap();

            let gen = checkout.join("out/Release/gen");
            fs::create_dir_all(gen.join("front_end/core")).unwrap();
            fs::write(gen.join("front_end/core/root.js"), "export {};").unwrap();
            fs::write(gen.join("front_end/inspector.html"), "<html>").unwrap();
            fs::write(
                gen.join("input_grd_files.json"),
                r#"["front_end/core/root.js", "front_end/inspector.html"]"#,
            )
            .unwrap();
            fs::write(checkout.join("LICENSE"), "BSD").unwrap();

            Self {
                _temp: temp,
                root,
                package,
                checkout,
                scratch_root,
            }
        }

        fn pipeline<'a>(
            &self,
            runner: &'a ScriptedRunner,
            config: &'a SyncConfig,
        ) -> SyncPipeline<'a> {
            SyncPipeline::new(runner, config, self.package.clone(), Palette::plain())
                .with_scratch_root(self.scratch_root.clone())
        }

        fn local_options(&self) -> RunOptions {
            RunOptions {
                local_checkout: Some(self.checkout.clone()),
                ..Default::default()
            }
        }

        fn scratch_entries(&self) -> usize {
            fs::read_dir(&self.scratch_root).unwrap().count()
        }
    }

    fn runner_at(rev: &str) -> ScriptedRunner {
        ScriptedRunner::new()
            .reply("git rev-parse", &format!("{rev}\n"))
            .reply("gn args", "is_official_build = true\n")
    }

    #[test]
    fn test_missing_branch_is_a_usage_error_without_side_effects() {
        let fixture = Fixture::new();
        let runner = runner_at(REV_A);
        let config = SyncConfig::default();

        let err = fixture
            .pipeline(&runner, &config)
            .run(&RunOptions::default())
            .unwrap_err();

        assert!(SyncError::is_usage(&err));
        assert_eq!(err.to_string(), "Missing option --branch");
        assert!(runner.command_lines().is_empty());
        assert_eq!(fixture.scratch_entries(), 0);
        assert!(!fixture.package.join("BUILD_INFO").exists());
    }

    #[test]
    fn test_full_run_from_local_checkout() {
        let fixture = Fixture::new();
        let stale = fixture.package.join("dist/third-party/stale.js");
        fs::create_dir_all(stale.parent().unwrap()).unwrap();
        fs::write(&stale, "old").unwrap();
        let runner = runner_at(REV_A);
        let config = SyncConfig::default();

        let summary = fixture
            .pipeline(&runner, &config)
            .run(&fixture.local_options())
            .unwrap();

        let lines = runner.command_lines();
        let order: Vec<&str> = [
            "git --version",
            "gclient --version",
            "which gn",
            "which autoninja",
            "gclient config --unmanaged",
            "gclient sync --no-history",
            "gn gen out/Release",
            "gn args out/Release",
            "autoninja -C out/Release",
            "git rev-parse HEAD",
            "git status --porcelain",
        ]
        .to_vec();
        assert_eq!(lines.len(), order.len());
        for (line, prefix) in lines.iter().zip(order) {
            assert!(line.starts_with(prefix), "{line} should start with {prefix}");
        }
        assert!(!runner.ran("git clone"));

        let dest = fixture.package.join("dist/third-party");
        assert!(!stale.exists());
        assert_eq!(
            fs::read_to_string(dest.join("front_end/core/root.js")).unwrap(),
            "export {};"
        );
        assert_eq!(fs::read_to_string(dest.join("LICENSE")).unwrap(), "BSD");
        assert_eq!(summary.installed.unwrap().files_copied, 2);

        let parsed = read_build_info(&fixture.package).unwrap();
        assert_eq!(parsed.git_revision, REV_A);
        assert!(parsed.is_local_checkout);
        assert_eq!(parsed.signature, SignatureStatus::Valid);
        let text = fs::read_to_string(&summary.build_info_path).unwrap();
        assert!(text.contains("  is_official_build = true"));
        assert!(!text.contains(NO_BUILD_MARKER));

        assert_eq!(fixture.scratch_entries(), 0);
        assert!(summary.kept_scratch.is_none());
        assert!(!summary.diff_created);
    }

    #[test]
    fn test_fresh_clone_lands_in_scratch() {
        let fixture = Fixture::new();
        let runner = runner_at(REV_A);
        let config = SyncConfig::default();
        let options = RunOptions {
            branch: Some("main".to_string()),
            keep_scratch: true,
            no_build: true,
            ..Default::default()
        };

        let summary = fixture.pipeline(&runner, &config).run(&options).unwrap();

        let scratch = summary.kept_scratch.unwrap();
        assert!(scratch.starts_with(&fixture.scratch_root));
        assert!(runner.ran(&format!(
            "git clone {} --branch main",
            config.repo_url
        )));
        assert!(scratch.join("devtools-frontend").is_dir());
        assert!(!read_build_info(&fixture.package).unwrap().is_local_checkout);
    }

    #[test]
    fn test_relative_checkout_reaches_tools_as_absolute_path() {
        let cwd = std::env::current_dir().unwrap();
        let fixture = Fixture::with_temp(TempDir::new_in(&cwd).unwrap());
        let relative = fixture
            .checkout
            .strip_prefix(&cwd)
            .unwrap_or(&fixture.checkout)
            .to_path_buf();
        assert!(relative.is_relative());
        let runner = runner_at(REV_A);
        let config = SyncConfig::default();

        fixture
            .pipeline(&runner, &config)
            .run(&RunOptions {
                local_checkout: Some(relative),
                ..Default::default()
            })
            .unwrap();

        let absolute = fs::canonicalize(&fixture.checkout).unwrap();
        let gclient_config = runner
            .invocations()
            .into_iter()
            .find(|inv| inv.display().starts_with("gclient config"))
            .unwrap();
        assert_eq!(
            gclient_config.display(),
            format!(
                "gclient config --unmanaged {} --name devtools-frontend",
                absolute.display()
            )
        );
        assert!(runner
            .invocations()
            .iter()
            .filter(|inv| inv.display().starts_with("gn") || inv.display().starts_with("git"))
            .filter_map(|inv| inv.cwd().map(Path::to_path_buf))
            .all(|dir| dir == absolute));
    }

    #[test]
    fn test_no_build_records_marker_and_skips_build_steps() {
        let fixture = Fixture::new();
        let runner = runner_at(REV_A);
        let config = SyncConfig::default();
        let args_gn = fixture.checkout.join("out/Release/args.gn");

        let summary = fixture
            .pipeline(&runner, &config)
            .run(&RunOptions {
                no_build: true,
                ..fixture.local_options()
            })
            .unwrap();

        assert!(summary.installed.is_none());
        assert!(!args_gn.exists());
        for step in ["gclient", "gn", "autoninja", "which"] {
            assert!(!runner.ran(step), "{step} should not run");
        }
        assert!(!fixture.package.join("dist").exists());

        let text = fs::read_to_string(&summary.build_info_path).unwrap();
        assert!(text.contains(NO_BUILD_MARKER));
        assert!(text.contains("  <not built>"));
    }

    #[test]
    fn test_failing_step_stops_the_run_and_keeps_scratch() {
        let fixture = Fixture::new();
        let runner = runner_at(REV_A).fail("autoninja");
        let config = SyncConfig::default();

        let result = fixture
            .pipeline(&runner, &config)
            .run(&fixture.local_options());

        assert!(result.is_err());
        assert!(!runner.ran("git rev-parse"));
        assert!(!fixture.package.join("BUILD_INFO").exists());
        assert_eq!(fixture.scratch_entries(), 1);
    }

    #[test]
    fn test_missing_depot_tools_fails_before_scratch() {
        let fixture = Fixture::new();
        let runner = runner_at(REV_A).fail("gclient --version");
        let config = SyncConfig::default();

        let err = fixture
            .pipeline(&runner, &config)
            .run(&fixture.local_options())
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<SyncError>(),
            Some(SyncError::MissingTool { .. })
        ));
        assert_eq!(fixture.scratch_entries(), 0);
    }

    #[test]
    fn test_create_diff_uses_previous_revision_as_changelog_base() {
        let fixture = Fixture::new();
        fs::write(fixture.root.join(".projectid"), "fbsource\n").unwrap();
        crate::provenance::write_build_info(
            &fixture.package,
            &BuildInfo {
                git_revision: REV_A.to_string(),
                nohooks: false,
                origin: CheckoutOrigin::Remote {
                    url: "https://example.com".to_string(),
                    branch: "main".to_string(),
                },
                gn_args_summary: String::new(),
                git_status: vec![],
                no_build: false,
            },
        )
        .unwrap();
        let runner = runner_at(REV_B).reply("hg root", &format!("{}\n", fixture.root.display()));
        let config = SyncConfig::default();

        let summary = fixture
            .pipeline(&runner, &config)
            .run(&RunOptions {
                create_diff: true,
                no_build: true,
                ..fixture.local_options()
            })
            .unwrap();

        assert!(summary.diff_created);
        assert_eq!(summary.git_revision, REV_B);
        let lines = runner.command_lines();
        let log = lines
            .iter()
            .find(|line| line.starts_with("git log"))
            .unwrap();
        assert!(log.ends_with(&format!("{REV_A}..{REV_B}")));

        // Baseline is captured before the checkout is touched.
        let hg_root = lines.iter().position(|l| l == "hg root").unwrap();
        let rev_parse = lines.iter().position(|l| l == "git rev-parse HEAD").unwrap();
        assert!(hg_root < rev_parse);
        assert_eq!(lines.last().map(String::as_str), Some("jf action --abandon"));
    }

    #[test]
    fn test_dirty_baseline_aborts_before_checkout() {
        let fixture = Fixture::new();
        fs::write(fixture.root.join(".projectid"), "fbsource\n").unwrap();
        let runner = runner_at(REV_B)
            .reply("hg root", &format!("{}\n", fixture.root.display()))
            .reply("hg status", "? BUILD_INFO\n");
        let config = SyncConfig::default();

        let err = fixture
            .pipeline(&runner, &config)
            .run(&RunOptions {
                create_diff: true,
                ..fixture.local_options()
            })
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<SyncError>(),
            Some(SyncError::DiffPrecondition { .. })
        ));
        assert!(!runner.ran("gclient config"));
        assert!(!runner.ran("git rev-parse"));
    }
}
