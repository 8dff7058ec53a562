use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use debugger_frontend_sync::term::Palette;
use debugger_frontend_sync::SyncError;
use tracing_subscriber::EnvFilter;

mod workflows;

use workflows::Cli;

const EXIT_FAILURE: u8 = 1;

fn main() -> ExitCode {
    init_tracing();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return ExitCode::from(clap_exit_status(err.kind()));
        }
    };

    let palette = Palette::detect();
    match workflows::run_sync(&cli, palette) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let report = FailureReport::for_error(&err);
            eprintln!("{}", palette.error(&report.message));
            if let Some(help) = &report.help {
                eprintln!();
                println!("{help}");
            }
            ExitCode::from(report.status)
        }
    }
}

/// `--help` and `--version` are successful exits; every other parse error is
/// a usage error.
fn clap_exit_status(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => EXIT_FAILURE,
    }
}

/// What the binary prints and returns for a failed run.
#[derive(Debug)]
struct FailureReport {
    message: String,
    /// Rendered help text, for usage errors only.
    help: Option<String>,
    status: u8,
}

impl FailureReport {
    fn for_error(err: &anyhow::Error) -> Self {
        if SyncError::is_usage(err) {
            return Self {
                message: format!("Error: {err}"),
                help: Some(Cli::command().render_help().to_string()),
                status: EXIT_FAILURE,
            };
        }
        Self {
            message: format!("Error: {err:#}"),
            help: None,
            status: EXIT_FAILURE,
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use debugger_frontend_sync::ProcessError;

    #[test]
    fn test_missing_branch_exits_1_with_help() {
        let cli = Cli::try_parse_from(["debugger-frontend-sync", "--no-build"]).unwrap();
        let err = workflows::run_sync(&cli, Palette::plain()).unwrap_err();

        let report = FailureReport::for_error(&err);
        assert_eq!(report.status, 1);
        assert_eq!(report.message, "Error: Missing option --branch");
        let help = report.help.unwrap();
        assert!(help.contains("--branch"));
        assert!(help.contains("--create-diff"));
    }

    #[test]
    fn test_runtime_failure_exits_1_with_full_chain() {
        let err = anyhow::Error::new(ProcessError::ExitStatus {
            command: "gn gen out/Release".to_string(),
            code: 2,
        })
        .context("generating build files with gn");

        let report = FailureReport::for_error(&err);
        assert_eq!(report.status, 1);
        assert!(report.help.is_none());
        assert_eq!(
            report.message,
            "Error: generating build files with gn: `gn gen out/Release` failed with exit code 2"
        );
    }

    #[test]
    fn test_help_and_version_exit_0() {
        let help = Cli::try_parse_from(["debugger-frontend-sync", "--help"]).unwrap_err();
        assert_eq!(clap_exit_status(help.kind()), 0);

        let version = Cli::try_parse_from(["debugger-frontend-sync", "--version"]).unwrap_err();
        assert_eq!(clap_exit_status(version.kind()), 0);
    }

    #[test]
    fn test_bad_flag_exits_1() {
        let err = Cli::try_parse_from(["debugger-frontend-sync", "--frobnicate"]).unwrap_err();
        assert_eq!(clap_exit_status(err.kind()), 1);
    }
}
