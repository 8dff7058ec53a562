//! Error taxonomy for a sync run.
//!
//! Everything is raised through `anyhow`; these types exist so the binary and
//! the tests can classify a failure with `downcast_ref`.

use std::path::PathBuf;

use thiserror::Error;

/// Failures that are not subprocess errors.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Bad or missing CLI arguments. Nothing has been touched yet.
    #[error("{0}")]
    Usage(String),

    /// A required host tool is missing or could not report its version.
    #[error("required tool '{tool}' is not available\n{hint}")]
    MissingTool { tool: String, hint: String },

    /// `--create-diff` was requested but the package cannot produce a diff.
    #[error("{reason}\n{hint}")]
    DiffPrecondition { reason: String, hint: String },

    /// A BUILD_INFO file does not have the expected shape.
    #[error("malformed BUILD_INFO '{}': {reason}", path.display())]
    MalformedBuildInfo { path: PathBuf, reason: String },

    /// The manifest produced by the frontend build is unusable.
    #[error("malformed manifest '{}': {reason}", path.display())]
    MalformedManifest { path: PathBuf, reason: String },
}

/// Failures of a single external command.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("command not found on PATH: {command}")]
    NotFound { command: String },

    #[error("failed to spawn `{command}`")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` failed with exit code {code}")]
    ExitStatus { command: String, code: i32 },

    #[error("`{command}` terminated by signal {signal}")]
    Signal { command: String, signal: i32 },
}

impl SyncError {
    pub fn is_usage(err: &anyhow::Error) -> bool {
        matches!(err.downcast_ref::<SyncError>(), Some(SyncError::Usage(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_errors_are_detected_through_anyhow() {
        let err = anyhow::Error::new(SyncError::Usage("Missing option --branch".into()));
        assert!(SyncError::is_usage(&err));

        let err = anyhow::Error::new(ProcessError::ExitStatus {
            command: "git fetch".into(),
            code: 128,
        });
        assert!(!SyncError::is_usage(&err));
    }

    #[test]
    fn test_usage_survives_added_context() {
        let err = anyhow::Error::new(SyncError::Usage("bad".into())).context("parsing options");
        assert!(SyncError::is_usage(&err));
    }

    #[test]
    fn test_process_error_names_the_command() {
        let err = ProcessError::Signal {
            command: "autoninja -C out/Release".into(),
            signal: 9,
        };
        assert_eq!(
            err.to_string(),
            "`autoninja -C out/Release` terminated by signal 9"
        );
    }
}
