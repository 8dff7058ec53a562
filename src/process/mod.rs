//! Synchronous invocation of external tools.
//!
//! Every external step of the sync (git, gclient, gn, autoninja, the review
//! tooling) goes through a [`CommandRunner`]. The system implementation
//! announces the command line, dims the tool's own output on color terminals,
//! and turns spawn failures, non-zero exits and signals into
//! [`ProcessError`]s. Nothing is retried.

use std::ffi::{OsStr, OsString};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::Result;

use crate::error::ProcessError;
use crate::term::{Palette, Stream};

#[cfg(test)]
pub mod testing;

/// Where a child's output stream goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamMode {
    /// Pass through to our own stream.
    #[default]
    Inherit,
    /// Collect into [`CommandOutput`].
    Capture,
    /// Discard.
    Ignore,
}

impl StreamMode {
    fn stdio(self) -> Stdio {
        match self {
            StreamMode::Inherit => Stdio::inherit(),
            StreamMode::Capture => Stdio::piped(),
            StreamMode::Ignore => Stdio::null(),
        }
    }
}

/// A fully described external command.
#[derive(Debug, Clone, Default)]
pub struct Invocation {
    program: String,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    env: Vec<(String, String)>,
    stdout: StreamMode,
    stderr: StreamMode,
}

impl Invocation {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            ..Default::default()
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Append a path argument, passed to the child byte for byte.
    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.as_os_str())
    }

    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.cwd = Some(dir.to_path_buf());
        self
    }

    /// Add an environment override on top of the inherited environment.
    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.env.push((key.to_string(), value.to_string()));
        self
    }

    /// Capture stdout; stderr still reaches the terminal.
    pub fn capture_stdout(mut self) -> Self {
        self.stdout = StreamMode::Capture;
        self
    }

    /// Discard both output streams.
    pub fn quiet(mut self) -> Self {
        self.stdout = StreamMode::Ignore;
        self.stderr = StreamMode::Ignore;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[OsString] {
        &self.args
    }

    pub fn cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    pub fn env_overrides(&self) -> &[(String, String)] {
        &self.env
    }

    /// The command line as shown to the user. Non-UTF-8 bytes are replaced
    /// here only.
    pub fn display(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }
}

/// Output collected from a finished command. Streams that were not captured
/// are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs external commands to completion, one at a time.
pub trait CommandRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput>;
}

/// Runs commands on the host.
#[derive(Debug, Clone, Copy)]
pub struct SystemRunner {
    palette: Palette,
}

impl SystemRunner {
    pub fn new(palette: Palette) -> Self {
        Self { palette }
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        let rendered = invocation.display();
        println!(" > {rendered}");
        tracing::debug!(
            program = invocation.program(),
            cwd = ?invocation.cwd(),
            "running external command"
        );

        let program = which::which(invocation.program()).map_err(|_| ProcessError::NotFound {
            command: rendered.clone(),
        })?;

        let mut cmd = Command::new(program);
        cmd.args(invocation.arguments())
            .stdin(Stdio::null())
            .stdout(invocation.stdout.stdio())
            .stderr(invocation.stderr.stdio());
        if let Some(dir) = invocation.cwd() {
            cmd.current_dir(dir);
        }
        for (key, value) in invocation.env_overrides() {
            cmd.env(key, value);
        }

        let output = {
            let _dim = DimGuard::open(self.palette);
            cmd.output().map_err(|source| ProcessError::Spawn {
                command: rendered.clone(),
                source,
            })?
        };

        check_status(&rendered, output.status)?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

fn check_status(rendered: &str, status: std::process::ExitStatus) -> Result<(), ProcessError> {
    use std::os::unix::process::ExitStatusExt;

    match (status.code(), status.signal()) {
        (Some(0), _) => Ok(()),
        (Some(code), _) => Err(ProcessError::ExitStatus {
            command: rendered.to_string(),
            code,
        }),
        (None, Some(signal)) => Err(ProcessError::Signal {
            command: rendered.to_string(),
            signal,
        }),
        (None, None) => Err(ProcessError::ExitStatus {
            command: rendered.to_string(),
            code: -1,
        }),
    }
}

/// Dims both terminal streams while a child runs; restores them on drop,
/// including on the error path.
struct DimGuard {
    palette: Palette,
}

impl DimGuard {
    fn open(palette: Palette) -> Self {
        emit(Stream::Stdout, &palette.dim_open(Stream::Stdout));
        emit(Stream::Stderr, &palette.dim_open(Stream::Stderr));
        Self { palette }
    }
}

impl Drop for DimGuard {
    fn drop(&mut self) {
        emit(Stream::Stdout, &self.palette.dim_close(Stream::Stdout));
        emit(Stream::Stderr, &self.palette.dim_close(Stream::Stderr));
    }
}

fn emit(stream: Stream, text: &str) {
    if text.is_empty() {
        return;
    }
    // Best effort: a closed terminal must not fail the run.
    let _ = match stream {
        Stream::Stdout => {
            let mut out = std::io::stdout();
            out.write_all(text.as_bytes()).and_then(|_| out.flush())
        }
        Stream::Stderr => {
            let mut err = std::io::stderr();
            err.write_all(text.as_bytes()).and_then(|_| err.flush())
        }
    };
}
