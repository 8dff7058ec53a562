//! Scripted command runner for tests.

use std::cell::RefCell;

use anyhow::Result;

use super::{CommandOutput, CommandRunner, Invocation};
use crate::error::ProcessError;

type Handler = Box<dyn Fn(&Invocation) -> Result<String>>;

/// Records every invocation and answers from a list of rules matched by
/// command-line prefix. Unmatched commands succeed with empty output.
#[derive(Default)]
pub struct ScriptedRunner {
    rules: Vec<(String, Handler)>,
    calls: RefCell<Vec<Invocation>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply with `stdout` to commands starting with `prefix`.
    pub fn reply(self, prefix: &str, stdout: &str) -> Self {
        let stdout = stdout.to_string();
        self.reply_with(prefix, move |_| Ok(stdout.clone()))
    }

    /// Fail commands starting with `prefix` with exit code 1.
    pub fn fail(self, prefix: &str) -> Self {
        self.reply_with(prefix, |inv| {
            Err(ProcessError::ExitStatus {
                command: inv.display(),
                code: 1,
            }
            .into())
        })
    }

    pub fn reply_with<F>(mut self, prefix: &str, handler: F) -> Self
    where
        F: Fn(&Invocation) -> Result<String> + 'static,
    {
        self.rules.push((prefix.to_string(), Box::new(handler)));
        self
    }

    /// Rendered command lines, in call order.
    pub fn command_lines(&self) -> Vec<String> {
        self.calls.borrow().iter().map(Invocation::display).collect()
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.calls.borrow().clone()
    }

    pub fn ran(&self, prefix: &str) -> bool {
        self.command_lines().iter().any(|line| line.starts_with(prefix))
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        self.calls.borrow_mut().push(invocation.clone());
        let line = invocation.display();
        let stdout = match self.rules.iter().find(|(prefix, _)| line.starts_with(prefix)) {
            Some((_, handler)) => handler(invocation)?,
            None => String::new(),
        };
        Ok(CommandOutput {
            stdout,
            stderr: String::new(),
        })
    }
}
