//! Preflight checks for the sync.
//!
//! Validates that the host has the tools a run needs before anything is
//! cloned or built. This prevents an expensive checkout from failing late on
//! a missing `gn`.

use anyhow::Result;

use crate::error::SyncError;
use crate::process::{CommandRunner, Invocation};

pub const DEPOT_TOOLS_HINT: &str = "Install depot_tools first: \
https://commondatastorage.googleapis.com/chrome-infra-docs/flat/depot_tools/docs/html/depot_tools_tutorial.html#_setting_up";

/// A probe that succeeds only when a tool is usable.
#[derive(Debug, Clone, Copy)]
pub struct ToolProbe {
    /// Tool name reported when the probe fails.
    pub tool: &'static str,
    pub program: &'static str,
    pub args: &'static [&'static str],
}

impl ToolProbe {
    const fn versioned(tool: &'static str) -> Self {
        Self {
            tool,
            program: tool,
            args: &["--version"],
        }
    }

    fn invocation(&self) -> Invocation {
        Invocation::new(self.program).args(self.args).quiet()
    }
}

/// Needed by every run.
pub const VCS_TOOLS: &[ToolProbe] = &[ToolProbe::versioned("git")];

/// Needed only when the frontend is actually built.
pub const DEPOT_TOOLS: &[ToolProbe] = &[
    ToolProbe::versioned("gclient"),
    ToolProbe {
        tool: "gn",
        program: "which",
        args: &["gn"],
    },
    ToolProbe {
        tool: "autoninja",
        program: "which",
        args: &["autoninja"],
    },
];

/// Run every probe, reporting all failures at once.
pub fn check_required_tools(
    runner: &dyn CommandRunner,
    probes: &[ToolProbe],
    hint: &str,
) -> Result<()> {
    let mut missing = Vec::new();

    for probe in probes {
        if let Err(err) = runner.run(&probe.invocation()) {
            tracing::debug!(tool = probe.tool, error = %err, "tool probe failed");
            missing.push(probe.tool);
        }
    }

    if !missing.is_empty() {
        return Err(SyncError::MissingTool {
            tool: missing.join(", "),
            hint: hint.to_string(),
        }
        .into());
    }

    Ok(())
}

/// Check the tools a run needs. Building additionally needs depot_tools.
pub fn check_host_tools(runner: &dyn CommandRunner, building: bool) -> Result<()> {
    println!("Checking that required tools are available");
    check_required_tools(runner, VCS_TOOLS, "Install git and make sure it is on PATH.")?;
    if building {
        check_required_tools(runner, DEPOT_TOOLS, DEPOT_TOOLS_HINT)?;
    }
    println!();
    Ok(())
}
