//! External tool invocation.
//!
//! The pipeline never parses tool output beyond pass/fail. Callers hand in
//! a [`ToolRunner`] so tests can substitute a fake; the default runs the
//! program through `std::process::Command`, blocking with no timeout.

use std::path::Path;
use std::process::Command;

use crate::error::Result;

/// Exit status and captured output of one tool run.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Exit code; -1 when the process was killed by a signal.
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// Capability to run an external program.
///
/// `Sync` so a single runner can be shared across parallel instance builds.
pub trait ToolRunner: Sync {
    fn run(&self, program: &str, args: &[String], cwd: &Path) -> Result<ToolOutput>;
}

/// Runs tools on the host system.
pub struct SystemToolRunner;

impl ToolRunner for SystemToolRunner {
    fn run(&self, program: &str, args: &[String], cwd: &Path) -> Result<ToolOutput> {
        let output = Command::new(program).args(args).current_dir(cwd).output()?;
        Ok(ToolOutput {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
