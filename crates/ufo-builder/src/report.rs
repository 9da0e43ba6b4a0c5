//! End-of-run diagnostics.
//!
//! Fatal problems are [`crate::error::Error`]s and stop the build;
//! everything else lands here and is reported once the run finishes.

use std::path::PathBuf;

use log::{info, warn};

/// A non-fatal finding from any pipeline phase.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Diagnostic {
    #[error(transparent)]
    Kern(#[from] ufo_kern::Diagnostic),

    /// A referenced glyph does not exist; the reference was dropped.
    #[error("glyph '{0}' does not exist; reference dropped")]
    MissingGlyph(String),

    /// An external tool exited non-zero.
    #[error("external tool '{tool}' failed with status {status}")]
    ToolFailure { tool: String, status: i32 },
}

/// One written instance.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceRecord {
    pub style_name: String,
    /// Final path of the `.ufo` directory or `.ufoz` archive.
    pub path: PathBuf,
}

/// Everything the caller gets back from a completed run.
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub instances: Vec<InstanceRecord>,
    pub diagnostics: Vec<Diagnostic>,
    /// Path of the designspace document, when one was written.
    pub designspace: Option<PathBuf>,
}

impl BuildReport {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn extend_kern(&mut self, diagnostics: Vec<ufo_kern::Diagnostic>) {
        self.diagnostics.extend(diagnostics.into_iter().map(Diagnostic::Kern));
    }

    /// Log the aggregated report.
    pub fn log_summary(&self) {
        for record in &self.instances {
            info!("wrote {} ({})", record.path.display(), record.style_name);
        }
        if self.diagnostics.is_empty() {
            info!("build finished with no diagnostics");
        } else {
            warn!("build finished with {} diagnostic(s):", self.diagnostics.len());
            for diagnostic in &self.diagnostics {
                warn!("  {diagnostic}");
            }
        }
    }
}
