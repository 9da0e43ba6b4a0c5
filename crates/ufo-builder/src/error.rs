use std::result;

/// Fatal error types for the UFO build pipeline.
///
/// Non-fatal findings are not errors; they are [`crate::report::Diagnostic`]s
/// collected into the end-of-run [`crate::BuildReport`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid or conflicting call-time options. Raised before any instance
    /// is built.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A referenced glyph name does not exist in the font model. Fatal only
    /// in strict/release mode.
    #[error("glyph '{0}' does not exist in the font")]
    GlyphName(String),

    /// An external tool exited non-zero in strict/release mode. In default
    /// mode the failure is a diagnostic instead.
    #[error("external tool '{tool}' failed with status {status}")]
    Tool { tool: String, status: i32 },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("plist error: {0}")]
    Plist(#[from] plist::Error),

    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

pub type Result<T> = result::Result<T, Error>;
