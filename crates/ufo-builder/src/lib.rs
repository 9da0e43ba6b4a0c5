//! Multiple-master font to UFO package conversion.
//!
//! Takes a read-only snapshot of a host editor's font, resolves the
//! requested instances, scales metrics losslessly to a target UPM, and
//! writes one UFO3 package (directory or `.ufoz` archive) per instance,
//! with generated `kern` and `mark` features, canonical kerning groups,
//! optional AFDKO support files, and an optional designspace document
//! tying the masters together.
//!
//! # Example
//!
//! ```no_run
//! use ufo_builder::{BuildOptions, FontModel, write_ufos};
//!
//! # fn main() -> Result<(), ufo_builder::Error> {
//! let model = FontModel::default();
//! let options = BuildOptions {
//!     output_dir: Some("/tmp/out".into()),
//!     ..Default::default()
//! };
//! let report = write_ufos(&model, &options)?;
//! for instance in &report.instances {
//!     println!("{}", instance.path.display());
//! }
//! # Ok(())
//! # }
//! ```

mod archive;
mod builder;
mod codepage;
mod designspace;
mod error;
mod features;
mod flc;
mod glif;
mod goadb;
mod instance;
mod kerning;
mod model;
mod options;
mod plists;
mod report;
mod scale;
mod tool;
mod ufo;

pub use builder::{write_ufos, write_ufos_with_runner};
pub use designspace::{AxisRange, DesignSpace, Source as DesignSpaceSource};
pub use error::{Error, Result};
pub use instance::Instance;
pub use model::{
    Anchor, AttributeMap, AttributeValue, Axis, Component, Contour, ContourPoint, FontMetrics,
    FontModel, FontSource, Glyph, Master, PointType,
};
pub use options::{
    AfdkoOptions, ArchiveOptions, AxisValues, BuildOptions, DesignspaceOptions, FeatureOptions,
    GlyphOptions, GoadbOrder, GroupOptions, GroupSource, InstanceOptions, KernFeatureMode,
    ScaleOptions,
};
pub use report::{BuildReport, Diagnostic, InstanceRecord};
pub use scale::ScaleContext;
pub use tool::{SystemToolRunner, ToolOutput, ToolRunner};
