//! Build configuration.
//!
//! One typed struct per subsystem instead of a loose keyword dictionary;
//! every invalid combination is rejected by [`BuildOptions::validate`]
//! before any output is produced.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::model::{AttributeMap, FontModel};

/// Axis values for one instance: a bare scalar is accepted for single-axis
/// fonts and normalized to a one-element vector.
#[derive(Debug, Clone, PartialEq)]
pub enum AxisValues {
    Scalar(f64),
    Vector(Vec<f64>),
}

impl From<f64> for AxisValues {
    fn from(value: f64) -> Self {
        AxisValues::Scalar(value)
    }
}

impl From<Vec<f64>> for AxisValues {
    fn from(values: Vec<f64>) -> Self {
        AxisValues::Vector(values)
    }
}

/// Metric scaling options.
#[derive(Debug, Clone, Default)]
pub struct ScaleOptions {
    /// Scale to `target_upm / source UPM`. Mutually exclusive with `factor`.
    pub auto: bool,
    /// Explicit scale factor. Mutually exclusive with `auto`.
    pub factor: Option<f64>,
    /// Target UPM for auto scaling. Defaults to 1000.
    pub target_upm: Option<u32>,
}

/// Instance selection options.
#[derive(Debug, Clone, Default)]
pub struct InstanceOptions {
    /// Axis-value vectors. Empty means one instance per master.
    pub values: Vec<AxisValues>,
    /// Name parts, parallel to `values`.
    pub names: Vec<Vec<String>>,
    /// Attribute overrides, parallel to `values`; missing entries become
    /// empty maps.
    pub attributes: Vec<AttributeMap>,
    /// Build only this master (index into the model's master list).
    pub layer: Option<usize>,
}

/// `kern` feature emission mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KernFeatureMode {
    #[default]
    Generate,
    /// Reuse the existing feature body (external file or the one stored in
    /// the font) unmodified.
    Passthrough,
    Omit,
}

/// `features.fea` options.
#[derive(Debug, Clone)]
pub struct FeatureOptions {
    pub kern_mode: KernFeatureMode,
    /// External `.fea` file providing the kern feature body.
    pub kern_feature_file: Option<PathBuf>,
    /// Emit `@group = [...]` definitions into `features.fea`.
    pub import_groups: bool,
    /// Pairs with an absolute value below this are left out of the feature.
    pub kern_min_value: f64,
    /// Generate a `mark` feature from glyph anchors.
    pub mark_generate: bool,
    /// Anchor names to include; empty means all.
    pub mark_anchors_include: Vec<String>,
    /// Anchor names to omit.
    pub mark_anchors_omit: Vec<String>,
}

impl Default for FeatureOptions {
    fn default() -> Self {
        Self {
            kern_mode: KernFeatureMode::Generate,
            kern_feature_file: None,
            import_groups: true,
            kern_min_value: 0.0,
            mark_generate: false,
            mark_anchors_include: Vec::new(),
            mark_anchors_omit: Vec::new(),
        }
    }
}

/// Where kerning groups come from.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum GroupSource {
    /// Normalize the font's own kerning classes.
    #[default]
    Font,
    /// Parse an external FontLab class file; classes still get normalized,
    /// with the file's side flags as hints.
    ClassFile(PathBuf),
    /// Use an external `groups.plist` verbatim, bypassing classification.
    GroupsPlist(PathBuf),
}

/// Kerning-group options.
#[derive(Debug, Clone, Default)]
pub struct GroupOptions {
    pub source: GroupSource,
    /// Keep classes that appear in no kerning pair.
    pub keep_empty: bool,
    /// Write the normalized groups as `<family>.flc` next to the output,
    /// for editors that read FontLab class files.
    pub export_flc: bool,
}

/// Glyph omission options.
#[derive(Debug, Clone, Default)]
pub struct GlyphOptions {
    /// Glyphs omitted from the output by exact name.
    pub omit_names: Vec<String>,
    /// Glyphs omitted when their name ends with one of these suffixes.
    pub omit_suffixes: Vec<String>,
}

/// Order source for the GOADB.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum GoadbOrder {
    /// The source font's encoding order.
    #[default]
    Encoding,
    /// The source font's glyph order.
    GlyphOrder,
    /// An existing GOADB file, used as-is.
    File(PathBuf),
}

/// AFDKO support-file options.
#[derive(Debug, Clone, Default)]
pub struct AfdkoOptions {
    /// Write GOADB, FontMenuNameDB and the makeotf command file.
    pub parts: bool,
    pub goadb_order: GoadbOrder,
    /// Fill the first 256 GOADB slots from the Windows-1252 codepage.
    pub goadb_win1252: bool,
    /// Fill the first 256 GOADB slots from the Mac OS Roman codepage.
    pub goadb_macos_roman: bool,
    /// Strict mode: glyph-name errors abort before any instance is built,
    /// and external-tool failures become fatal.
    pub release: bool,
    /// Run makeotf for each instance through the tool runner.
    pub run_makeotf: bool,
    /// Extra makeotf arguments; each must begin with `-`.
    pub makeotf_args: Vec<String>,
}

/// `.ufoz` archive options.
#[derive(Debug, Clone)]
pub struct ArchiveOptions {
    /// Write each instance as a `.ufoz` archive instead of a directory.
    pub ufoz: bool,
    /// Deflate entries; otherwise they are stored.
    pub compress: bool,
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self { ufoz: false, compress: true }
    }
}

/// Designspace export options.
#[derive(Debug, Clone, Default)]
pub struct DesignspaceOptions {
    /// Write one UFO per master and describe the instances in a
    /// `.designspace` document.
    pub export: bool,
    /// Default-source coordinates; empty means the first master's location.
    /// Must coincide with a master.
    pub default_location: Vec<f64>,
}

/// Full pipeline configuration, grouped by subsystem.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Output directory. Must be absolute; a fixed default is used when
    /// absent.
    pub output_dir: Option<PathBuf>,
    pub scale: ScaleOptions,
    pub instances: InstanceOptions,
    pub features: FeatureOptions,
    pub groups: GroupOptions,
    pub glyphs: GlyphOptions,
    pub afdko: AfdkoOptions,
    pub archive: ArchiveOptions,
    pub designspace: DesignspaceOptions,
}

fn config_err<T>(message: impl Into<String>) -> Result<T> {
    Err(Error::Configuration(message.into()))
}

impl BuildOptions {
    /// Validate the whole configuration against the font model.
    ///
    /// Runs before any instance is built; a failure here guarantees zero
    /// output files.
    pub fn validate(&self, model: &FontModel) -> Result<()> {
        if let Some(dir) = &self.output_dir {
            if dir.is_relative() {
                return config_err(format!(
                    "output path must be absolute: '{}'",
                    dir.display()
                ));
            }
        }

        if self.scale.auto && self.scale.factor.is_some() {
            return config_err("'auto' scaling and an explicit scale factor are mutually exclusive");
        }
        if let Some(factor) = self.scale.factor {
            if !(factor.is_finite() && factor > 0.0) {
                return config_err(format!("scale factor must be positive and finite, got {factor}"));
            }
        }

        if let Some(path) = &self.features.kern_feature_file {
            require_extension(path, "fea", "kern feature file")?;
        }
        match &self.groups.source {
            GroupSource::Font => {}
            GroupSource::ClassFile(path) => require_extension(path, "flc", "class file")?,
            GroupSource::GroupsPlist(path) => require_extension(path, "plist", "groups plist")?,
        }

        self.validate_instances(model)?;

        for arg in &self.afdko.makeotf_args {
            if !arg.starts_with('-') {
                return config_err(format!("makeotf arguments must begin with '-': '{arg}'"));
            }
        }

        if self.designspace.export {
            if model.axes.is_empty() {
                return config_err(
                    "designspace export requires a multiple-master font with at least one axis",
                );
            }
            let default = &self.designspace.default_location;
            if !default.is_empty() {
                if default.len() != model.axes.len() {
                    return config_err(format!(
                        "designspace default location has {} values but the font has {} axes",
                        default.len(),
                        model.axes.len()
                    ));
                }
                let masters: Vec<_> = match self.instances.layer {
                    Some(index) => model.masters.iter().skip(index).take(1).collect(),
                    None => model.masters.iter().collect(),
                };
                let on_a_master = masters.iter().any(|master| {
                    master.location.len() == default.len()
                        && master
                            .location
                            .iter()
                            .zip(default)
                            .all(|(a, b)| (a - b).abs() < 0.001)
                });
                if !on_a_master {
                    return config_err(
                        "designspace default location does not coincide with any master",
                    );
                }
            }
        }

        Ok(())
    }

    fn validate_instances(&self, model: &FontModel) -> Result<()> {
        let instances = &self.instances;

        let mut lengths: BTreeMap<&str, usize> = BTreeMap::new();
        if !instances.values.is_empty() {
            lengths.insert("values", instances.values.len());
        }
        if !instances.names.is_empty() {
            lengths.insert("names", instances.names.len());
        }
        if !instances.attributes.is_empty() {
            lengths.insert("attributes", instances.attributes.len());
        }
        let distinct: Vec<usize> = {
            let mut v: Vec<usize> = lengths.values().copied().collect();
            v.dedup();
            v
        };
        if distinct.len() > 1 {
            let description: Vec<String> =
                lengths.iter().map(|(k, v)| format!("{k}={v}")).collect();
            return config_err(format!(
                "instance lists must have equal lengths ({})",
                description.join(", ")
            ));
        }

        if model.axes.len() != 1 {
            for values in &instances.values {
                if matches!(values, AxisValues::Scalar(_)) {
                    return config_err(
                        "bare scalar instance values are only accepted for single-axis fonts",
                    );
                }
            }
        }
        for values in &instances.values {
            if let AxisValues::Vector(v) = values {
                if v.len() != model.axes.len() {
                    return config_err(format!(
                        "instance value vector has {} values but the font has {} axes",
                        v.len(),
                        model.axes.len()
                    ));
                }
            }
        }

        if let Some(layer) = instances.layer {
            if layer >= model.masters.len() {
                return config_err(format!(
                    "layer {layer} is out of range for a font with {} masters",
                    model.masters.len()
                ));
            }
        }

        Ok(())
    }
}

fn require_extension(path: &std::path::Path, extension: &str, what: &str) -> Result<()> {
    if path.extension().and_then(|e| e.to_str()) != Some(extension) {
        return config_err(format!(
            "{what} must have the '.{extension}' extension: '{}'",
            path.display()
        ));
    }
    Ok(())
}
