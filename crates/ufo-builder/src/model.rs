//! Read-only font model snapshot.
//!
//! The pipeline never talks to a live host object model. A host editor
//! implements [`FontSource`] and is asked for a [`FontModel`] snapshot
//! exactly once, at pipeline start; every later phase reads the owned
//! snapshot and nothing ever writes back.

use std::collections::{BTreeMap, HashMap};

use ufo_kern::{RawClass, RawKernPair};

/// A typed font-info attribute value.
///
/// Attribute overrides carry unscaled values; the scaling engine multiplies
/// the scalable ones (see [`crate::scale::SCALABLE_ATTRIBUTES`]).
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(String),
    IntegerList(Vec<i64>),
}

impl AttributeValue {
    /// Numeric view, if this value is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Integer(v) => Some(*v as f64),
            AttributeValue::Float(v) => Some(*v),
            _ => None,
        }
    }
}

/// Font-info key → value, sorted for deterministic output.
pub type AttributeMap = BTreeMap<String, AttributeValue>;

/// A design axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    /// Human-readable name ("Weight").
    pub name: String,
    /// Registered or private four-character tag ("wght").
    pub tag: String,
}

impl Axis {
    pub fn new(name: &str, tag: &str) -> Self {
        Self { name: name.to_string(), tag: tag.to_string() }
    }
}

/// One master: a full design at a specific axis-coordinate vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Master {
    /// Style name parts ("Bold", or ["Semi", "Condensed"] joined later).
    pub names: Vec<String>,
    /// One coordinate per axis.
    pub location: Vec<f64>,
}

impl Master {
    pub fn new<I, S>(names: I, location: Vec<f64>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { names: names.into_iter().map(Into::into).collect(), location }
    }
}

/// Outline point types, matching the `.glif` `type` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointType {
    Move,
    Line,
    /// Off-curve control point; written without a `type` attribute.
    OffCurve,
    Curve,
    QCurve,
}

impl PointType {
    pub fn glif_type(self) -> Option<&'static str> {
        match self {
            PointType::Move => Some("move"),
            PointType::Line => Some("line"),
            PointType::OffCurve => None,
            PointType::Curve => Some("curve"),
            PointType::QCurve => Some("qcurve"),
        }
    }
}

/// A single outline point.
#[derive(Debug, Clone, PartialEq)]
pub struct ContourPoint {
    pub x: f64,
    pub y: f64,
    pub typ: PointType,
    pub smooth: bool,
    pub name: Option<String>,
}

impl ContourPoint {
    pub fn new(x: f64, y: f64, typ: PointType) -> Self {
        Self { x, y, typ, smooth: false, name: None }
    }

    pub fn smooth(mut self) -> Self {
        self.smooth = true;
        self
    }
}

/// A closed or open contour.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Contour {
    pub points: Vec<ContourPoint>,
}

/// A component reference to another glyph.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub base: String,
    pub x_offset: f64,
    pub y_offset: f64,
    pub x_scale: f64,
    pub y_scale: f64,
}

impl Component {
    pub fn new(base: &str, x_offset: f64, y_offset: f64) -> Self {
        Self {
            base: base.to_string(),
            x_offset,
            y_offset,
            x_scale: 1.0,
            y_scale: 1.0,
        }
    }
}

/// A named anchor.
#[derive(Debug, Clone, PartialEq)]
pub struct Anchor {
    pub name: String,
    pub x: f64,
    pub y: f64,
}

impl Anchor {
    pub fn new(name: &str, x: f64, y: f64) -> Self {
        Self { name: name.to_string(), x, y }
    }
}

/// A glyph: outline, metrics, code points.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub name: String,
    /// Advance width in font units.
    pub width: f64,
    pub unicodes: Vec<u32>,
    pub contours: Vec<Contour>,
    pub components: Vec<Component>,
    pub anchors: Vec<Anchor>,
    /// `public.markColor` as RGBA in 0..=1, if the glyph is marked.
    pub mark_color: Option<(f32, f32, f32, f32)>,
}

impl Glyph {
    pub fn new(name: &str, width: f64) -> Self {
        Self {
            name: name.to_string(),
            width,
            unicodes: Vec::new(),
            contours: Vec::new(),
            components: Vec::new(),
            anchors: Vec::new(),
            mark_color: None,
        }
    }
}

/// Font-wide vertical metrics, in font units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FontMetrics {
    pub ascender: f64,
    pub descender: f64,
    pub x_height: f64,
    pub cap_height: f64,
    /// Degrees, counter-clockwise negative. Not scaled.
    pub italic_angle: f64,
}

/// An immutable snapshot of the host font.
#[derive(Debug, Clone, Default)]
pub struct FontModel {
    pub family_name: String,
    pub version: String,
    pub upm: f64,
    pub metrics: FontMetrics,
    /// Ordered axes; empty for a single-master font.
    pub axes: Vec<Axis>,
    /// Ordered masters; a single-master font has exactly one with an empty
    /// location.
    pub masters: Vec<Master>,
    /// Glyph names in source order.
    pub glyph_order: Vec<String>,
    pub glyphs: HashMap<String, Glyph>,
    /// Glyph names in encoding order, for GOADB generation.
    pub encoding: Vec<String>,
    /// Editor-native kerning classes, in storage order.
    pub kern_classes: Vec<RawClass>,
    /// Editor-native kerning pairs, in storage order.
    pub kern_pairs: Vec<RawKernPair>,
    /// Feature source stored in the font, excluding any `kern` feature.
    /// Carried into `features.fea` verbatim.
    pub features: String,
    /// The editor-stored `kern` feature body, used by passthrough mode.
    pub kern_feature: Option<String>,
    /// Additional font-info attributes common to all instances.
    pub attributes: AttributeMap,
}

impl FontModel {
    pub fn glyph(&self, name: &str) -> Option<&Glyph> {
        self.glyphs.get(name)
    }

    pub fn has_glyph(&self, name: &str) -> bool {
        self.glyphs.contains_key(name)
    }

    /// Glyphs in source order.
    pub fn ordered_glyphs(&self) -> impl Iterator<Item = &Glyph> {
        self.glyph_order.iter().filter_map(|name| self.glyphs.get(name))
    }

    /// codepoint → glyph name, first glyph in source order wins.
    pub fn unicode_map(&self) -> HashMap<u32, &str> {
        let mut map = HashMap::new();
        for glyph in self.ordered_glyphs() {
            for &cp in &glyph.unicodes {
                map.entry(cp).or_insert(glyph.name.as_str());
            }
        }
        map
    }

    /// Add a glyph, keeping `glyph_order` in sync.
    pub fn insert_glyph(&mut self, glyph: Glyph) {
        if !self.glyphs.contains_key(&glyph.name) {
            self.glyph_order.push(glyph.name.clone());
        }
        self.glyphs.insert(glyph.name.clone(), glyph);
    }
}

/// Capability interface a host editor implements to feed the pipeline.
///
/// The snapshot is taken once; the pipeline holds no live handle into the
/// host across phases.
pub trait FontSource {
    fn snapshot(&self) -> FontModel;
}

impl FontSource for FontModel {
    fn snapshot(&self) -> FontModel {
        self.clone()
    }
}
