//! Lossless metric scaling.
//!
//! A [`ScaleContext`] is a pure function over glyph geometry and font
//! metrics: the same input and factor always produce the same output, and
//! nothing is rounded here. When no scaling was requested (or the UPMs
//! already match) the factor is exactly `1.0` and values pass through
//! untouched — not multiplied by a computed ratio that happens to be close
//! to one.

use crate::model::{AttributeValue, FontMetrics, Glyph};

/// Font-info keys whose values are linear metrics and scale with the font.
pub const SCALABLE_ATTRIBUTES: &[&str] = &[
    "ascender",
    "capHeight",
    "descender",
    "openTypeHheaAscender",
    "openTypeHheaDescender",
    "openTypeHheaLineGap",
    "openTypeOS2StrikeoutPosition",
    "openTypeOS2StrikeoutSize",
    "openTypeOS2SubscriptXOffset",
    "openTypeOS2SubscriptXSize",
    "openTypeOS2SubscriptYOffset",
    "openTypeOS2SubscriptYSize",
    "openTypeOS2SuperscriptXOffset",
    "openTypeOS2SuperscriptXSize",
    "openTypeOS2SuperscriptYOffset",
    "openTypeOS2SuperscriptYSize",
    "openTypeOS2TypoAscender",
    "openTypeOS2TypoDescender",
    "openTypeOS2TypoLineGap",
    "openTypeOS2WinAscent",
    "openTypeOS2WinDescent",
    "postscriptUnderlinePosition",
    "postscriptUnderlineThickness",
    "unitsPerEm",
    "xHeight",
];

/// Immutable scale factor plus its resolved target UPM.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleContext {
    factor: f64,
    target_upm: f64,
}

impl ScaleContext {
    /// Resolve the factor from the caller's options.
    ///
    /// An explicit factor wins; otherwise `auto` scales to
    /// `target_upm / source_upm` unless the UPMs already match, in which
    /// case (and when nothing was requested) the factor is exactly `1.0`.
    pub fn new(explicit: Option<f64>, auto: bool, source_upm: f64, target_upm: f64) -> Self {
        if let Some(factor) = explicit {
            if factor != 1.0 {
                return Self {
                    factor,
                    target_upm: (source_upm * factor).round(),
                };
            }
        } else if auto && source_upm != target_upm {
            return Self {
                factor: target_upm / source_upm,
                target_upm,
            };
        }
        Self { factor: 1.0, target_upm: source_upm }
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// UPM of the scaled output.
    pub fn target_upm(&self) -> f64 {
        self.target_upm
    }

    pub fn is_noop(&self) -> bool {
        self.factor == 1.0
    }

    /// Scale a single linear value.
    pub fn apply(&self, value: f64) -> f64 {
        if self.is_noop() { value } else { value * self.factor }
    }

    /// Produce a scaled working copy of a glyph. The source is untouched.
    pub fn scale_glyph(&self, glyph: &Glyph) -> Glyph {
        let mut out = glyph.clone();
        if self.is_noop() {
            return out;
        }
        out.width = self.apply(out.width);
        for contour in &mut out.contours {
            for point in &mut contour.points {
                point.x = self.apply(point.x);
                point.y = self.apply(point.y);
            }
        }
        for component in &mut out.components {
            // Offsets are in font units; the scale terms are ratios and stay.
            component.x_offset = self.apply(component.x_offset);
            component.y_offset = self.apply(component.y_offset);
        }
        for anchor in &mut out.anchors {
            anchor.x = self.apply(anchor.x);
            anchor.y = self.apply(anchor.y);
        }
        out
    }

    /// Scaled copy of the font-wide metrics. The italic angle is angular,
    /// not linear, and passes through.
    pub fn scale_metrics(&self, metrics: &FontMetrics) -> FontMetrics {
        FontMetrics {
            ascender: self.apply(metrics.ascender),
            descender: self.apply(metrics.descender),
            x_height: self.apply(metrics.x_height),
            cap_height: self.apply(metrics.cap_height),
            italic_angle: metrics.italic_angle,
        }
    }

    /// Scale an attribute override when its key is a linear metric.
    pub fn scale_attribute(&self, key: &str, value: &AttributeValue) -> AttributeValue {
        if self.is_noop() || !SCALABLE_ATTRIBUTES.contains(&key) {
            return value.clone();
        }
        match value.as_f64() {
            Some(v) => AttributeValue::Float(self.apply(v)),
            None => value.clone(),
        }
    }
}
