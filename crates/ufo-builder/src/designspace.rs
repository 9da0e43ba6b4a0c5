//! Designspace document generation.
//!
//! When a multi-master build keeps its masters as separate UFO packages, a
//! `.designspace` document ties them together. Axis extremes are derived
//! from the source locations; the default location comes from the caller.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::glif::fmt_number;
use crate::model::Axis;

/// One UFO source in the document.
#[derive(Debug, Clone)]
pub struct Source {
    /// File name relative to the document.
    pub file_name: String,
    pub style_name: String,
    /// One value per axis.
    pub location: Vec<f64>,
}

/// A designspace axis with its derived range.
#[derive(Debug, Clone)]
pub struct AxisRange {
    pub name: String,
    pub tag: String,
    pub minimum: f64,
    pub default: f64,
    pub maximum: f64,
}

/// A complete designspace document.
#[derive(Debug, Clone)]
pub struct DesignSpace {
    pub family_name: String,
    pub axes: Vec<AxisRange>,
    pub sources: Vec<Source>,
    /// Named instances; for a master-per-source export these mirror the
    /// sources.
    pub instances: Vec<Source>,
    /// Index of the source sitting at the default location.
    pub default_source: usize,
}

impl DesignSpace {
    /// Assemble a document: axis ranges span the source locations, and the
    /// default location must coincide with exactly one source.
    pub fn new(
        family_name: &str,
        axes: &[Axis],
        sources: Vec<Source>,
        default_location: &[f64],
    ) -> Result<Self> {
        if axes.is_empty() {
            return Err(Error::Configuration(
                "designspace output needs at least one axis".to_string(),
            ));
        }
        if sources.is_empty() {
            return Err(Error::Configuration(
                "designspace output needs at least one source".to_string(),
            ));
        }
        if default_location.len() != axes.len() {
            return Err(Error::Configuration(format!(
                "default location has {} coordinates for {} axes",
                default_location.len(),
                axes.len()
            )));
        }
        for source in &sources {
            if source.location.len() != axes.len() {
                return Err(Error::Configuration(format!(
                    "source {} has {} coordinates for {} axes",
                    source.file_name,
                    source.location.len(),
                    axes.len()
                )));
            }
        }

        let ranges: Vec<AxisRange> = axes
            .iter()
            .enumerate()
            .map(|(i, axis)| {
                let mut minimum = default_location[i];
                let mut maximum = default_location[i];
                for source in &sources {
                    minimum = minimum.min(source.location[i]);
                    maximum = maximum.max(source.location[i]);
                }
                AxisRange {
                    name: axis.name.clone(),
                    tag: axis.tag.clone(),
                    minimum,
                    default: default_location[i],
                    maximum,
                }
            })
            .collect();

        let default_source = sources
            .iter()
            .position(|source| {
                source
                    .location
                    .iter()
                    .zip(default_location)
                    .all(|(a, b)| (a - b).abs() < 0.001)
            })
            .ok_or_else(|| {
                Error::Configuration("no source sits at the default location".to_string())
            })?;

        let instances = sources.clone();
        Ok(Self {
            family_name: family_name.to_string(),
            axes: ranges,
            sources,
            instances,
            default_source,
        })
    }

    /// Replace the mirrored instance list with an explicit one.
    pub fn with_instances(mut self, instances: Vec<Source>) -> Self {
        self.instances = instances;
        self
    }

    /// Serialize to designspace XML, format 4.1.
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        out.push_str("<designspace format=\"4.1\">\n");

        out.push_str("  <axes>\n");
        for axis in &self.axes {
            out.push_str(&format!(
                "    <axis tag=\"{}\" name=\"{}\" minimum=\"{}\" default=\"{}\" maximum=\"{}\"/>\n",
                xml_escape(&axis.tag),
                xml_escape(&axis.name),
                fmt_number(axis.minimum),
                fmt_number(axis.default),
                fmt_number(axis.maximum),
            ));
        }
        out.push_str("  </axes>\n");

        out.push_str("  <sources>\n");
        for (index, source) in self.sources.iter().enumerate() {
            out.push_str(&format!(
                "    <source filename=\"{}\" familyname=\"{}\" stylename=\"{}\">\n",
                xml_escape(&source.file_name),
                xml_escape(&self.family_name),
                xml_escape(&source.style_name),
            ));
            if index == self.default_source {
                out.push_str("      <lib copy=\"1\"/>\n");
                out.push_str("      <groups copy=\"1\"/>\n");
                out.push_str("      <info copy=\"1\"/>\n");
            }
            out.push_str("      <location>\n");
            for (axis, value) in self.axes.iter().zip(&source.location) {
                out.push_str(&format!(
                    "        <dimension name=\"{}\" xvalue=\"{}\"/>\n",
                    xml_escape(&axis.name),
                    fmt_number(*value),
                ));
            }
            out.push_str("      </location>\n");
            out.push_str("    </source>\n");
        }
        out.push_str("  </sources>\n");

        if !self.instances.is_empty() {
            out.push_str("  <instances>\n");
            for instance in &self.instances {
                out.push_str(&format!(
                    "    <instance filename=\"{}\" familyname=\"{}\" stylename=\"{}\">\n",
                    xml_escape(&instance.file_name),
                    xml_escape(&self.family_name),
                    xml_escape(&instance.style_name),
                ));
                out.push_str("      <location>\n");
                for (axis, value) in self.axes.iter().zip(&instance.location) {
                    out.push_str(&format!(
                        "        <dimension name=\"{}\" xvalue=\"{}\"/>\n",
                        xml_escape(&axis.name),
                        fmt_number(*value),
                    ));
                }
                out.push_str("      </location>\n");
                out.push_str("    </instance>\n");
            }
            out.push_str("  </instances>\n");
        }

        out.push_str("</designspace>\n");
        out
    }

    /// Write `<family>.designspace` next to the sources.
    pub fn write(&self, parent: &Path) -> Result<PathBuf> {
        let stem: String = self.family_name.split_whitespace().collect();
        let path = parent.join(format!("{stem}.designspace"));
        std::fs::write(&path, self.to_xml())?;
        Ok(path)
    }
}

fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sources() -> Vec<Source> {
        vec![
            Source {
                file_name: "Demo-Light.ufo".to_string(),
                style_name: "Light".to_string(),
                location: vec![300.0],
            },
            Source {
                file_name: "Demo-Bold.ufo".to_string(),
                style_name: "Bold".to_string(),
                location: vec![700.0],
            },
        ]
    }

    #[test]
    fn axis_range_spans_sources_and_default() {
        let axes = vec![Axis::new("Weight", "wght")];
        let ds = DesignSpace::new("Demo", &axes, sources(), &[300.0]).unwrap();
        let axis = &ds.axes[0];
        assert_eq!(axis.minimum, 300.0);
        assert_eq!(axis.default, 300.0);
        assert_eq!(axis.maximum, 700.0);
        assert_eq!(ds.default_source, 0);
    }

    #[test]
    fn default_location_must_match_a_source() {
        let axes = vec![Axis::new("Weight", "wght")];
        assert!(DesignSpace::new("Demo", &axes, sources(), &[400.0]).is_err());
    }

    #[test]
    fn xml_lists_axes_sources_and_default_copies() {
        let axes = vec![Axis::new("Weight", "wght")];
        let ds = DesignSpace::new("Demo", &axes, sources(), &[300.0]).unwrap();
        let xml = ds.to_xml();
        assert!(xml.contains(
            "<axis tag=\"wght\" name=\"Weight\" minimum=\"300\" default=\"300\" maximum=\"700\"/>"
        ));
        assert!(xml.contains("filename=\"Demo-Light.ufo\""));
        assert!(xml.contains("<info copy=\"1\"/>"));
        assert!(xml.contains("<dimension name=\"Weight\" xvalue=\"700\"/>"));
        // Instances mirror the sources unless replaced.
        assert!(xml.contains("<instance filename=\"Demo-Bold.ufo\""));
    }

    #[test]
    fn explicit_instances_replace_the_mirror() {
        let axes = vec![Axis::new("Weight", "wght")];
        let ds = DesignSpace::new("Demo", &axes, sources(), &[300.0])
            .unwrap()
            .with_instances(vec![Source {
                file_name: "Demo-Medium.ufo".to_string(),
                style_name: "Medium".to_string(),
                location: vec![500.0],
            }]);
        let xml = ds.to_xml();
        assert!(xml.contains("stylename=\"Medium\""));
        assert!(!xml.contains("<instance filename=\"Demo-Light.ufo\""));
    }
}
