//! Instance resolution.
//!
//! Turns the caller's (values, names, attributes) lists — or the model's
//! masters when no explicit values are given — into the ordered set of
//! instances to build.

use crate::error::{Error, Result};
use crate::model::{AttributeMap, FontModel};
use crate::options::{AxisValues, InstanceOptions};

/// One font to generate: an axis location plus naming and overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    /// One value per axis; empty for a single-master font.
    pub location: Vec<f64>,
    /// Style name parts, joined with spaces for display.
    pub names: Vec<String>,
    pub attributes: AttributeMap,
}

impl Instance {
    /// Style name for file naming and fontinfo, "Regular" when unnamed.
    pub fn style_name(&self) -> String {
        if self.names.is_empty() {
            "Regular".to_string()
        } else {
            self.names.join(" ")
        }
    }
}

/// Resolve the ordered instance list.
///
/// List-length and scalar/axis-count checks are assumed to have passed in
/// [`crate::options::BuildOptions::validate`]; this re-checks nothing except
/// what only resolution can see.
pub fn resolve_instances(model: &FontModel, options: &InstanceOptions) -> Result<Vec<Instance>> {
    if options.values.is_empty() {
        return Ok(master_instances(model, options.layer));
    }

    let count = options.values.len();
    let mut instances = Vec::with_capacity(count);
    for (i, values) in options.values.iter().enumerate() {
        let location = match values {
            AxisValues::Scalar(v) => vec![*v],
            AxisValues::Vector(v) => v.clone(),
        };
        let names = options.names.get(i).cloned().unwrap_or_default();
        let attributes = options.attributes.get(i).cloned().unwrap_or_default();
        instances.push(Instance { location, names, attributes });
    }
    Ok(instances)
}

/// One instance per master, with master coordinates and names.
fn master_instances(model: &FontModel, layer: Option<usize>) -> Vec<Instance> {
    let masters: Vec<_> = match layer {
        Some(index) => model.masters.iter().skip(index).take(1).collect(),
        None => model.masters.iter().collect(),
    };
    masters
        .into_iter()
        .map(|master| Instance {
            location: master.location.clone(),
            names: master.names.clone(),
            attributes: AttributeMap::new(),
        })
        .collect()
}

/// Fail fast when resolution produced nothing to build.
pub fn require_instances(instances: &[Instance]) -> Result<()> {
    if instances.is_empty() {
        return Err(Error::Configuration(
            "nothing to build: the font has no masters and no instance values were given".into(),
        ));
    }
    Ok(())
}
