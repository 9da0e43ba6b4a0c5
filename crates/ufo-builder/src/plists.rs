//! Property-list emission for the UFO package.
//!
//! All dictionaries are built with sorted keys so repeated runs over the
//! same input serialize byte-identically.

use std::collections::BTreeMap;

use plist::{Dictionary, Value};
use ufo_kern::{KernPair, KernRef, NormalizedGroups};

use crate::error::Result;
use crate::instance::Instance;
use crate::model::{AttributeValue, FontMetrics, FontModel};
use crate::scale::ScaleContext;

/// UFO `metainfo.plist` creator identifier.
pub const CREATOR: &str = "org.ufo-builder";
/// UFO format version written by this pipeline.
pub const FORMAT_VERSION: i64 = 3;

fn number(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        Value::Integer((value as i64).into())
    } else {
        Value::Real(value)
    }
}

fn attribute_value(value: &AttributeValue) -> Value {
    match value {
        AttributeValue::Integer(v) => Value::Integer((*v).into()),
        AttributeValue::Float(v) => number(*v),
        AttributeValue::Boolean(v) => Value::Boolean(*v),
        AttributeValue::String(v) => Value::String(v.clone()),
        AttributeValue::IntegerList(v) => {
            Value::Array(v.iter().map(|i| Value::Integer((*i).into())).collect())
        }
    }
}

fn dictionary(entries: BTreeMap<String, Value>) -> Value {
    let mut dict = Dictionary::new();
    for (key, value) in entries {
        dict.insert(key, value);
    }
    Value::Dictionary(dict)
}

/// `metainfo.plist`.
pub fn metainfo() -> Value {
    let mut entries = BTreeMap::new();
    entries.insert("creator".to_string(), Value::String(CREATOR.to_string()));
    entries.insert("formatVersion".to_string(), Value::Integer(FORMAT_VERSION.into()));
    dictionary(entries)
}

/// `fontinfo.plist` for one instance: scaled font metrics, model-wide
/// attributes, then the instance's overrides (scalable ones scaled).
pub fn fontinfo(
    model: &FontModel,
    instance: &Instance,
    metrics: &FontMetrics,
    scale: &ScaleContext,
) -> Value {
    let mut entries = BTreeMap::new();
    entries.insert("familyName".to_string(), Value::String(model.family_name.clone()));
    entries.insert("styleName".to_string(), Value::String(instance.style_name()));
    if let Some((major, minor)) = parse_version(&model.version) {
        entries.insert("versionMajor".to_string(), Value::Integer(major.into()));
        entries.insert("versionMinor".to_string(), Value::Integer(minor.into()));
    }
    entries.insert("unitsPerEm".to_string(), number(scale.target_upm()));
    entries.insert("ascender".to_string(), number(metrics.ascender));
    entries.insert("descender".to_string(), number(metrics.descender));
    entries.insert("xHeight".to_string(), number(metrics.x_height));
    entries.insert("capHeight".to_string(), number(metrics.cap_height));
    if metrics.italic_angle != 0.0 {
        entries.insert("italicAngle".to_string(), number(metrics.italic_angle));
    }

    for (key, value) in &model.attributes {
        entries.insert(key.clone(), attribute_value(&scale.scale_attribute(key, value)));
    }
    for (key, value) in &instance.attributes {
        entries.insert(key.clone(), attribute_value(&scale.scale_attribute(key, value)));
    }

    dictionary(entries)
}

/// "1.003" → (1, 3). The minor part is read as an integer, so trailing
/// zeros are not preserved.
fn parse_version(version: &str) -> Option<(i64, i64)> {
    let (major, minor) = version.split_once('.')?;
    Some((major.trim().parse().ok()?, minor.trim().parse().ok()?))
}

/// `groups.plist`: canonical groups plus verbatim extras, sorted by name.
pub fn groups(normalized: &NormalizedGroups) -> Value {
    let mut entries = BTreeMap::new();
    for group in &normalized.groups {
        entries.insert(
            group.name.clone(),
            Value::Array(group.members.iter().map(|m| Value::String(m.clone())).collect()),
        );
    }
    for (name, members) in &normalized.extra {
        entries.insert(
            name.clone(),
            Value::Array(members.iter().map(|m| Value::String(m.clone())).collect()),
        );
    }
    dictionary(entries)
}

/// `kerning.plist`: first reference → (second reference → value).
pub fn kerning(pairs: &[KernPair]) -> Value {
    let mut nested: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();
    for pair in pairs {
        nested
            .entry(reference_name(&pair.left))
            .or_default()
            .insert(reference_name(&pair.right), pair.value);
    }

    let mut entries = BTreeMap::new();
    for (left, rights) in nested {
        let inner: BTreeMap<String, Value> =
            rights.into_iter().map(|(right, value)| (right, number(value))).collect();
        entries.insert(left, dictionary(inner));
    }
    dictionary(entries)
}

fn reference_name(reference: &KernRef) -> String {
    reference.name().to_string()
}

/// `lib.plist`: the public glyph order.
pub fn lib(glyph_order: &[String]) -> Value {
    let mut entries = BTreeMap::new();
    entries.insert(
        "public.glyphOrder".to_string(),
        Value::Array(glyph_order.iter().map(|name| Value::String(name.clone())).collect()),
    );
    dictionary(entries)
}

/// `glyphs/contents.plist`: glyph name → file name.
pub fn contents(entries: &[(String, String)]) -> Value {
    let sorted: BTreeMap<String, Value> = entries
        .iter()
        .map(|(name, file)| (name.clone(), Value::String(file.clone())))
        .collect();
    dictionary(sorted)
}

/// Serialize a plist value to XML bytes.
pub fn to_xml_bytes(value: &Value) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    value.to_writer_xml(&mut bytes)?;
    // plist omits the trailing newline; UFO tooling conventionally has one.
    bytes.push(b'\n');
    Ok(bytes)
}

/// Parse an external `groups.plist` into (name, members) definitions,
/// preserving file order where the parser exposes it.
pub fn parse_groups_plist(bytes: &[u8]) -> Result<Vec<(String, Vec<String>)>> {
    let value = Value::from_reader_xml(bytes)?;
    let mut definitions = Vec::new();
    if let Value::Dictionary(dict) = value {
        for (name, members) in dict {
            let members = match members {
                Value::Array(items) => items
                    .into_iter()
                    .filter_map(|item| item.into_string())
                    .collect(),
                _ => Vec::new(),
            };
            definitions.push((name, members));
        }
    }
    Ok(definitions)
}
