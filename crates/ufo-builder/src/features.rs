//! `features.fea` assembly.
//!
//! The feature file is put together from up to three parts, in order: the
//! feature source carried over from the font, a generated `mark` feature
//! from glyph anchors, and the `kern` feature (generated, passed through, or
//! omitted). Group definitions, when imported, are emitted by the kern
//! builder ahead of its feature block.

use std::collections::{BTreeMap, HashSet};

use indexmap::IndexSet;
use ufo_kern::{
    KernFeature, KernFeatureOptions, KernMode, KernPair, NormalizedGroups, build_kern_feature,
};

use crate::glif::fmt_number;
use crate::model::Glyph;
use crate::options::{FeatureOptions, KernFeatureMode};

/// Everything needed to assemble one `features.fea`.
pub struct FeatureInput<'a> {
    /// Feature source stored in the font, minus any kern feature.
    pub existing: &'a str,
    /// Kern feature body for passthrough mode, already read.
    pub passthrough_kern: Option<&'a str>,
    pub normalized: &'a NormalizedGroups,
    pub pairs: &'a [KernPair],
    /// Names of glyphs present in the output.
    pub glyphs: &'a HashSet<String>,
}

/// Assemble the feature file text. Deterministic for identical input.
pub fn assemble_features(
    input: &FeatureInput<'_>,
    glyph_order: &[&Glyph],
    options: &FeatureOptions,
) -> (String, Vec<ufo_kern::Diagnostic>) {
    let mut sections: Vec<String> = Vec::new();

    let existing = input.existing.trim();
    if !existing.is_empty() {
        sections.push(format!("{existing}\n"));
    }

    if options.mark_generate {
        let mark = build_mark_feature(glyph_order, options);
        if !mark.is_empty() {
            sections.push(mark);
        }
    }

    let mode = match options.kern_mode {
        KernFeatureMode::Generate => KernMode::Generate,
        KernFeatureMode::Omit => KernMode::Omit,
        KernFeatureMode::Passthrough => {
            KernMode::Passthrough(input.passthrough_kern.unwrap_or_default().to_string())
        }
    };
    let kern_options = KernFeatureOptions {
        mode,
        min_value: options.kern_min_value,
        include_group_definitions: options.import_groups,
    };
    let KernFeature { text, diagnostics } = build_kern_feature(
        &input.normalized.groups,
        input.pairs,
        input.glyphs,
        &kern_options,
    );
    if !text.is_empty() {
        sections.push(text);
    }

    (sections.join("\n"), diagnostics)
}

/// Generate a `mark` feature from glyph anchors.
///
/// An anchor named `top` on a base glyph attaches marks carrying a `_top`
/// anchor. Anchors are filtered by the include/omit lists, matched on the
/// base name without the underscore.
fn build_mark_feature(glyphs: &[&Glyph], options: &FeatureOptions) -> String {
    // anchor base name → (mark classes, base positioning rules)
    let mut mark_classes: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut base_rules: BTreeMap<String, Vec<String>> = BTreeMap::new();
    // At most one anchor per (glyph, name).
    let mut seen: IndexSet<(String, String)> = IndexSet::new();

    for glyph in glyphs {
        for anchor in &glyph.anchors {
            let (base_name, is_mark) = match anchor.name.strip_prefix('_') {
                Some(rest) => (rest, true),
                None => (anchor.name.as_str(), false),
            };
            if !anchor_selected(base_name, options) {
                continue;
            }
            if !seen.insert((glyph.name.clone(), anchor.name.clone())) {
                continue;
            }
            let position = format!(
                "<anchor {} {}>",
                fmt_number(anchor.x),
                fmt_number(anchor.y)
            );
            if is_mark {
                mark_classes.entry(base_name.to_string()).or_default().push(format!(
                    "markClass [{}] {position} @MC_{base_name};",
                    glyph.name
                ));
            } else {
                base_rules.entry(base_name.to_string()).or_default().push(format!(
                    "    pos base {} {position} mark @MC_{base_name};",
                    glyph.name
                ));
            }
        }
    }

    // A rule is only valid when both sides of the attachment exist.
    let usable: Vec<&String> = mark_classes
        .keys()
        .filter(|name| base_rules.contains_key(*name))
        .collect();
    if usable.is_empty() {
        return String::new();
    }

    let mut text = String::new();
    for name in &usable {
        for class in &mark_classes[name.as_str()] {
            text.push_str(class);
            text.push('\n');
        }
    }
    text.push_str("\nfeature mark {\n");
    for name in &usable {
        for rule in &base_rules[name.as_str()] {
            text.push_str(rule);
            text.push('\n');
        }
    }
    text.push_str("} mark;\n");
    text
}

fn anchor_selected(base_name: &str, options: &FeatureOptions) -> bool {
    if options
        .mark_anchors_omit
        .iter()
        .any(|omit| omit == base_name)
    {
        return false;
    }
    options.mark_anchors_include.is_empty()
        || options
            .mark_anchors_include
            .iter()
            .any(|include| include == base_name)
}
