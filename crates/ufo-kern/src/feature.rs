//! OpenType `kern` feature generation.
//!
//! Pairs are partitioned into glyph/glyph, glyph/class and class/class rule
//! buckets. Any bucket that would exceed the class-pair capacity of a single
//! subtable is split, in order, across multiple subtables inside a named
//! lookup. Splitting keeps every emitted subtable within capacity; overflow
//! originating elsewhere (earlier GPOS features, glyphs shared between
//! same-side groups) is reported but not corrected.

use std::collections::HashSet;
use std::fmt::Write;

use log::warn;

use crate::{Diagnostic, groups::KernGroup};

/// Class-pair capacity of a single `kern` subtable.
pub const SUBTABLE_MAX_PAIRS: usize = 1024;

/// One side of a canonical kerning pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KernRef {
    Glyph(String),
    /// A canonical group name (`public.kern1.*` / `public.kern2.*`).
    Group(String),
}

impl KernRef {
    pub fn name(&self) -> &str {
        match self {
            KernRef::Glyph(name) | KernRef::Group(name) => name,
        }
    }

    fn fea(&self) -> String {
        match self {
            KernRef::Glyph(name) => name.clone(),
            KernRef::Group(name) => format!("@{name}"),
        }
    }
}

/// A canonical kerning pair.
#[derive(Debug, Clone, PartialEq)]
pub struct KernPair {
    pub left: KernRef,
    pub right: KernRef,
    pub value: f64,
}

/// What to emit for the `kern` feature.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum KernMode {
    /// Generate the feature from the pair list.
    #[default]
    Generate,
    /// Reuse an existing feature body unmodified.
    Passthrough(String),
    /// Emit nothing.
    Omit,
}

#[derive(Debug, Clone)]
pub struct KernFeatureOptions {
    pub mode: KernMode,
    /// Pairs with `|value| < min_value` are omitted.
    pub min_value: f64,
    /// Emit `@group = [...]` definitions ahead of the feature block.
    pub include_group_definitions: bool,
}

impl Default for KernFeatureOptions {
    fn default() -> Self {
        Self {
            mode: KernMode::Generate,
            min_value: 0.0,
            include_group_definitions: true,
        }
    }
}

/// Generated feature text plus anything worth reporting.
#[derive(Debug, Clone, Default)]
pub struct KernFeature {
    pub text: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// Build `kern` feature source from canonical groups and pairs.
///
/// `glyphs` is the set of glyph names that exist in the output; pairs whose
/// references resolve to neither a glyph nor a group are dropped with a
/// diagnostic. Output is deterministic: buckets are emitted in a fixed order
/// and pair order within a bucket is input order.
pub fn build_kern_feature(
    groups: &[KernGroup],
    pairs: &[KernPair],
    glyphs: &HashSet<String>,
    options: &KernFeatureOptions,
) -> KernFeature {
    match &options.mode {
        KernMode::Omit => return KernFeature::default(),
        KernMode::Passthrough(body) => {
            // A reused body can still reference the canonical classes, so the
            // definitions are prepended the same way as for generated output.
            let mut text = String::new();
            if !body.is_empty() && options.include_group_definitions {
                group_definitions(&mut text, groups);
            }
            text.push_str(body);
            return KernFeature { text, diagnostics: Vec::new() };
        }
        KernMode::Generate => {}
    }

    let mut out = KernFeature::default();
    let group_names: HashSet<&str> = groups.iter().map(|g| g.name.as_str()).collect();

    let mut glyph_glyph = Vec::new();
    let mut glyph_class = Vec::new();
    let mut class_class = Vec::new();

    for pair in pairs {
        if pair.value.abs() < options.min_value {
            continue;
        }
        if !resolves(&pair.left, glyphs, &group_names) || !resolves(&pair.right, glyphs, &group_names)
        {
            let diag = Diagnostic::UnresolvedPair {
                left: pair.left.name().to_string(),
                right: pair.right.name().to_string(),
            };
            warn!("{diag}");
            out.diagnostics.push(diag);
            continue;
        }
        match (&pair.left, &pair.right) {
            (KernRef::Glyph(_), KernRef::Glyph(_)) => glyph_glyph.push(pair),
            (KernRef::Group(_), KernRef::Group(_)) => class_class.push(pair),
            _ => glyph_class.push(pair),
        }
    }

    if glyph_glyph.is_empty() && glyph_class.is_empty() && class_class.is_empty() {
        return out;
    }

    let mut text = String::new();
    if options.include_group_definitions {
        group_definitions(&mut text, groups);
    }

    text.push_str("feature kern {\n");
    emit_bucket(&mut text, "glyph", &glyph_glyph, &mut out.diagnostics);
    emit_bucket(&mut text, "mixed", &glyph_class, &mut out.diagnostics);
    emit_bucket(&mut text, "class", &class_class, &mut out.diagnostics);
    text.push_str("} kern;\n");

    out.text = text;
    out
}

fn group_definitions(text: &mut String, groups: &[KernGroup]) {
    for group in groups {
        let _ = writeln!(text, "@{} = [{}];", group.name, group.members.join(" "));
    }
    if !groups.is_empty() {
        text.push('\n');
    }
}

fn resolves(reference: &KernRef, glyphs: &HashSet<String>, groups: &HashSet<&str>) -> bool {
    match reference {
        KernRef::Glyph(name) => glyphs.contains(name),
        KernRef::Group(name) => groups.contains(name.as_str()),
    }
}

/// Emit one reference-kind bucket, splitting into subtables as needed.
fn emit_bucket(
    text: &mut String,
    bucket: &str,
    pairs: &[&KernPair],
    diagnostics: &mut Vec<Diagnostic>,
) {
    if pairs.is_empty() {
        return;
    }

    let subtables = pairs.len().div_ceil(SUBTABLE_MAX_PAIRS);
    if subtables == 1 {
        for pair in pairs {
            let _ = writeln!(text, "    {}", rule(pair));
        }
        return;
    }

    let diag = Diagnostic::SubtableOverflow { bucket: bucket.to_string(), subtables };
    warn!("{diag}");
    diagnostics.push(diag);

    let _ = writeln!(text, "    lookup kern_{bucket} {{");
    for (i, chunk) in pairs.chunks(SUBTABLE_MAX_PAIRS).enumerate() {
        if i > 0 {
            text.push_str("        subtable;\n");
        }
        for pair in chunk {
            let _ = writeln!(text, "        {}", rule(pair));
        }
    }
    let _ = writeln!(text, "    }} kern_{bucket};");
}

fn rule(pair: &KernPair) -> String {
    format!("pos {} {} {};", pair.left.fea(), pair.right.fea(), format_value(pair.value))
}

/// Integral values print without a decimal point, everything else with the
/// shortest round-trip representation.
fn format_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}
