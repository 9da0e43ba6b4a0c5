//! Raw-pair resolution against the canonical group model.
//!
//! Turns the editor-native pair list into canonical [`KernPair`]s: class
//! references become `public.kern*` group names per side, glyph references
//! are checked against the output glyph set, and values are scaled. In
//! default mode an unresolvable reference drops the pair with a diagnostic;
//! in strict/release mode a missing glyph aborts before any instance is
//! written.

use std::collections::HashSet;

use ufo_kern::{KernPair, KernRef, NormalizedGroups, RawKernPair, RawRef, Side};

use crate::error::{Error, Result};
use crate::report::Diagnostic;
use crate::scale::ScaleContext;

/// Resolve and scale the raw pair list.
pub fn resolve_pairs(
    raw_pairs: &[RawKernPair],
    normalized: &NormalizedGroups,
    glyphs: &HashSet<String>,
    scale: &ScaleContext,
    strict: bool,
) -> Result<(Vec<KernPair>, Vec<Diagnostic>)> {
    let mut pairs = Vec::with_capacity(raw_pairs.len());
    let mut diagnostics = Vec::new();

    for raw in raw_pairs {
        let left = resolve_ref(&raw.left, Side::First, normalized, glyphs, strict)?;
        let right = resolve_ref(&raw.right, Side::Second, normalized, glyphs, strict)?;
        match (left, right) {
            (Some(left), Some(right)) => pairs.push(KernPair {
                left,
                right,
                value: scale.apply(raw.value),
            }),
            _ => diagnostics.push(Diagnostic::Kern(ufo_kern::Diagnostic::UnresolvedPair {
                left: raw.left.name().to_string(),
                right: raw.right.name().to_string(),
            })),
        }
    }

    Ok((pairs, diagnostics))
}

fn resolve_ref(
    reference: &RawRef,
    side: Side,
    normalized: &NormalizedGroups,
    glyphs: &HashSet<String>,
    strict: bool,
) -> Result<Option<KernRef>> {
    match reference {
        RawRef::Glyph(name) => {
            if glyphs.contains(name) {
                Ok(Some(KernRef::Glyph(name.clone())))
            } else if strict {
                Err(Error::GlyphName(name.clone()))
            } else {
                Ok(None)
            }
        }
        RawRef::Class(name) => Ok(normalized
            .canonical(name, side)
            .map(|canonical| KernRef::Group(canonical.to_string()))),
    }
}
