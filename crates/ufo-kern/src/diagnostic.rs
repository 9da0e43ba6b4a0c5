use crate::groups::Side;

/// Non-fatal findings from group normalization and feature generation.
///
/// None of these stop a build; they accumulate into the caller's end-of-run
/// report. The `Display` impls are the user-facing message text.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Diagnostic {
    /// A class had no resolvable key glyph; the first member was substituted.
    #[error("class '{class}' has no valid key glyph; using first member '{substitute}'")]
    KeyGlyphFallback { class: String, substitute: String },

    /// A class was used on both sides of kerning pairs and became two groups.
    #[error("class '{class}' kerns on both sides; split into '{first}' and '{second}'")]
    ClassSplit {
        class: String,
        first: String,
        second: String,
    },

    /// A class with no kerning was dropped from the output.
    #[error("class '{class}' has no kerning; dropped")]
    EmptyClassDropped { class: String },

    /// Every member of a group was omitted from the output.
    #[error("group '{class}' lost all members to glyph omission; dropped")]
    GroupEmptied { class: String },

    /// A glyph already belonged to another group on the same side.
    #[error(
        "glyph '{glyph}' is already in {side} group '{existing}'; membership in '{class}' ignored"
    )]
    DuplicateMembership {
        glyph: String,
        side: Side,
        existing: String,
        class: String,
    },

    /// Two classes reduced to the same canonical name; the later one was renamed.
    #[error("class '{class}' collides with an existing {side} group; renamed to '{renamed}'")]
    NameCollision {
        class: String,
        side: Side,
        renamed: String,
    },

    /// A kerning pair referenced a glyph or group that does not exist.
    #[error("kerning pair ({left}, {right}) references an unknown glyph or group; dropped")]
    UnresolvedPair { left: String, right: String },

    /// A rule bucket exceeded one subtable. Splitting keeps every subtable
    /// within capacity, but overflow caused by earlier GPOS features or by
    /// glyphs shared between same-side groups is not detected here.
    #[error("kern {bucket} rules split across {subtables} subtables; residual overflow is not verified")]
    SubtableOverflow { bucket: String, subtables: usize },
}
