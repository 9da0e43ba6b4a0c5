//! # UFO kerning toolkit
//!
//! Normalize editor-native kerning classes into the canonical UFO group
//! model and generate an OpenType `kern` feature from the result.
//!
//! Font editors disagree on how kerning classes are named: some already use
//! the UFO `public.kern1.`/`public.kern2.` prefixes, some tag the side with
//! `@MMK_L_`/`@MMK_R_` or trailing `_l`/`_r` markers, and some use bare names
//! with no side information at all. [`normalize_classes`] folds all of these
//! into two-sided [`KernGroup`]s with stable names and key glyphs, and
//! [`build_kern_feature`] turns the normalized pairs into `kern` feature
//! source with automatic subtable partitioning.
//!
//! Nothing in this crate touches the filesystem and every operation is
//! deterministic for identical input.
//!
//! ## Example
//!
//! ```
//! use ufo_kern::{normalize_classes, NormalizeOptions, RawClass, RawKernPair, RawRef};
//!
//! let classes = vec![RawClass::new("_A_l", ["A", "Agrave"], Some("A"))];
//! let pairs = vec![RawKernPair {
//!     left: RawRef::Class("_A_l".to_string()),
//!     right: RawRef::Glyph("V".to_string()),
//!     value: -80.0,
//! }];
//!
//! let normalized = normalize_classes(&classes, &pairs, &NormalizeOptions::default());
//! assert_eq!(normalized.groups[0].name, "public.kern1.A");
//! ```

mod diagnostic;
mod feature;
mod groups;

pub use diagnostic::Diagnostic;
pub use feature::{
    KernFeature, KernFeatureOptions, KernMode, KernPair, KernRef, SUBTABLE_MAX_PAIRS,
    build_kern_feature,
};
pub use groups::{
    FIRST_PREFIX, KernGroup, NormalizeOptions, NormalizedGroups, RawClass, RawKernPair, RawRef,
    SECOND_PREFIX, Side, SideHint, SideNames, normalize_classes,
};
