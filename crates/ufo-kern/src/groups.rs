//! Kerning-class normalization.
//!
//! Editor-native classes carry their side either in the name, in host-side
//! flags, or not at all. Normalization resolves every class to one or two
//! canonical [`KernGroup`]s and records a remap from the raw class name to
//! the canonical name per side, which pair resolution and group export use.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use log::warn;

use crate::Diagnostic;

/// Canonical prefix for first-side (left) kerning groups.
pub const FIRST_PREFIX: &str = "public.kern1.";
/// Canonical prefix for second-side (right) kerning groups.
pub const SECOND_PREFIX: &str = "public.kern2.";

/// Which side of a kerning pair a group applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    First,
    Second,
}

impl Side {
    /// The canonical name prefix for this side.
    pub fn prefix(self) -> &'static str {
        match self {
            Side::First => FIRST_PREFIX,
            Side::Second => SECOND_PREFIX,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::First => f.write_str("first-side"),
            Side::Second => f.write_str("second-side"),
        }
    }
}

/// Host-provided side flags for a class, used when the name carries no side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SideHint {
    pub first: bool,
    pub second: bool,
}

/// A kerning class as stored by the host editor.
#[derive(Debug, Clone, PartialEq)]
pub struct RawClass {
    /// Editor-native class name.
    pub name: String,
    /// Member glyphs in original order.
    pub members: Vec<String>,
    /// The editor's designated key glyph, if any.
    pub key: Option<String>,
    /// Host side flags, if the editor tracks them.
    pub side_hint: Option<SideHint>,
}

impl RawClass {
    pub fn new<I, S>(name: &str, members: I, key: Option<&str>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.to_string(),
            members: members.into_iter().map(Into::into).collect(),
            key: key.map(str::to_string),
            side_hint: None,
        }
    }

    pub fn with_side_hint(mut self, first: bool, second: bool) -> Self {
        self.side_hint = Some(SideHint { first, second });
        self
    }
}

/// One side of a raw kerning pair: a glyph or a class, by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawRef {
    Glyph(String),
    Class(String),
}

impl RawRef {
    pub fn name(&self) -> &str {
        match self {
            RawRef::Glyph(name) | RawRef::Class(name) => name,
        }
    }
}

/// A kerning pair as stored by the host editor.
#[derive(Debug, Clone, PartialEq)]
pub struct RawKernPair {
    pub left: RawRef,
    pub right: RawRef,
    pub value: f64,
}

/// A canonical two-sided kerning group.
#[derive(Debug, Clone, PartialEq)]
pub struct KernGroup {
    /// Canonical name, `public.kern1.<key>` or `public.kern2.<key>`.
    pub name: String,
    pub side: Side,
    /// Member glyphs in original order. The key glyph is always a member.
    pub members: Vec<String>,
    pub key: String,
}

/// Canonical names a raw class maps to, one per side it is used on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SideNames {
    pub first: Option<String>,
    pub second: Option<String>,
}

impl SideNames {
    pub fn get(&self, side: Side) -> Option<&str> {
        match side {
            Side::First => self.first.as_deref(),
            Side::Second => self.second.as_deref(),
        }
    }
}

/// Normalization settings.
#[derive(Debug, Clone, Default)]
pub struct NormalizeOptions {
    /// Keep classes that appear in no kerning pair. Off by default.
    pub keep_empty: bool,
}

/// The canonical group set plus the raw-name remap table.
#[derive(Debug, Clone, Default)]
pub struct NormalizedGroups {
    /// Canonical groups in classification order.
    pub groups: Vec<KernGroup>,
    /// Raw class name → canonical name per side, in first-appearance order.
    pub remap: IndexMap<String, SideNames>,
    /// Non-kern groups carried through verbatim (external overrides only).
    pub extra: Vec<(String, Vec<String>)>,
    pub diagnostics: Vec<Diagnostic>,
}

impl NormalizedGroups {
    /// Look up a canonical group by name.
    pub fn group(&self, name: &str) -> Option<&KernGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// Canonical name for a raw class when used on the given side.
    pub fn canonical(&self, raw: &str, side: Side) -> Option<&str> {
        self.remap.get(raw).and_then(|names| names.get(side))
    }

    /// Drop group members that are not in `glyphs`, removing groups that
    /// empty out entirely and their remap entries. Groups and the glyph set
    /// they reference must agree before plist or feature emission, or the
    /// output names glyphs that do not exist.
    pub fn retain_glyphs(&mut self, glyphs: &HashSet<String>) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        self.groups.retain_mut(|group| {
            group.members.retain(|member| glyphs.contains(member));
            if group.members.is_empty() {
                let diag = Diagnostic::GroupEmptied { class: group.name.clone() };
                warn!("{diag}");
                diagnostics.push(diag);
                return false;
            }
            if !group.members.iter().any(|member| *member == group.key) {
                let substitute = group.members[0].clone();
                let diag = Diagnostic::KeyGlyphFallback {
                    class: group.name.clone(),
                    substitute: substitute.clone(),
                };
                warn!("{diag}");
                diagnostics.push(diag);
                group.key = substitute;
            }
            true
        });

        let kept: HashSet<&str> = self.groups.iter().map(|g| g.name.as_str()).collect();
        for names in self.remap.values_mut() {
            if names.first.as_deref().is_some_and(|n| !kept.contains(n)) {
                names.first = None;
            }
            if names.second.as_deref().is_some_and(|n| !kept.contains(n)) {
                names.second = None;
            }
        }

        for (_, members) in &mut self.extra {
            members.retain(|member| glyphs.contains(member));
        }
        self.extra.retain(|(_, members)| !members.is_empty());

        diagnostics
    }

    /// Build from an externally supplied group definition, trusted verbatim.
    ///
    /// Names carrying a canonical prefix become kern groups with their side
    /// taken from the prefix and the first member as key glyph; anything else
    /// is carried through to `groups.plist` untouched but takes no part in
    /// kerning.
    pub fn from_override<I>(definitions: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<String>)>,
    {
        let mut out = Self::default();
        for (name, members) in definitions {
            let side = if name.starts_with(FIRST_PREFIX) {
                Side::First
            } else if name.starts_with(SECOND_PREFIX) {
                Side::Second
            } else {
                out.extra.push((name, members));
                continue;
            };
            let key = members.first().cloned().unwrap_or_default();
            out.remap
                .entry(name.clone())
                .or_default()
                .set(side, name.clone());
            out.groups.push(KernGroup { name, side, members, key });
        }
        out
    }
}

impl SideNames {
    fn set(&mut self, side: Side, name: String) {
        match side {
            Side::First => self.first = Some(name),
            Side::Second => self.second = Some(name),
        }
    }
}

/// How a class name was recognized.
enum NameForm {
    /// Already canonical (possibly behind a working `_` prefix).
    Canonical(Side, String),
    /// Side tagged with MMK or `_l`/`_r` markers.
    SideTagged(Side, String),
    /// No side information in the name.
    Generic(String),
}

fn classify_name(name: &str) -> NameForm {
    let trimmed = name.trim_start_matches('_');
    if let Some(stem) = trimmed.strip_prefix(FIRST_PREFIX) {
        return NameForm::Canonical(Side::First, stem.to_string());
    }
    if let Some(stem) = trimmed.strip_prefix(SECOND_PREFIX) {
        return NameForm::Canonical(Side::Second, stem.to_string());
    }
    if let Some(stem) = name.strip_prefix("@MMK_L_") {
        return NameForm::SideTagged(Side::First, stem.to_string());
    }
    if let Some(stem) = name.strip_prefix("@MMK_R_") {
        return NameForm::SideTagged(Side::Second, stem.to_string());
    }
    if let Some(stem) = trimmed.strip_suffix("_l").or_else(|| trimmed.strip_suffix("_L")) {
        return NameForm::SideTagged(Side::First, stem.to_string());
    }
    if let Some(stem) = trimmed.strip_suffix("_r").or_else(|| trimmed.strip_suffix("_R")) {
        return NameForm::SideTagged(Side::Second, stem.to_string());
    }
    NameForm::Generic(trimmed.to_string())
}

/// Per-side bookkeeping while groups are assembled.
#[derive(Default)]
struct SideState {
    /// Canonical names already taken on this side.
    taken: HashSet<String>,
    /// glyph → owning group name, for membership exclusivity.
    owner: HashMap<String, String>,
}

/// Normalize raw kerning classes into canonical groups.
///
/// Classification runs in input order so the output is stable for identical
/// input regardless of how the host stores its classes. Pair usage decides
/// the side of classes whose name and host flags carry none; a class with
/// evidence on both sides is split into independent `kern1` and `kern2`
/// groups sharing the same members.
pub fn normalize_classes(
    classes: &[RawClass],
    pairs: &[RawKernPair],
    options: &NormalizeOptions,
) -> NormalizedGroups {
    let usage = pair_side_usage(pairs);

    let mut out = NormalizedGroups::default();
    let mut first_state = SideState::default();
    let mut second_state = SideState::default();

    for class in classes {
        let (sides, stem) = match classify_name(&class.name) {
            NameForm::Canonical(side, stem) | NameForm::SideTagged(side, stem) => {
                (vec![side], stem)
            }
            NameForm::Generic(stem) => {
                let hint = class.side_hint.unwrap_or_default();
                let used = usage.get(class.name.as_str()).copied().unwrap_or_default();
                let first = hint.first || used.first;
                let second = hint.second || used.second;
                match (first, second) {
                    (true, true) => (vec![Side::First, Side::Second], stem),
                    (true, false) => (vec![Side::First], stem),
                    (false, true) => (vec![Side::Second], stem),
                    (false, false) if options.keep_empty => (vec![Side::First], stem),
                    (false, false) => {
                        let diag = Diagnostic::EmptyClassDropped { class: class.name.clone() };
                        warn!("{diag}");
                        out.diagnostics.push(diag);
                        continue;
                    }
                }
            }
        };

        let split = sides.len() == 2;
        let mut produced: Vec<String> = Vec::with_capacity(sides.len());

        for side in sides {
            let state = match side {
                Side::First => &mut first_state,
                Side::Second => &mut second_state,
            };

            let name = unique_name(side, &stem, state, &class.name, &mut out.diagnostics);

            let mut members = Vec::with_capacity(class.members.len());
            for glyph in &class.members {
                if let Some(existing) = state.owner.get(glyph) {
                    let diag = Diagnostic::DuplicateMembership {
                        glyph: glyph.clone(),
                        side,
                        existing: existing.clone(),
                        class: class.name.clone(),
                    };
                    warn!("{diag}");
                    out.diagnostics.push(diag);
                    continue;
                }
                state.owner.insert(glyph.clone(), name.clone());
                members.push(glyph.clone());
            }
            if members.is_empty() {
                continue;
            }

            let key = resolve_key(class, &stem, &members, &mut out.diagnostics);

            out.remap
                .entry(class.name.clone())
                .or_default()
                .set(side, name.clone());
            produced.push(name.clone());
            out.groups.push(KernGroup { name, side, members, key });
        }

        if split && produced.len() == 2 {
            let diag = Diagnostic::ClassSplit {
                class: class.name.clone(),
                first: produced[0].clone(),
                second: produced[1].clone(),
            };
            warn!("{diag}");
            out.diagnostics.push(diag);
        }
    }

    out
}

/// Reserve a canonical name on a side, de-colliding with a numeric suffix.
fn unique_name(
    side: Side,
    stem: &str,
    state: &mut SideState,
    raw_name: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> String {
    let base = format!("{}{}", side.prefix(), stem);
    if state.taken.insert(base.clone()) {
        return base;
    }
    let mut n = 2usize;
    loop {
        let candidate = format!("{base}.{n}");
        if state.taken.insert(candidate.clone()) {
            let diag = Diagnostic::NameCollision {
                class: raw_name.to_string(),
                side,
                renamed: candidate.clone(),
            };
            warn!("{diag}");
            diagnostics.push(diag);
            return candidate;
        }
        n += 1;
    }
}

/// Pick the group's key glyph: native key if still a member, the stem from
/// the class name if it is a member, otherwise the first member.
fn resolve_key(
    class: &RawClass,
    stem: &str,
    members: &[String],
    diagnostics: &mut Vec<Diagnostic>,
) -> String {
    if let Some(key) = &class.key {
        if members.iter().any(|m| m == key) {
            return key.clone();
        }
    }
    if members.iter().any(|m| m == stem) {
        return stem.to_string();
    }
    let substitute = members[0].clone();
    let diag = Diagnostic::KeyGlyphFallback {
        class: class.name.clone(),
        substitute: substitute.clone(),
    };
    warn!("{diag}");
    diagnostics.push(diag);
    substitute
}

/// Which sides each class name appears on across the raw pair list.
fn pair_side_usage(pairs: &[RawKernPair]) -> HashMap<&str, SideHint> {
    let mut usage: HashMap<&str, SideHint> = HashMap::new();
    for pair in pairs {
        if let RawRef::Class(name) = &pair.left {
            usage.entry(name).or_default().first = true;
        }
        if let RawRef::Class(name) = &pair.right {
            usage.entry(name).or_default().second = true;
        }
    }
    usage
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class_pair(left_class: &str, right_class: &str) -> RawKernPair {
        RawKernPair {
            left: RawRef::Class(left_class.to_string()),
            right: RawRef::Class(right_class.to_string()),
            value: -50.0,
        }
    }

    #[test]
    fn canonical_names_pass_through() {
        let classes = vec![
            RawClass::new("public.kern1.A", ["A", "Agrave"], Some("A")),
            RawClass::new("_public.kern2.O", ["O", "Ograve"], Some("O")),
        ];
        let normalized = normalize_classes(&classes, &[], &NormalizeOptions::default());

        assert_eq!(normalized.groups.len(), 2);
        assert_eq!(normalized.groups[0].name, "public.kern1.A");
        assert_eq!(normalized.groups[0].side, Side::First);
        assert_eq!(normalized.groups[1].name, "public.kern2.O");
        assert_eq!(normalized.groups[1].side, Side::Second);
        assert!(normalized.diagnostics.is_empty());
    }

    #[test]
    fn side_tagged_names_are_renamed() {
        let classes = vec![
            RawClass::new("_A_l", ["A", "Aacute"], Some("A")),
            RawClass::new("_A_r", ["A", "AE"], Some("A")),
            RawClass::new("@MMK_L_T", ["T", "Tbar"], Some("T")),
        ];
        let normalized = normalize_classes(&classes, &[], &NormalizeOptions::default());

        assert_eq!(normalized.groups[0].name, "public.kern1.A");
        assert_eq!(normalized.groups[1].name, "public.kern2.A");
        assert_eq!(normalized.groups[2].name, "public.kern1.T");
        assert_eq!(normalized.canonical("_A_r", Side::Second), Some("public.kern2.A"));
        assert_eq!(normalized.canonical("_A_r", Side::First), None);
    }

    #[test]
    fn generic_class_side_from_pair_usage() {
        let classes = vec![
            RawClass::new("_A", ["A", "Agrave"], Some("A")),
            RawClass::new("_V", ["V", "W"], Some("V")),
        ];
        let pairs = vec![class_pair("_A", "_V")];
        let normalized = normalize_classes(&classes, &pairs, &NormalizeOptions::default());

        assert_eq!(normalized.groups[0].name, "public.kern1.A");
        assert_eq!(normalized.groups[1].name, "public.kern2.V");
    }

    #[test]
    fn generic_class_on_both_sides_is_split() {
        let classes = vec![RawClass::new("_O", ["O", "Ograve"], Some("O"))];
        let pairs = vec![class_pair("_O", "_O")];
        let normalized = normalize_classes(&classes, &pairs, &NormalizeOptions::default());

        assert_eq!(normalized.groups.len(), 2);
        assert_eq!(normalized.groups[0].name, "public.kern1.O");
        assert_eq!(normalized.groups[1].name, "public.kern2.O");
        assert_eq!(normalized.groups[0].members, normalized.groups[1].members);
        assert!(
            normalized
                .diagnostics
                .iter()
                .any(|d| matches!(d, Diagnostic::ClassSplit { .. }))
        );
    }

    #[test]
    fn host_side_hint_used_when_name_is_generic() {
        let classes = vec![RawClass::new("_round", ["o", "e"], Some("o")).with_side_hint(false, true)];
        let normalized = normalize_classes(&classes, &[], &NormalizeOptions::default());

        assert_eq!(normalized.groups[0].name, "public.kern2.round");
        assert_eq!(normalized.groups[0].side, Side::Second);
    }

    #[test]
    fn class_without_kerning_is_dropped_by_default() {
        let classes = vec![RawClass::new("_B", ["B"], Some("B"))];
        let normalized = normalize_classes(&classes, &[], &NormalizeOptions::default());
        assert!(normalized.groups.is_empty());
        assert_eq!(
            normalized.diagnostics,
            vec![Diagnostic::EmptyClassDropped { class: "_B".to_string() }]
        );

        let kept = normalize_classes(&classes, &[], &NormalizeOptions { keep_empty: true });
        assert_eq!(kept.groups.len(), 1);
    }

    #[test]
    fn key_glyph_falls_back_to_first_member() {
        let classes = vec![RawClass::new("_Q_l", ["X", "Y", "Z"], Some("Q"))];
        let normalized = normalize_classes(&classes, &[], &NormalizeOptions::default());

        assert_eq!(normalized.groups[0].key, "X");
        assert_eq!(
            normalized.diagnostics,
            vec![Diagnostic::KeyGlyphFallback {
                class: "_Q_l".to_string(),
                substitute: "X".to_string(),
            }]
        );
    }

    #[test]
    fn key_glyph_from_name_stem_when_native_key_missing() {
        let classes = vec![RawClass::new("_Y_l", ["X", "Y"], None)];
        let normalized = normalize_classes(&classes, &[], &NormalizeOptions::default());
        assert_eq!(normalized.groups[0].key, "Y");
        assert!(normalized.diagnostics.is_empty());
    }

    #[test]
    fn same_side_membership_is_exclusive() {
        let classes = vec![
            RawClass::new("_A_l", ["A", "Agrave"], Some("A")),
            RawClass::new("_Adieresis_l", ["Agrave", "Adieresis"], Some("Adieresis")),
        ];
        let normalized = normalize_classes(&classes, &[], &NormalizeOptions::default());

        assert_eq!(normalized.groups[0].members, vec!["A", "Agrave"]);
        assert_eq!(normalized.groups[1].members, vec!["Adieresis"]);

        for side in [Side::First, Side::Second] {
            let mut seen = HashMap::new();
            for group in normalized.groups.iter().filter(|g| g.side == side) {
                for member in &group.members {
                    assert!(seen.insert(member.clone(), group.name.clone()).is_none());
                }
            }
        }
    }

    #[test]
    fn name_collisions_get_numeric_suffix() {
        let classes = vec![
            RawClass::new("_A_l", ["A"], Some("A")),
            RawClass::new("public.kern1.A", ["Aacute"], Some("Aacute")),
        ];
        let normalized = normalize_classes(&classes, &[], &NormalizeOptions::default());

        assert_eq!(normalized.groups[0].name, "public.kern1.A");
        assert_eq!(normalized.groups[1].name, "public.kern1.A.2");
    }

    #[test]
    fn normalization_is_deterministic() {
        let classes = vec![
            RawClass::new("_O", ["O", "Q"], None),
            RawClass::new("_A_l", ["A"], Some("A")),
            RawClass::new("_n", ["n", "m"], Some("n")),
        ];
        let pairs = vec![class_pair("_O", "_n"), class_pair("_n", "_O")];

        let a = normalize_classes(&classes, &pairs, &NormalizeOptions::default());
        let b = normalize_classes(&classes, &pairs, &NormalizeOptions::default());
        assert_eq!(a.groups, b.groups);
        assert_eq!(a.diagnostics, b.diagnostics);
    }

    #[test]
    fn retained_glyph_set_prunes_members_and_empty_groups() {
        let classes = vec![
            RawClass::new("_A_l", ["A", "Agrave"], Some("A")),
            RawClass::new("_V_r", ["V"], Some("V")),
        ];
        let mut normalized = normalize_classes(&classes, &[], &NormalizeOptions::default());

        let kept: HashSet<String> = ["A".to_string(), "Agrave".to_string()].into();
        let diagnostics = normalized.retain_glyphs(&kept);

        assert_eq!(normalized.groups.len(), 1);
        assert_eq!(normalized.groups[0].name, "public.kern1.A");
        assert_eq!(normalized.canonical("_V_r", Side::Second), None);
        assert_eq!(
            diagnostics,
            vec![Diagnostic::GroupEmptied { class: "public.kern2.V".to_string() }]
        );
    }

    #[test]
    fn pruning_moves_the_key_when_it_falls_out() {
        let classes = vec![RawClass::new("_A_l", ["A", "Agrave"], Some("A"))];
        let mut normalized = normalize_classes(&classes, &[], &NormalizeOptions::default());

        let kept: HashSet<String> = ["Agrave".to_string()].into();
        let diagnostics = normalized.retain_glyphs(&kept);

        assert_eq!(normalized.groups[0].members, vec!["Agrave"]);
        assert_eq!(normalized.groups[0].key, "Agrave");
        assert!(
            diagnostics
                .iter()
                .any(|d| matches!(d, Diagnostic::KeyGlyphFallback { .. }))
        );
    }

    #[test]
    fn override_is_trusted_verbatim() {
        let normalized = NormalizedGroups::from_override(vec![
            ("public.kern1.A".to_string(), vec!["A".to_string(), "Agrave".to_string()]),
            ("myFilterGroup".to_string(), vec!["x".to_string()]),
        ]);

        assert_eq!(normalized.groups.len(), 1);
        assert_eq!(normalized.groups[0].key, "A");
        assert_eq!(normalized.extra, vec![("myFilterGroup".to_string(), vec!["x".to_string()])]);
        assert!(normalized.diagnostics.is_empty());
    }
}
