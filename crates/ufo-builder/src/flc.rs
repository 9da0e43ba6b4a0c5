//! FontLab class file (`.flc`) parsing and writing.
//!
//! The format is line-oriented:
//!
//! ```text
//! %%FONTLAB CLASSES
//!
//! %%CLASS _A_l
//! %%GLYPHS  A' Agrave Aacute
//! %%KERNING: L 0
//! %%END
//! ```
//!
//! A trailing apostrophe marks the key glyph; the `%%KERNING` flags give the
//! side(s) the class kerns on and feed the normalizer as host side hints.

use std::fmt::Write;

use ufo_kern::{KernGroup, RawClass, Side};

/// Parse `.flc` text into raw classes, in file order.
pub fn parse_flc(text: &str) -> Vec<RawClass> {
    let mut classes = Vec::new();
    let mut current: Option<FlcClass> = None;

    for line in text.lines() {
        let line = line.trim();
        if let Some(name) = line.strip_prefix("%%CLASS") {
            if let Some(done) = current.take() {
                classes.push(done.finish());
            }
            current = Some(FlcClass::new(name.trim()));
        } else if let Some(glyphs) = line.strip_prefix("%%GLYPHS") {
            if let Some(class) = &mut current {
                class.add_glyphs(glyphs);
            }
        } else if let Some(flags) = strip_keyword(line, "%%KERNING") {
            if let Some(class) = &mut current {
                class.first |= flags.contains('L');
                class.second |= flags.contains('R');
                class.has_flags = true;
            }
        } else if line == "%%END" {
            if let Some(done) = current.take() {
                classes.push(done.finish());
            }
        }
    }
    if let Some(done) = current.take() {
        classes.push(done.finish());
    }
    classes
}

/// Serialize canonical groups as `.flc` text, one class per group under its
/// canonical name. Round-trips through [`parse_flc`].
pub fn flc_text(groups: &[KernGroup]) -> String {
    let mut out = String::from("%%FONTLAB CLASSES\n");
    for group in groups {
        out.push('\n');
        let _ = writeln!(out, "%%CLASS {}", group.name);
        out.push_str("%%GLYPHS ");
        for (i, member) in group.members.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            out.push_str(member);
            if *member == group.key {
                out.push('\'');
            }
        }
        out.push('\n');
        let flag = match group.side {
            Side::First => 'L',
            Side::Second => 'R',
        };
        let _ = writeln!(out, "%%KERNING: {flag} 0");
        out.push_str("%%END\n");
    }
    out
}

fn strip_keyword<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    line.strip_prefix(keyword)
        .map(|rest| rest.trim_start_matches(':').trim())
}

struct FlcClass {
    name: String,
    members: Vec<String>,
    key: Option<String>,
    first: bool,
    second: bool,
    has_flags: bool,
}

impl FlcClass {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            members: Vec::new(),
            key: None,
            first: false,
            second: false,
            has_flags: false,
        }
    }

    fn add_glyphs(&mut self, glyphs: &str) {
        for token in glyphs.split_whitespace() {
            if let Some(key) = token.strip_suffix('\'') {
                self.key = Some(key.to_string());
                self.members.push(key.to_string());
            } else {
                self.members.push(token.to_string());
            }
        }
    }

    fn finish(self) -> RawClass {
        let mut class = RawClass::new(&self.name, self.members, self.key.as_deref());
        if self.has_flags {
            class = class.with_side_hint(self.first, self.second);
        }
        class
    }
}
