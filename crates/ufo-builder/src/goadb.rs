//! AFDKO support files: GlyphOrderAndAliasDB, FontMenuNameDB, and the
//! makeotf invocation.
//!
//! A generated GOADB always starts with `.notdef`, optionally fills the
//! first 256 slots from a codepage, then lists the remaining glyphs in
//! source order. A caller-provided GOADB file is used as-is, unchecked.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::Path;

use crate::codepage;
use crate::error::Result;
use crate::instance::Instance;
use crate::model::FontModel;
use crate::options::{AfdkoOptions, GoadbOrder};

/// Build the GOADB text for the model under the configured order source.
pub fn build_goadb(model: &FontModel, options: &AfdkoOptions) -> Result<String> {
    if let GoadbOrder::File(path) = &options.goadb_order {
        return Ok(std::fs::read_to_string(path)?);
    }

    let order: Vec<&str> = match &options.goadb_order {
        GoadbOrder::Encoding if !model.encoding.is_empty() => {
            model.encoding.iter().map(String::as_str).collect()
        }
        _ => model.glyph_order.iter().map(String::as_str).collect(),
    };
    let unicodes = model.unicode_map();

    let mut out = String::new();
    let mut listed: HashSet<String> = HashSet::new();
    push_line(&mut out, &mut listed, ".notdef", None);

    if options.goadb_win1252 || options.goadb_macos_roman {
        let lookup: fn(u8) -> Option<u32> = if options.goadb_win1252 {
            codepage::windows_1252
        } else {
            codepage::mac_os_roman
        };
        for slot in 0..=255u8 {
            let Some(cp) = lookup(slot) else { continue };
            if let Some(name) = unicodes.get(&cp) {
                push_line(&mut out, &mut listed, name, Some(cp));
            }
        }
    }

    for name in order {
        if !model.has_glyph(name) {
            continue;
        }
        let cp = model
            .glyph(name)
            .and_then(|glyph| glyph.unicodes.first().copied());
        push_line(&mut out, &mut listed, name, cp);
    }
    Ok(out)
}

fn push_line(out: &mut String, listed: &mut HashSet<String>, name: &str, cp: Option<u32>) {
    if !listed.insert(name.to_string()) {
        return;
    }
    match cp {
        Some(cp) if cp > 0xFFFF => {
            let _ = writeln!(out, "{name}\t{name}\tu{cp:05X}");
        }
        Some(cp) => {
            let _ = writeln!(out, "{name}\t{name}\tuni{cp:04X}");
        }
        None => {
            let _ = writeln!(out, "{name}\t{name}");
        }
    }
}

/// FontMenuNameDB record for one instance.
pub fn build_menu_name(family: &str, instance: &Instance) -> String {
    let style = instance.style_name();
    let ps_name = postscript_name(family, &style);
    let mut out = String::new();
    let _ = writeln!(out, "[{ps_name}]");
    let _ = writeln!(out, "\tf={family}");
    let _ = writeln!(out, "\ts={style}");
    let _ = writeln!(out, "\tl={family} {style}");
    out
}

/// `<Family>-<Style>` with spaces stripped.
pub fn postscript_name(family: &str, style: &str) -> String {
    let family: String = family.split_whitespace().collect();
    let style: String = style.split_whitespace().collect();
    format!("{family}-{style}")
}

/// The makeotf argument list for one written instance.
pub fn makeotf_args(ufo_path: &Path, options: &AfdkoOptions) -> Vec<String> {
    let mut args = vec!["-f".to_string(), ufo_path.display().to_string()];
    if options.release {
        args.push("-r".to_string());
    }
    args.extend(options.makeotf_args.iter().cloned());
    args
}
