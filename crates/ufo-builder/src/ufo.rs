//! In-memory UFO package assembly.
//!
//! A package is built completely in memory as a list of relative paths and
//! file bodies, then written out in one pass. Building first and writing
//! second keeps partially-written packages off disk when anything fails.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use ufo_kern::{KernPair, NormalizedGroups};

use crate::error::Result;
use crate::glif::{glif_file_name, glif_xml};
use crate::instance::Instance;
use crate::model::FontModel;
use crate::options::GlyphOptions;
use crate::plists;
use crate::scale::ScaleContext;

/// One complete UFO package, not yet on disk.
pub struct UfoPackage {
    /// Directory name, `<family>-<style>.ufo`.
    pub name: String,
    /// Relative path → file body, in write order.
    pub files: Vec<(String, Vec<u8>)>,
}

/// Everything shared across the instances of one build.
pub struct PackageInput<'a> {
    pub model: &'a FontModel,
    pub scale: &'a ScaleContext,
    pub normalized: &'a NormalizedGroups,
    pub pairs: &'a [KernPair],
    pub feature_text: &'a str,
    pub glyph_options: &'a GlyphOptions,
}

/// Assemble the full package for one instance.
pub fn build_package(input: &PackageInput<'_>, instance: &Instance) -> Result<UfoPackage> {
    let model = input.model;
    let kept = kept_glyphs(model, input.glyph_options);
    let glyph_order: Vec<String> = model
        .glyph_order
        .iter()
        .filter(|name| kept.contains(name.as_str()))
        .cloned()
        .collect();

    let mut files: Vec<(String, Vec<u8>)> = Vec::new();
    files.push(("metainfo.plist".to_string(), plists::to_xml_bytes(&plists::metainfo())?));

    let metrics = input.scale.scale_metrics(&model.metrics);
    files.push((
        "fontinfo.plist".to_string(),
        plists::to_xml_bytes(&plists::fontinfo(model, instance, &metrics, input.scale))?,
    ));

    if !input.normalized.groups.is_empty() || !input.normalized.extra.is_empty() {
        files.push((
            "groups.plist".to_string(),
            plists::to_xml_bytes(&plists::groups(input.normalized))?,
        ));
    }
    if !input.pairs.is_empty() {
        files.push((
            "kerning.plist".to_string(),
            plists::to_xml_bytes(&plists::kerning(input.pairs))?,
        ));
    }
    files.push(("lib.plist".to_string(), plists::to_xml_bytes(&plists::lib(&glyph_order))?));

    if !input.feature_text.is_empty() {
        files.push(("features.fea".to_string(), input.feature_text.as_bytes().to_vec()));
    }

    // Glyphs in glyph order, file names deduplicated case-insensitively.
    let mut taken = HashSet::new();
    let mut contents: Vec<(String, String)> = Vec::new();
    for name in &glyph_order {
        if let Some(glyph) = model.glyph(name) {
            let scaled = input.scale.scale_glyph(glyph);
            let file_name = glif_file_name(name, &mut taken);
            files.push((format!("glyphs/{file_name}"), glif_xml(&scaled).into_bytes()));
            contents.push((name.clone(), file_name));
        }
    }
    files.push((
        "glyphs/contents.plist".to_string(),
        plists::to_xml_bytes(&plists::contents(&contents))?,
    ));

    Ok(UfoPackage {
        name: package_name(&model.family_name, &instance.style_name()),
        files,
    })
}

/// Glyph names surviving the omission filters.
pub fn kept_glyphs(model: &FontModel, options: &GlyphOptions) -> HashSet<String> {
    model
        .glyph_order
        .iter()
        .filter(|name| !omitted(name, options))
        .cloned()
        .collect()
}

fn omitted(name: &str, options: &GlyphOptions) -> bool {
    if options.omit_names.iter().any(|omit| omit == name) {
        return true;
    }
    options.omit_suffixes.iter().any(|suffix| {
        name.rsplit_once('.')
            .is_some_and(|(stem, tail)| !stem.is_empty() && tail == suffix.trim_start_matches('.'))
    })
}

/// `<family>-<style>.ufo` with spaces stripped from both parts.
pub fn package_name(family: &str, style: &str) -> String {
    let family: String = family.split_whitespace().collect();
    let style: String = style.split_whitespace().collect();
    format!("{family}-{style}.ufo")
}

/// Write a package under `parent`, replacing any existing directory.
pub fn write_dir(package: &UfoPackage, parent: &Path) -> Result<std::path::PathBuf> {
    let root = parent.join(&package.name);
    if root.exists() {
        fs::remove_dir_all(&root)?;
    }
    fs::create_dir_all(root.join("glyphs"))?;
    for (relative, body) in &package.files {
        fs::write(root.join(relative), body)?;
    }
    Ok(root)
}
