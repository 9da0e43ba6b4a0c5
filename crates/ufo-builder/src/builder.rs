//! Pipeline orchestration.
//!
//! Phases run strictly in order: validate, snapshot, scale setup, instance
//! resolution, group normalization, pair resolution, feature assembly, then
//! per-instance output. Everything up to output is computed once and shared
//! read-only; instances are written in parallel.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use rayon::prelude::*;
use ufo_kern::{KernPair, NormalizeOptions, NormalizedGroups, normalize_classes};

use crate::archive;
use crate::designspace::{DesignSpace, Source};
use crate::error::{Error, Result};
use crate::features::{FeatureInput, assemble_features};
use crate::flc::{flc_text, parse_flc};
use crate::goadb;
use crate::instance::{Instance, require_instances, resolve_instances};
use crate::kerning::resolve_pairs;
use crate::model::{FontModel, FontSource};
use crate::options::{BuildOptions, GroupSource, InstanceOptions, KernFeatureMode};
use crate::plists::parse_groups_plist;
use crate::report::{BuildReport, Diagnostic, InstanceRecord};
use crate::scale::ScaleContext;
use crate::tool::{SystemToolRunner, ToolRunner};
use crate::ufo::{PackageInput, build_package, kept_glyphs, write_dir};

const DEFAULT_TARGET_UPM: f64 = 1000.0;

/// Run the full pipeline with the system tool runner.
pub fn write_ufos(source: &dyn FontSource, options: &BuildOptions) -> Result<BuildReport> {
    write_ufos_with_runner(source, options, &SystemToolRunner)
}

/// Run the full pipeline.
///
/// Fatal errors leave no partially finalized archive; instances already
/// written when a later one fails are left intact.
pub fn write_ufos_with_runner(
    source: &dyn FontSource,
    options: &BuildOptions,
    runner: &dyn ToolRunner,
) -> Result<BuildReport> {
    let model = source.snapshot();
    options.validate(&model)?;

    let output_dir = match &options.output_dir {
        Some(dir) => dir.clone(),
        None => std::env::temp_dir().join("ufo-builder"),
    };

    let target_upm = options
        .scale
        .target_upm
        .map(f64::from)
        .unwrap_or(DEFAULT_TARGET_UPM);
    let scale = ScaleContext::new(options.scale.factor, options.scale.auto, model.upm, target_upm);
    debug!(
        "scale factor {} (source UPM {}, target UPM {})",
        scale.factor(),
        model.upm,
        scale.target_upm()
    );

    let instances = resolve_instances(&model, &options.instances)?;
    require_instances(&instances)?;

    // Designspace export writes one UFO per master; the resolved instances
    // only appear as descriptors in the document.
    let built = if options.designspace.export {
        let masters_only = InstanceOptions { layer: options.instances.layer, ..Default::default() };
        let masters = resolve_instances(&model, &masters_only)?;
        require_instances(&masters)?;
        masters
    } else {
        instances.clone()
    };
    info!("building {} instance(s) of {}", built.len(), model.family_name);

    let kept = kept_glyphs(&model, &options.glyphs);
    let mut report = BuildReport::default();

    let mut normalized = load_groups(&model, options, &mut report)?;
    report.extend_kern(normalized.retain_glyphs(&kept));
    let strict = options.afdko.release;
    let (pairs, pair_diagnostics) = resolve_pairs(&model.kern_pairs, &normalized, &kept, &scale, strict)?;
    report.diagnostics.extend(pair_diagnostics);

    let feature_text = build_feature_text(&model, options, &normalized, &pairs, &kept, &mut report)?;

    fs::create_dir_all(&output_dir)?;

    if options.groups.export_flc {
        let stem: String = model.family_name.split_whitespace().collect();
        fs::write(output_dir.join(format!("{stem}.flc")), flc_text(&normalized.groups))?;
    }

    // Designspace export keeps one UFO per master on disk; the AFDKO parts
    // only make sense for a flat instance build.
    let afdko_parts = options.afdko.parts && !options.designspace.export;
    if afdko_parts {
        write_afdko_parts(&model, &built, options, &output_dir)?;
    }

    let glyph_options = &options.glyphs;
    let input = PackageInput {
        model: &model,
        scale: &scale,
        normalized: &normalized,
        pairs: &pairs,
        feature_text: &feature_text,
        glyph_options,
    };

    let written: Vec<(InstanceRecord, Vec<Diagnostic>)> = built
        .par_iter()
        .map(|instance| write_instance(&input, instance, options, &output_dir, afdko_parts, runner))
        .collect::<Result<Vec<_>>>()?;
    for (record, diagnostics) in written {
        report.instances.push(record);
        report.diagnostics.extend(diagnostics);
    }

    if options.designspace.export {
        report.designspace =
            Some(write_designspace(&model, &built, &instances, options, &output_dir)?);
    }

    report.log_summary();
    Ok(report)
}

fn write_instance(
    input: &PackageInput<'_>,
    instance: &Instance,
    options: &BuildOptions,
    output_dir: &Path,
    afdko_parts: bool,
    runner: &dyn ToolRunner,
) -> Result<(InstanceRecord, Vec<Diagnostic>)> {
    let package = build_package(input, instance)?;
    let mut diagnostics = Vec::new();

    let path = if options.archive.ufoz {
        archive::write_ufoz(&package, output_dir, options.archive.compress)?
    } else {
        let path = write_dir(&package, output_dir)?;
        if afdko_parts && options.afdko.run_makeotf {
            run_makeotf(&path, options, output_dir, runner, &mut diagnostics)?;
        }
        path
    };

    Ok((
        InstanceRecord { style_name: instance.style_name(), path },
        diagnostics,
    ))
}

fn run_makeotf(
    ufo_path: &Path,
    options: &BuildOptions,
    output_dir: &Path,
    runner: &dyn ToolRunner,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<()> {
    let mut args = goadb::makeotf_args(ufo_path, &options.afdko);
    args.push("-gf".to_string());
    args.push(output_dir.join("GlyphOrderAndAliasDB").display().to_string());
    args.push("-mf".to_string());
    args.push(output_dir.join("FontMenuNameDB").display().to_string());

    let output = runner.run("makeotf", &args, output_dir)?;
    if output.success() {
        return Ok(());
    }
    debug!("makeotf stderr: {}", output.stderr.trim_end());
    if options.afdko.release {
        return Err(Error::Tool { tool: "makeotf".to_string(), status: output.status });
    }
    diagnostics.push(Diagnostic::ToolFailure {
        tool: "makeotf".to_string(),
        status: output.status,
    });
    Ok(())
}

fn load_groups(
    model: &FontModel,
    options: &BuildOptions,
    report: &mut BuildReport,
) -> Result<NormalizedGroups> {
    let normalize_options = NormalizeOptions { keep_empty: options.groups.keep_empty };
    let normalized = match &options.groups.source {
        GroupSource::Font => {
            normalize_classes(&model.kern_classes, &model.kern_pairs, &normalize_options)
        }
        GroupSource::ClassFile(path) => {
            let text = fs::read_to_string(path)?;
            normalize_classes(&parse_flc(&text), &model.kern_pairs, &normalize_options)
        }
        GroupSource::GroupsPlist(path) => {
            let bytes = fs::read(path)?;
            NormalizedGroups::from_override(parse_groups_plist(&bytes)?)
        }
    };
    report.extend_kern(normalized.diagnostics.clone());
    Ok(normalized)
}

fn build_feature_text(
    model: &FontModel,
    options: &BuildOptions,
    normalized: &NormalizedGroups,
    pairs: &[KernPair],
    kept: &HashSet<String>,
    report: &mut BuildReport,
) -> Result<String> {
    let file_body;
    let passthrough_kern = if options.features.kern_mode == KernFeatureMode::Passthrough {
        match &options.features.kern_feature_file {
            Some(path) => {
                file_body = fs::read_to_string(path)?;
                Some(file_body.as_str())
            }
            None => model.kern_feature.as_deref(),
        }
    } else {
        None
    };

    let glyph_order: Vec<&crate::model::Glyph> = model
        .ordered_glyphs()
        .filter(|glyph| kept.contains(&glyph.name))
        .collect();
    let feature_input = FeatureInput {
        existing: &model.features,
        passthrough_kern,
        normalized,
        pairs,
        glyphs: kept,
    };
    let (text, diagnostics) = assemble_features(&feature_input, &glyph_order, &options.features);
    report.extend_kern(diagnostics);
    Ok(text)
}

fn write_afdko_parts(
    model: &FontModel,
    instances: &[Instance],
    options: &BuildOptions,
    output_dir: &Path,
) -> Result<()> {
    fs::create_dir_all(output_dir)?;
    let goadb_text = goadb::build_goadb(model, &options.afdko)?;
    fs::write(output_dir.join("GlyphOrderAndAliasDB"), goadb_text)?;

    let mut menu_db = String::new();
    for instance in instances {
        menu_db.push_str(&goadb::build_menu_name(&model.family_name, instance));
    }
    fs::write(output_dir.join("FontMenuNameDB"), menu_db)?;
    Ok(())
}

fn write_designspace(
    model: &FontModel,
    masters: &[Instance],
    instances: &[Instance],
    options: &BuildOptions,
    output_dir: &Path,
) -> Result<PathBuf> {
    let sources: Vec<Source> = masters.iter().map(|m| describe(model, m)).collect();
    let default_location = if options.designspace.default_location.is_empty() {
        masters
            .first()
            .map(|master| master.location.clone())
            .unwrap_or_default()
    } else {
        options.designspace.default_location.clone()
    };
    let document = DesignSpace::new(&model.family_name, &model.axes, sources, &default_location)?
        .with_instances(instances.iter().map(|i| describe(model, i)).collect());
    document.write(output_dir)
}

fn describe(model: &FontModel, instance: &Instance) -> Source {
    Source {
        file_name: crate::ufo::package_name(&model.family_name, &instance.style_name()),
        style_name: instance.style_name(),
        location: instance.location.clone(),
    }
}
