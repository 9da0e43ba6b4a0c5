//! End-to-end pipeline tests against a small two-master fixture.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Result;
use ufo_builder::{
    AfdkoOptions, Anchor, ArchiveOptions, Axis, BuildOptions, Contour, ContourPoint,
    DesignspaceOptions, FeatureOptions, FontMetrics, FontModel, Glyph, GlyphOptions,
    GroupOptions, InstanceOptions, Master, PointType, ToolOutput, ToolRunner, write_ufos,
    write_ufos_with_runner,
};
use ufo_kern::{RawClass, RawKernPair, RawRef};

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn glyph(name: &str, width: f64, unicode: Option<u32>) -> Glyph {
    let mut glyph = Glyph::new(name, width);
    glyph.unicodes = unicode.into_iter().collect();
    let mut contour = Contour::default();
    contour.points.push(ContourPoint::new(10.0, 0.0, PointType::Line));
    contour.points.push(ContourPoint::new(10.0, 700.0, PointType::Line));
    contour.points.push(ContourPoint::new(width - 10.0, 700.0, PointType::Line));
    glyph.contours.push(contour);
    glyph
}

fn fixture() -> FontModel {
    let mut model = FontModel {
        family_name: "Test Sans".to_string(),
        version: "1.000".to_string(),
        upm: 1000.0,
        metrics: FontMetrics {
            ascender: 750.0,
            descender: -250.0,
            x_height: 500.0,
            cap_height: 700.0,
            italic_angle: 0.0,
        },
        axes: vec![Axis::new("Weight", "wght")],
        masters: vec![
            Master::new(["Light"], vec![0.0]),
            Master::new(["Bold"], vec![1000.0]),
        ],
        features: "languagesystem DFLT dflt;".to_string(),
        ..Default::default()
    };

    model.insert_glyph(glyph(".notdef", 500.0, None));
    model.insert_glyph(glyph("A", 600.0, Some(0x41)));
    model.insert_glyph(glyph("V", 620.0, Some(0x56)));
    let mut grave = glyph("gravecomb", 0.0, Some(0x300));
    grave.anchors.push(Anchor::new("_top", 150.0, 680.0));
    model.insert_glyph(grave);
    let a = model.glyphs.get_mut("A").unwrap();
    a.anchors.push(Anchor::new("top", 300.0, 710.0));

    model.kern_classes = vec![
        RawClass::new("A_l", ["A"], Some("A")),
        RawClass::new("V_r", ["V"], Some("V")),
    ];
    model.kern_pairs = vec![
        RawKernPair {
            left: RawRef::Class("A_l".to_string()),
            right: RawRef::Class("V_r".to_string()),
            value: -120.0,
        },
        RawKernPair {
            left: RawRef::Glyph("A".to_string()),
            right: RawRef::Glyph("V".to_string()),
            value: -80.0,
        },
    ];
    model
}

fn options(dir: &Path) -> BuildOptions {
    BuildOptions {
        output_dir: Some(dir.to_path_buf()),
        ..Default::default()
    }
}

#[test]
fn masters_become_instances_when_no_values_are_given() -> Result<()> {
    init_logs();
    let dir = tempfile::tempdir()?;
    let report = write_ufos(&fixture(), &options(dir.path()))?;

    assert_eq!(report.instances.len(), 2);
    let light = dir.path().join("TestSans-Light.ufo");
    let bold = dir.path().join("TestSans-Bold.ufo");
    assert!(light.join("metainfo.plist").exists());
    assert!(bold.join("glyphs/contents.plist").exists());
    assert!(report.is_clean());
    Ok(())
}

#[test]
fn reruns_are_byte_identical() -> Result<()> {
    let model = fixture();
    let first = tempfile::tempdir()?;
    let second = tempfile::tempdir()?;
    write_ufos(&model, &options(first.path()))?;
    write_ufos(&model, &options(second.path()))?;

    for file in ["groups.plist", "kerning.plist", "features.fea", "lib.plist"] {
        let a = fs::read(first.path().join("TestSans-Light.ufo").join(file))?;
        let b = fs::read(second.path().join("TestSans-Light.ufo").join(file))?;
        assert_eq!(a, b, "{file} differs between runs");
    }
    Ok(())
}

#[test]
fn generated_feature_carries_groups_and_rules() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_ufos(&fixture(), &options(dir.path()))?;

    let fea = fs::read_to_string(dir.path().join("TestSans-Light.ufo/features.fea"))?;
    assert!(fea.contains("languagesystem DFLT dflt;"));
    assert!(fea.contains("@public.kern1.A = [A];"));
    assert!(fea.contains("pos @public.kern1.A @public.kern2.V -120;"));
    assert!(fea.contains("pos A V -80;"));
    Ok(())
}

#[test]
fn mark_feature_is_generated_on_request() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut options = options(dir.path());
    options.features = FeatureOptions { mark_generate: true, ..Default::default() };
    write_ufos(&fixture(), &options)?;

    let fea = fs::read_to_string(dir.path().join("TestSans-Bold.ufo/features.fea"))?;
    assert!(fea.contains("markClass [gravecomb] <anchor 150 680> @MC_top;"));
    assert!(fea.contains("pos base A <anchor 300 710> mark @MC_top;"));
    Ok(())
}

#[test]
fn invalid_configuration_produces_no_output() {
    let parent = tempfile::tempdir().unwrap();
    let dir = parent.path().join("out");
    let mut options = options(&dir);
    options.instances = InstanceOptions {
        values: vec![vec![400.0].into()],
        names: vec![vec!["A".to_string()], vec!["B".to_string()]],
        ..Default::default()
    };
    assert!(write_ufos(&fixture(), &options).is_err());
    assert!(!dir.exists());
}

#[test]
fn ufoz_output_is_atomic() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut options = options(dir.path());
    options.archive = ArchiveOptions { ufoz: true, compress: true };
    let report = write_ufos(&fixture(), &options)?;

    assert_eq!(report.instances.len(), 2);
    assert!(dir.path().join("TestSans-Light.ufoz").exists());
    for entry in fs::read_dir(dir.path())? {
        let name = entry?.file_name();
        let name = name.to_string_lossy();
        assert!(!name.ends_with(".part"), "leftover temporary file {name}");
    }
    Ok(())
}

#[test]
fn strict_mode_aborts_before_any_instance() {
    let mut model = fixture();
    model.kern_pairs.push(RawKernPair {
        left: RawRef::Glyph("Missing".to_string()),
        right: RawRef::Glyph("V".to_string()),
        value: -40.0,
    });
    let parent = tempfile::tempdir().unwrap();
    let dir = parent.path().join("out");
    let mut options = options(&dir);
    options.afdko = AfdkoOptions { release: true, ..Default::default() };

    assert!(write_ufos(&model, &options).is_err());
    assert!(!dir.exists());
}

#[test]
fn missing_glyph_is_a_diagnostic_by_default() -> Result<()> {
    init_logs();
    let mut model = fixture();
    model.kern_pairs.push(RawKernPair {
        left: RawRef::Glyph("Missing".to_string()),
        right: RawRef::Glyph("V".to_string()),
        value: -40.0,
    });
    let dir = tempfile::tempdir()?;
    let report = write_ufos(&model, &options(dir.path()))?;

    assert_eq!(report.instances.len(), 2);
    assert!(!report.is_clean());
    // The bad pair is out of the kerning plist; the good ones stay.
    let kerning = fs::read_to_string(dir.path().join("TestSans-Light.ufo/kerning.plist"))?;
    assert!(!kerning.contains("Missing"));
    assert!(kerning.contains("public.kern1.A"));
    Ok(())
}

struct RecordingRunner {
    status: i32,
    calls: Mutex<Vec<(String, Vec<String>)>>,
}

impl RecordingRunner {
    fn new(status: i32) -> Self {
        Self { status, calls: Mutex::new(Vec::new()) }
    }
}

impl ToolRunner for RecordingRunner {
    fn run(
        &self,
        program: &str,
        args: &[String],
        _cwd: &Path,
    ) -> ufo_builder::Result<ToolOutput> {
        self.calls
            .lock()
            .unwrap()
            .push((program.to_string(), args.to_vec()));
        Ok(ToolOutput {
            status: self.status,
            stdout: String::new(),
            stderr: String::new(),
        })
    }
}

#[test]
fn makeotf_runs_once_per_instance() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut options = options(dir.path());
    options.afdko = AfdkoOptions {
        parts: true,
        run_makeotf: true,
        ..Default::default()
    };
    let runner = RecordingRunner::new(0);
    let report = write_ufos_with_runner(&fixture(), &options, &runner)?;
    assert!(report.is_clean());

    assert!(dir.path().join("GlyphOrderAndAliasDB").exists());
    let menu = fs::read_to_string(dir.path().join("FontMenuNameDB"))?;
    assert!(menu.contains("[TestSans-Light]"));
    assert!(menu.contains("[TestSans-Bold]"));

    let calls = runner.calls.lock().unwrap();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|(program, _)| program == "makeotf"));
    Ok(())
}

#[test]
fn tool_failure_is_a_diagnostic_unless_strict() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut options = options(dir.path());
    options.afdko = AfdkoOptions {
        parts: true,
        run_makeotf: true,
        ..Default::default()
    };
    let runner = RecordingRunner::new(2);
    let report = write_ufos_with_runner(&fixture(), &options, &runner)?;
    assert_eq!(report.instances.len(), 2);
    assert!(!report.is_clean());

    options.afdko.release = true;
    let strict = RecordingRunner::new(2);
    assert!(write_ufos_with_runner(&fixture(), &options, &strict).is_err());
    Ok(())
}

#[test]
fn designspace_export_describes_the_masters() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut options = options(dir.path());
    options.designspace = DesignspaceOptions {
        export: true,
        default_location: vec![0.0],
    };
    let report = write_ufos(&fixture(), &options)?;

    let path: PathBuf = report.designspace.expect("designspace path");
    let xml = fs::read_to_string(&path)?;
    assert!(xml.contains("<designspace format=\"4.1\">"));
    assert!(xml.contains("filename=\"TestSans-Light.ufo\""));
    assert!(xml.contains("filename=\"TestSans-Bold.ufo\""));
    assert!(xml.contains("tag=\"wght\""));
    Ok(())
}

#[test]
fn designspace_default_off_master_fails_with_no_output() {
    let parent = tempfile::tempdir().unwrap();
    let dir = parent.path().join("out");
    let mut options = options(&dir);
    options.designspace = DesignspaceOptions {
        export: true,
        default_location: vec![500.0],
    };

    assert!(write_ufos(&fixture(), &options).is_err());
    assert!(!dir.exists());
}

#[test]
fn explicit_instances_stay_out_of_the_sources() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut options = options(dir.path());
    options.instances = InstanceOptions {
        values: vec![vec![0.0].into(), vec![400.0].into(), vec![1000.0].into()],
        names: vec![
            vec!["Light".to_string()],
            vec!["Regular".to_string()],
            vec!["Bold".to_string()],
        ],
        ..Default::default()
    };
    options.designspace = DesignspaceOptions { export: true, default_location: vec![0.0] };
    let report = write_ufos(&fixture(), &options)?;

    // The masters are on disk; interpolated instances are document entries.
    assert_eq!(report.instances.len(), 2);
    assert!(dir.path().join("TestSans-Light.ufo").exists());
    assert!(dir.path().join("TestSans-Bold.ufo").exists());
    assert!(!dir.path().join("TestSans-Regular.ufo").exists());

    let xml = fs::read_to_string(report.designspace.expect("designspace path"))?;
    assert_eq!(xml.matches("<source ").count(), 2);
    assert_eq!(xml.matches("<instance ").count(), 3);
    assert!(xml.contains("<instance filename=\"TestSans-Regular.ufo\""));
    Ok(())
}

#[test]
fn omitted_glyphs_leave_groups_and_features() -> Result<()> {
    let mut model = fixture();
    model.insert_glyph(glyph("Agrave", 600.0, Some(0xC0)));
    model.kern_classes[0] = RawClass::new("A_l", ["A", "Agrave"], Some("A"));

    let dir = tempfile::tempdir()?;
    let mut options = options(dir.path());
    options.glyphs = GlyphOptions {
        omit_names: vec!["Agrave".to_string()],
        ..Default::default()
    };
    write_ufos(&model, &options)?;

    let groups = fs::read_to_string(dir.path().join("TestSans-Light.ufo/groups.plist"))?;
    assert!(!groups.contains("Agrave"));
    assert!(groups.contains("<string>A</string>"));

    let fea = fs::read_to_string(dir.path().join("TestSans-Light.ufo/features.fea"))?;
    assert!(fea.contains("@public.kern1.A = [A];"));
    assert!(!fea.contains("Agrave"));
    Ok(())
}

#[test]
fn fully_omitted_group_is_dropped_everywhere() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut options = options(dir.path());
    options.glyphs = GlyphOptions {
        omit_names: vec!["V".to_string()],
        ..Default::default()
    };
    let report = write_ufos(&fixture(), &options)?;
    assert!(!report.is_clean());

    let groups = fs::read_to_string(dir.path().join("TestSans-Light.ufo/groups.plist"))?;
    assert!(!groups.contains("public.kern2.V"));

    // Both pairs referenced V, so no kerning survives.
    assert!(!dir.path().join("TestSans-Light.ufo/kerning.plist").exists());
    let fea = fs::read_to_string(dir.path().join("TestSans-Light.ufo/features.fea"))?;
    assert!(!fea.contains("public.kern2.V"));
    Ok(())
}

#[test]
fn class_file_export_mirrors_the_groups() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut options = options(dir.path());
    options.groups = GroupOptions { export_flc: true, ..Default::default() };
    write_ufos(&fixture(), &options)?;

    let flc = fs::read_to_string(dir.path().join("TestSans.flc"))?;
    assert!(flc.starts_with("%%FONTLAB CLASSES"));
    assert!(flc.contains("%%CLASS public.kern1.A"));
    assert!(flc.contains("%%GLYPHS A'"));
    assert!(flc.contains("%%KERNING: R 0"));
    Ok(())
}

#[test]
fn auto_scaling_rescales_outlines_and_kerning() -> Result<()> {
    let mut model = fixture();
    model.upm = 2048.0;
    let dir = tempfile::tempdir()?;
    let mut options = options(dir.path());
    options.scale.auto = true;

    write_ufos(&model, &options)?;
    let fontinfo = fs::read_to_string(dir.path().join("TestSans-Light.ufo/fontinfo.plist"))?;
    assert!(fontinfo.contains("<key>unitsPerEm</key>"));
    assert!(fontinfo.contains("<integer>1000</integer>"));
    let kerning = fs::read_to_string(dir.path().join("TestSans-Light.ufo/kerning.plist"))?;
    // -120 * 1000/2048
    assert!(kerning.contains("-58.59375"));
    Ok(())
}
