//! `.glif` (UFO glyph) XML writing.
//!
//! The glyph interchange format is simple attribute XML; it is assembled
//! directly so the output is byte-stable across runs. Coordinates keep full
//! float precision — integral values print without a decimal point,
//! everything else with the shortest round-trip representation.

use std::collections::HashSet;
use std::fmt::Write;

use crate::model::Glyph;

/// Format a coordinate or metric value for XML output.
pub fn fmt_number(value: f64) -> String {
    // -0.0 normalizes to 0 so equal geometry formats identically.
    let value = if value == 0.0 { 0.0 } else { value };
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Serialize one glyph as glif format 2 (UFO 3).
pub fn glif_xml(glyph: &Glyph) -> String {
    let mut text = String::with_capacity(256 + glyph.contours.len() * 160);

    let _ = writeln!(text, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>");
    let _ = writeln!(text, "<glyph name=\"{}\" format=\"2\">", escape(&glyph.name));
    let _ = writeln!(text, "\t<advance width=\"{}\"/>", fmt_number(glyph.width));

    for &code_point in &glyph.unicodes {
        if code_point <= 0xffff {
            let _ = writeln!(text, "\t<unicode hex=\"{code_point:04X}\"/>");
        } else {
            let _ = writeln!(text, "\t<unicode hex=\"{code_point:05X}\"/>");
        }
    }

    for anchor in &glyph.anchors {
        let _ = writeln!(
            text,
            "\t<anchor name=\"{}\" x=\"{}\" y=\"{}\"/>",
            escape(&anchor.name),
            fmt_number(anchor.x),
            fmt_number(anchor.y)
        );
    }

    if !glyph.components.is_empty() || !glyph.contours.is_empty() {
        text.push_str("\t<outline>\n");
        for component in &glyph.components {
            let mut attrs = format!("base=\"{}\"", escape(&component.base));
            if component.x_offset != 0.0 || component.y_offset != 0.0 {
                let _ = write!(
                    attrs,
                    " xOffset=\"{}\" yOffset=\"{}\"",
                    fmt_number(component.x_offset),
                    fmt_number(component.y_offset)
                );
            }
            if component.x_scale != 1.0 || component.y_scale != 1.0 {
                let _ = write!(
                    attrs,
                    " xScale=\"{}\" yScale=\"{}\"",
                    fmt_number(component.x_scale),
                    fmt_number(component.y_scale)
                );
            }
            let _ = writeln!(text, "\t\t<component {attrs}/>");
        }
        for contour in &glyph.contours {
            text.push_str("\t\t<contour>\n");
            for point in &contour.points {
                let mut attrs =
                    format!("x=\"{}\" y=\"{}\"", fmt_number(point.x), fmt_number(point.y));
                if let Some(typ) = point.typ.glif_type() {
                    let _ = write!(attrs, " type=\"{typ}\"");
                }
                if point.smooth {
                    attrs.push_str(" smooth=\"yes\"");
                }
                if let Some(name) = &point.name {
                    let _ = write!(attrs, " name=\"{}\"", escape(name));
                }
                let _ = writeln!(text, "\t\t\t<point {attrs}/>");
            }
            text.push_str("\t\t</contour>\n");
        }
        text.push_str("\t</outline>\n");
    }

    if let Some((r, g, b, a)) = glyph.mark_color {
        text.push_str("\t<lib>\n\t\t<dict>\n");
        text.push_str("\t\t\t<key>public.markColor</key>\n");
        let _ = writeln!(
            text,
            "\t\t\t<string>{},{},{},{}</string>",
            fmt_number(r as f64),
            fmt_number(g as f64),
            fmt_number(b as f64),
            fmt_number(a as f64)
        );
        text.push_str("\t\t</dict>\n\t</lib>\n");
    }

    text.push_str("</glyph>\n");
    text
}

/// Convert a glyph name to a `.glif` file name per the UFO conventions:
/// uppercase letters get an underscore suffix, characters that are illegal
/// on common filesystems become underscores, and a leading period is
/// replaced so the file is never hidden.
pub fn glif_file_name(glyph_name: &str, taken: &mut HashSet<String>) -> String {
    const ILLEGAL: &[char] =
        &['"', '*', '+', '/', ':', '<', '>', '?', '[', '\\', ']', '|'];

    let mut stem = String::with_capacity(glyph_name.len() + 4);
    for (i, c) in glyph_name.chars().enumerate() {
        if i == 0 && c == '.' {
            stem.push('_');
        } else if ILLEGAL.contains(&c) || (c as u32) < 0x20 || c as u32 == 0x7f {
            stem.push('_');
        } else if c.is_ascii_uppercase() {
            stem.push(c);
            stem.push('_');
        } else {
            stem.push(c);
        }
    }
    if stem.len() > 250 {
        // Cut on a char boundary; byte 250 may fall inside a multi-byte char.
        let mut end = 250;
        while !stem.is_char_boundary(end) {
            end -= 1;
        }
        stem.truncate(end);
    }

    let mut name = format!("{stem}.glif");
    let mut n = 1usize;
    while !taken.insert(name.to_lowercase()) {
        name = format!("{stem}{n:09}.glif");
        n += 1;
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Anchor, Component, Contour, ContourPoint, Glyph, PointType};

    #[test]
    fn number_formatting() {
        assert_eq!(fmt_number(100.0), "100");
        assert_eq!(fmt_number(-12.0), "-12");
        assert_eq!(fmt_number(12.5), "12.5");
        assert_eq!(fmt_number(-0.0), "0");
        assert_eq!(fmt_number(166.50000000000003), "166.50000000000003");
    }

    #[test]
    fn basic_glyph_serialization() {
        let mut glyph = Glyph::new("A", 600.0);
        glyph.unicodes.push(0x41);
        glyph.anchors.push(Anchor::new("top", 300.0, 700.0));
        glyph.contours.push(Contour {
            points: vec![
                ContourPoint::new(10.0, 0.0, PointType::Move),
                ContourPoint::new(300.0, 700.5, PointType::Line),
                ContourPoint::new(120.0, 340.0, PointType::OffCurve),
                ContourPoint::new(590.0, 0.0, PointType::Curve).smooth(),
            ],
        });

        let expected = "\
<?xml version=\"1.0\" encoding=\"UTF-8\"?>
<glyph name=\"A\" format=\"2\">
\t<advance width=\"600\"/>
\t<unicode hex=\"0041\"/>
\t<anchor name=\"top\" x=\"300\" y=\"700\"/>
\t<outline>
\t\t<contour>
\t\t\t<point x=\"10\" y=\"0\" type=\"move\"/>
\t\t\t<point x=\"300\" y=\"700.5\" type=\"line\"/>
\t\t\t<point x=\"120\" y=\"340\"/>
\t\t\t<point x=\"590\" y=\"0\" type=\"curve\" smooth=\"yes\"/>
\t\t</contour>
\t</outline>
</glyph>
";
        assert_eq!(glif_xml(&glyph), expected);
    }

    #[test]
    fn component_and_supplementary_unicode() {
        let mut glyph = Glyph::new("Agrave", 600.0);
        glyph.unicodes.push(0x1F600);
        glyph.components.push(Component::new("A", 0.0, 0.0));
        glyph.components.push(Component::new("grave", 150.0, 220.0));

        let text = glif_xml(&glyph);
        assert!(text.contains("<unicode hex=\"1F600\"/>"));
        assert!(text.contains("<component base=\"A\"/>"));
        assert!(text.contains("<component base=\"grave\" xOffset=\"150\" yOffset=\"220\"/>"));
    }

    #[test]
    fn mark_color_lands_in_lib() {
        let mut glyph = Glyph::new("dot", 100.0);
        glyph.mark_color = Some((1.0, 0.0, 0.5, 1.0));
        let text = glif_xml(&glyph);
        assert!(text.contains("<key>public.markColor</key>"));
        assert!(text.contains("<string>1,0,0.5,1</string>"));
    }

    #[test]
    fn file_names_follow_ufo_conventions() {
        let mut taken = HashSet::new();
        assert_eq!(glif_file_name("a", &mut taken), "a.glif");
        assert_eq!(glif_file_name("A", &mut taken), "A_.glif");
        assert_eq!(glif_file_name(".notdef", &mut taken), "_notdef.glif");
        assert_eq!(glif_file_name("T_h", &mut taken), "T__h.glif");
        assert_eq!(glif_file_name("a:b", &mut taken), "a_b.glif");
    }

    #[test]
    fn long_file_names_are_trimmed_on_char_boundaries() {
        let mut taken = HashSet::new();
        let name = glif_file_name(&"a".repeat(251), &mut taken);
        assert_eq!(name.len(), 250 + ".glif".len());

        // A multi-byte char straddling the cut point must not split.
        let mut accented = "a".repeat(249);
        accented.push('\u{e9}');
        let name = glif_file_name(&accented, &mut taken);
        assert_eq!(name, format!("{}.glif", "a".repeat(249)));
    }

    #[test]
    fn file_name_clashes_get_numbered() {
        let mut taken = HashSet::new();
        assert_eq!(glif_file_name("A_", &mut taken), "A__.glif");
        // "A_" and "a__" mangle to case-insensitively equal names.
        assert_eq!(glif_file_name("a__", &mut taken), "a__000000001.glif");
    }
}
