//! Drawing and blueprint export: SVG text, PNG raster, JSON.
//!
//! SVG keeps every element's `id` and tag (`data-tag`) so downstream tools
//! can select by either. PNG is the same SVG document rendered by resvg, so
//! labels, dash patterns and opacity match the vector output.

use std::fmt::{self, Write as _};
use std::path::Path;
use std::sync::{Arc, OnceLock};

use resvg::{tiny_skia, usvg};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::Blueprint;
use crate::projection::{Drawing, Element, Shape};

/// Largest raster side, in pixels.
pub const MAX_CANVAS_PX: u32 = 16_384;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Svg,
    Png,
    Json,
}

impl ExportFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ExportFormat::Svg => "svg",
            ExportFormat::Png => "png",
            ExportFormat::Json => "json",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "svg" => Some(ExportFormat::Svg),
            "png" => Some(ExportFormat::Png),
            "json" => Some(ExportFormat::Json),
            _ => None,
        }
    }

    /// Format implied by a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension().and_then(|e| e.to_str()).and_then(Self::parse)
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("svg rendering failed: {0}")]
    Render(#[from] usvg::Error),
    #[error("png encoding failed: {0}")]
    Png(String),
    #[error("json encoding failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cannot export a {target} as {format}")]
    UnsupportedFormat {
        format: ExportFormat,
        target: &'static str,
    },
    #[error("canvas {width}x{height} px is outside 1..=16384 per side")]
    CanvasSize { width: f64, height: f64 },
}

/// What to write: a projected drawing or the blueprint itself.
#[derive(Debug, Clone, Copy)]
pub enum ExportTarget<'a> {
    Drawing(&'a Drawing),
    Blueprint(&'a Blueprint),
}

impl ExportTarget<'_> {
    fn name(&self) -> &'static str {
        match self {
            ExportTarget::Drawing(_) => "drawing",
            ExportTarget::Blueprint(_) => "blueprint",
        }
    }
}

// ---------------------------------------------------------------------------
// SVG
// ---------------------------------------------------------------------------

fn svg_escape_into(out: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

/// Compact number: at most two decimals, trailing zeros dropped.
fn num(v: f64) -> String {
    let s = format!("{v:.2}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

fn write_attr(out: &mut String, name: &str, value: &str) {
    let _ = write!(out, " {name}=\"");
    svg_escape_into(out, value);
    out.push('"');
}

fn write_style(out: &mut String, element: &Element) {
    let style = &element.style;
    write_attr(out, "fill", style.fill.as_deref().unwrap_or("none"));
    if let Some(stroke) = &style.stroke {
        write_attr(out, "stroke", stroke);
        let _ = write!(out, " stroke-width=\"{}\"", num(style.stroke_width));
    }
    if let Some(dash) = &style.dash {
        write_attr(out, "stroke-dasharray", dash);
    }
    if style.opacity < 1.0 {
        let _ = write!(out, " opacity=\"{}\"", num(style.opacity));
    }
}

/// Render a drawing as a standalone SVG document.
pub fn to_svg(drawing: &Drawing) -> String {
    let mut out = String::with_capacity(drawing.elements.len() * 128 + 256);
    let (w, h) = (num(drawing.width), num(drawing.height));
    let _ = writeln!(
        out,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">"
    );
    out.push_str("<rect width=\"100%\" height=\"100%\" fill=\"#ffffff\"/>\n");

    for element in &drawing.elements {
        let name = match element.shape {
            Shape::Rect { .. } => "rect",
            Shape::Line { .. } => "line",
            Shape::Circle { .. } => "circle",
            Shape::Text { .. } => "text",
        };
        let _ = write!(out, "<{name}");
        write_attr(&mut out, "id", &element.id);
        write_attr(&mut out, "data-tag", element.tag.as_str());
        match &element.shape {
            Shape::Rect {
                x,
                y,
                width,
                height,
            } => {
                let _ = write!(
                    out,
                    " x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\"",
                    num(*x),
                    num(*y),
                    num(*width),
                    num(*height)
                );
            }
            Shape::Line { x1, y1, x2, y2 } => {
                let _ = write!(
                    out,
                    " x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\"",
                    num(*x1),
                    num(*y1),
                    num(*x2),
                    num(*y2)
                );
            }
            Shape::Circle { cx, cy, r } => {
                let _ = write!(
                    out,
                    " cx=\"{}\" cy=\"{}\" r=\"{}\"",
                    num(*cx),
                    num(*cy),
                    num(*r)
                );
            }
            Shape::Text { x, y, size, .. } => {
                let _ = write!(
                    out,
                    " x=\"{}\" y=\"{}\" font-size=\"{}\" font-family=\"sans-serif\"",
                    num(*x),
                    num(*y),
                    num(*size)
                );
            }
        }
        write_style(&mut out, element);
        match &element.shape {
            Shape::Text { text, .. } => {
                out.push('>');
                svg_escape_into(&mut out, text);
                out.push_str("</text>\n");
            }
            _ => out.push_str("/>\n"),
        }
    }

    out.push_str("</svg>\n");
    out
}

// ---------------------------------------------------------------------------
// PNG
// ---------------------------------------------------------------------------

/// System fonts, loaded once per process.
///
/// Labels ask for `sans-serif`; when the platform default for that family
/// is not installed it is remapped to an installed sans face.
fn font_database() -> Arc<usvg::fontdb::Database> {
    static FONTS: OnceLock<Arc<usvg::fontdb::Database>> = OnceLock::new();
    FONTS
        .get_or_init(|| {
            let mut db = usvg::fontdb::Database::new();
            db.load_system_fonts();
            let query = usvg::fontdb::Query {
                families: &[usvg::fontdb::Family::SansSerif],
                ..Default::default()
            };
            if db.query(&query).is_none() {
                let names: Vec<String> = db
                    .faces()
                    .filter_map(|face| face.families.first().map(|(name, _)| name.clone()))
                    .collect();
                let fallback = names
                    .iter()
                    .find(|name| name.contains("Sans"))
                    .or_else(|| names.first())
                    .cloned();
                if let Some(name) = fallback {
                    db.set_sans_serif_family(name);
                }
            }
            if db.is_empty() {
                log::warn!("export: no system fonts found, PNG labels will be blank");
            }
            Arc::new(db)
        })
        .clone()
}

/// Render a drawing to PNG by rasterizing its SVG form.
pub fn to_png(drawing: &Drawing) -> Result<Vec<u8>, ExportError> {
    let (w, h) = (drawing.width.ceil(), drawing.height.ceil());
    let max = MAX_CANVAS_PX as f64;
    let canvas_error = || ExportError::CanvasSize {
        width: drawing.width,
        height: drawing.height,
    };
    if !(w >= 1.0 && h >= 1.0 && w <= max && h <= max) {
        return Err(canvas_error());
    }

    let options = usvg::Options {
        fontdb: font_database(),
        ..usvg::Options::default()
    };
    let tree = usvg::Tree::from_str(&to_svg(drawing), &options)?;
    let mut pixmap = tiny_skia::Pixmap::new(w as u32, h as u32).ok_or_else(canvas_error)?;
    resvg::render(&tree, tiny_skia::Transform::identity(), &mut pixmap.as_mut());
    log::debug!(
        "export: rasterized {} elements onto {}x{} px",
        drawing.elements.len(),
        pixmap.width(),
        pixmap.height()
    );
    pixmap
        .encode_png()
        .map_err(|e| ExportError::Png(e.to_string()))
}

// ---------------------------------------------------------------------------
// JSON and files
// ---------------------------------------------------------------------------

pub fn to_json(blueprint: &Blueprint) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(blueprint)?)
}

/// Write `target` to `path` in `format`.
///
/// Drawings export to any format; blueprints only to JSON.
pub fn export_to_file(
    target: ExportTarget<'_>,
    path: &Path,
    format: ExportFormat,
) -> Result<(), ExportError> {
    let bytes = match (format, target) {
        (ExportFormat::Svg, ExportTarget::Drawing(d)) => to_svg(d).into_bytes(),
        (ExportFormat::Png, ExportTarget::Drawing(d)) => to_png(d)?,
        (ExportFormat::Json, ExportTarget::Drawing(d)) => serde_json::to_vec_pretty(d)?,
        (ExportFormat::Json, ExportTarget::Blueprint(b)) => to_json(b)?.into_bytes(),
        (format, target) => {
            return Err(ExportError::UnsupportedFormat {
                format,
                target: target.name(),
            })
        }
    };
    std::fs::write(path, &bytes)?;
    log::info!(
        "export: wrote {} ({} bytes, {format})",
        path.display(),
        bytes.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::ProceduralLayout;
    use crate::model::BuildingType;
    use crate::projection::{project, ComponentFilter, ElementTag, ProjectionConfig, ViewRequest};

    fn sample_drawing() -> Drawing {
        let floors = ProceduralLayout.floors(40.0, 30.0, 1, BuildingType::House);
        let bp = Blueprint::new(40.0, 30.0, BuildingType::House, floors);
        project(
            &bp,
            &ViewRequest::new(ComponentFilter::Floors),
            &ProjectionConfig::default(),
        )
    }

    fn decode(bytes: &[u8]) -> (u32, u32, Vec<u8>) {
        let decoder = png::Decoder::new(bytes);
        let mut reader = decoder.read_info().unwrap();
        let mut buf = vec![0; reader.output_buffer_size()];
        let info = reader.next_frame(&mut buf).unwrap();
        buf.truncate(info.buffer_size());
        (info.width, info.height, buf)
    }

    const WHITE: [u8; 4] = [255, 255, 255, 255];

    fn pixel(rgba: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * width + x) * 4) as usize;
        [rgba[i], rgba[i + 1], rgba[i + 2], rgba[i + 3]]
    }

    fn single(shape: Shape, fill: Option<&str>, stroke: Option<&str>) -> Drawing {
        let mut d = Drawing::new(20.0, 20.0);
        d.elements.push(Element {
            id: "e".into(),
            tag: ElementTag::Room,
            shape,
            style: crate::projection::Style {
                fill: fill.map(str::to_string),
                stroke: stroke.map(str::to_string),
                stroke_width: 1.0,
                opacity: 1.0,
                dash: None,
            },
        });
        d
    }

    #[test]
    fn test_format_parse() {
        assert_eq!(ExportFormat::parse("SVG"), Some(ExportFormat::Svg));
        assert_eq!(ExportFormat::parse("pdf"), None);
        assert_eq!(
            ExportFormat::from_path(Path::new("out/plan.png")),
            Some(ExportFormat::Png)
        );
        assert_eq!(ExportFormat::from_path(Path::new("plan")), None);
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(num(40.0), "40");
        assert_eq!(num(13.25), "13.25");
        assert_eq!(num(1.5), "1.5");
        assert_eq!(num(-0.001), "0");
    }

    #[test]
    fn test_svg_carries_ids_and_tags() {
        let d = sample_drawing();
        let svg = to_svg(&d);
        assert!(svg.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\""));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(svg.contains("id=\"f0-living\" data-tag=\"room\""));
        assert!(svg.contains("data-tag=\"floor_outline\""));
        // one line per element plus header, background and footer
        assert_eq!(svg.lines().count(), d.elements.len() + 3);
    }

    #[test]
    fn test_svg_escapes_text() {
        let mut d = Drawing::new(10.0, 10.0);
        d.elements.push(Element {
            id: "t".into(),
            tag: ElementTag::Label,
            shape: Shape::Text {
                x: 1.0,
                y: 1.0,
                text: "Bed & <Bath>".into(),
                size: 10.0,
            },
            style: crate::projection::Style::stroked("#000000", 1.0),
        });
        let svg = to_svg(&d);
        assert!(svg.contains(">Bed &amp; &lt;Bath&gt;</text>"));
    }

    #[test]
    fn test_png_fills_rect() {
        let d = single(
            Shape::Rect {
                x: 5.0,
                y: 5.0,
                width: 10.0,
                height: 10.0,
            },
            Some("#ff0000"),
            None,
        );
        let (w, h, rgba) = decode(&to_png(&d).unwrap());
        assert_eq!((w, h), (20, 20));
        assert_eq!(pixel(&rgba, w, 10, 10), [255, 0, 0, 255]);
        assert_eq!(pixel(&rgba, w, 2, 2), WHITE);
        assert_eq!(pixel(&rgba, w, 15, 15), WHITE);
    }

    #[test]
    fn test_png_draws_line_and_circle() {
        let mut d = single(
            Shape::Line {
                x1: 0.0,
                y1: 3.5,
                x2: 20.0,
                y2: 3.5,
            },
            None,
            Some("#0000ff"),
        );
        d.elements[0].style.stroke_width = 3.0;
        let (w, _, rgba) = decode(&to_png(&d).unwrap());
        for x in 1..19 {
            assert_eq!(pixel(&rgba, w, x, 3), [0, 0, 255, 255], "x = {x}");
        }
        assert_eq!(pixel(&rgba, w, 5, 8), WHITE);

        let d = single(
            Shape::Circle {
                cx: 10.0,
                cy: 10.0,
                r: 4.0,
            },
            Some("#00ff00"),
            None,
        );
        let (w, _, rgba) = decode(&to_png(&d).unwrap());
        assert_eq!(pixel(&rgba, w, 10, 10), [0, 255, 0, 255]);
        assert_eq!(pixel(&rgba, w, 1, 1), WHITE);
    }

    #[test]
    fn test_png_keeps_dash_gaps() {
        let mut d = single(
            Shape::Line {
                x1: 0.0,
                y1: 10.5,
                x2: 20.0,
                y2: 10.5,
            },
            None,
            Some("#000000"),
        );
        d.elements[0].style.stroke_width = 3.0;
        d.elements[0].style.dash = Some("6 4".into());
        let (w, _, rgba) = decode(&to_png(&d).unwrap());
        // dashes cover [0,6) and [10,16)
        assert_eq!(pixel(&rgba, w, 2, 10), [0, 0, 0, 255]);
        assert_eq!(pixel(&rgba, w, 8, 10), WHITE);
        assert_eq!(pixel(&rgba, w, 12, 10), [0, 0, 0, 255]);
        assert_eq!(pixel(&rgba, w, 18, 10), WHITE);
    }

    #[test]
    fn test_png_opacity_blends() {
        let mut d = single(
            Shape::Rect {
                x: 0.0,
                y: 0.0,
                width: 20.0,
                height: 20.0,
            },
            Some("#000000"),
            None,
        );
        d.elements[0].style.opacity = 0.5;
        let (w, _, rgba) = decode(&to_png(&d).unwrap());
        let [r, g, b, a] = pixel(&rgba, w, 10, 10);
        assert!((126..=129).contains(&r), "{r}");
        assert_eq!((r, g, b, a), (r, r, r, 255));
    }

    #[test]
    fn test_png_clips_oversized_shapes() {
        let d = single(
            Shape::Rect {
                x: -1.0e7,
                y: -1.0e7,
                width: 2.0e7,
                height: 2.0e7,
            },
            Some("#ff0000"),
            None,
        );
        let (w, _, rgba) = decode(&to_png(&d).unwrap());
        assert_eq!(pixel(&rgba, w, 0, 0), [255, 0, 0, 255]);
        assert_eq!(pixel(&rgba, w, 19, 19), [255, 0, 0, 255]);
    }

    #[test]
    fn test_png_draws_labels() {
        if font_database().is_empty() {
            // no system fonts: text has nothing to render with
            return;
        }
        let mut d = Drawing::new(200.0, 60.0);
        d.elements.push(Element {
            id: "hall-label".into(),
            tag: ElementTag::Label,
            shape: Shape::Text {
                x: 10.0,
                y: 50.0,
                text: "HALL".into(),
                size: 40.0,
            },
            style: crate::projection::Style::filled("#000000", "#000000"),
        });
        let (w, _, rgba) = decode(&to_png(&d).unwrap());
        let inked = (20..50)
            .flat_map(|y| (10..150).map(move |x| (x, y)))
            .filter(|&(x, y)| pixel(&rgba, w, x, y)[0] < 100)
            .count();
        assert!(inked > 50, "only {inked} dark pixels under the label");
    }

    #[test]
    fn test_png_of_plan_changes_with_labels() {
        if font_database().is_empty() {
            return;
        }
        let floors = ProceduralLayout.floors(60.0, 40.0, 3, BuildingType::Apartment);
        let bp = Blueprint::new(60.0, 40.0, BuildingType::Apartment, floors);
        let d = project(
            &bp,
            &ViewRequest::new(ComponentFilter::All),
            &ProjectionConfig::default(),
        );
        let mut unlabelled = d.clone();
        unlabelled
            .elements
            .retain(|e| !matches!(e.shape, Shape::Text { .. }));
        assert!(unlabelled.elements.len() < d.elements.len());
        assert_ne!(to_png(&d).unwrap(), to_png(&unlabelled).unwrap());
    }

    #[test]
    fn test_png_rejects_bad_canvas() {
        assert!(matches!(
            to_png(&Drawing::new(0.0, 10.0)),
            Err(ExportError::CanvasSize { .. })
        ));
        assert!(matches!(
            to_png(&Drawing::new(100_000.0, 10.0)),
            Err(ExportError::CanvasSize { .. })
        ));
    }

    #[test]
    fn test_png_of_projected_plan() {
        let d = sample_drawing();
        let (w, h, _) = decode(&to_png(&d).unwrap());
        assert_eq!((w as f64, h as f64), (d.width.ceil(), d.height.ceil()));
    }

    #[test]
    fn test_export_to_file() {
        let dir = std::env::temp_dir().join(format!("plangen-export-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let floors = ProceduralLayout.floors(40.0, 30.0, 1, BuildingType::House);
        let bp = Blueprint::new(40.0, 30.0, BuildingType::House, floors);
        let d = sample_drawing();

        let json = dir.join("plan.json");
        export_to_file(ExportTarget::Blueprint(&bp), &json, ExportFormat::Json).unwrap();
        let back: Blueprint =
            serde_json::from_str(&std::fs::read_to_string(&json).unwrap()).unwrap();
        assert_eq!(back.room_count(), bp.room_count());
        assert_eq!(back.overview, bp.overview);
        assert_eq!(back.water_tanks, bp.water_tanks);

        let svg = dir.join("plan.svg");
        export_to_file(ExportTarget::Drawing(&d), &svg, ExportFormat::Svg).unwrap();
        assert!(std::fs::read_to_string(&svg).unwrap().contains("<svg"));

        let err = export_to_file(ExportTarget::Blueprint(&bp), &svg, ExportFormat::Png);
        assert!(matches!(
            err,
            Err(ExportError::UnsupportedFormat {
                format: ExportFormat::Png,
                target: "blueprint"
            })
        ));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
