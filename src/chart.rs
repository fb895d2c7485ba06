//! Bar chart of samples per condition.
//!
//! The chart is laid out as an SVG document in a 1000 × 600 unit canvas
//! (10 × 6 inches at 100 units per inch), rasterised with `resvg` at the
//! requested DPI and written as PNG.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::{ImageFormat, RgbaImage};
use resvg::tiny_skia::{self, Pixmap};
use resvg::usvg::{Options, Tree};

use crate::color::{BarColors, ColorMap, to_hex};
use crate::data::histogram::ConditionCounts;

/// File written inside the output directory.
pub const CHART_FILE_NAME: &str = "sample_distribution.png";

const WIDTH: f32 = 1000.0;
const HEIGHT: f32 = 600.0;
const UNITS_PER_INCH: f32 = 100.0;
const FONT_FAMILY: &str = "DejaVu Sans, Liberation Sans, Arial, Helvetica, sans-serif";

/// Rendering knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartOptions {
    /// Output resolution; the canvas is 10 × 6 inches.
    pub dpi: u32,
    pub colors: BarColors,
    /// Extra font file used before system fonts.
    pub font: Option<PathBuf>,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            dpi: 300,
            colors: BarColors::Classic,
            font: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Draw `counts` and write `<output_dir>/sample_distribution.png`.
///
/// Creates `output_dir` (and parents) if needed; an existing chart is
/// overwritten. Returns the path written.
pub fn render_distribution_chart(
    counts: &ConditionCounts,
    output_dir: &Path,
    options: &ChartOptions,
) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("creating output directory {}", output_dir.display()))?;

    let colors = ColorMap::new(counts, options.colors);
    let svg = chart_svg(counts, &colors);
    let image = rasterize(&svg, options)?;

    let path = output_dir.join(CHART_FILE_NAME);
    image
        .save_with_format(&path, ImageFormat::Png)
        .with_context(|| format!("writing {}", path.display()))?;
    log::info!(
        "wrote {} ({}x{} px, {} bars)",
        path.display(),
        image.width(),
        image.height(),
        counts.len()
    );
    Ok(path)
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// Tick step on a 1/2/5 × 10ⁿ ladder giving at most about six intervals.
fn nice_step(max: usize) -> usize {
    let raw = max.div_ceil(6).max(1);
    let mut magnitude = 1;
    while magnitude * 10 <= raw {
        magnitude *= 10;
    }
    [1, 2, 5, 10]
        .into_iter()
        .map(|m| m * magnitude)
        .find(|step| *step >= raw)
        .unwrap_or(10 * magnitude)
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

/// Build the SVG document for the histogram.
pub fn chart_svg(counts: &ConditionCounts, colors: &ColorMap) -> String {
    let longest_label = counts
        .entries()
        .iter()
        .map(|(c, _)| c.chars().count())
        .max()
        .unwrap_or(0) as f32;
    // Tick labels are rotated 45°, so their drop grows with their length.
    let label_drop = (longest_label * 13.0 * 0.6 * std::f32::consts::FRAC_1_SQRT_2).min(220.0);

    let left = 80.0;
    let right = WIDTH - 30.0;
    let top = 60.0;
    let bottom = HEIGHT - (label_drop + 70.0);
    let plot_w = right - left;
    let plot_h = bottom - top;
    log::debug!("plot area {plot_w:.0}x{plot_h:.0}, label drop {label_drop:.0}");

    let step = nice_step(counts.max_count());
    let y_max = counts.max_count().div_ceil(step).max(1) * step;
    let y_of = |v: usize| bottom - plot_h * v as f32 / y_max as f32;

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}" font-family="{FONT_FAMILY}">"#
    );
    let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);
    let _ = writeln!(
        svg,
        r#"<text x="{}" y="{}" font-size="18" text-anchor="middle">Sample Distribution by Condition</text>"#,
        left + plot_w / 2.0,
        top - 20.0
    );

    // Y ticks
    for tick in (0..=y_max).step_by(step) {
        let y = y_of(tick);
        let _ = writeln!(
            svg,
            r#"<line x1="{}" y1="{y}" x2="{left}" y2="{y}" stroke="black"/>"#,
            left - 5.0
        );
        let _ = writeln!(
            svg,
            r#"<text x="{}" y="{}" font-size="13" text-anchor="end">{tick}</text>"#,
            left - 8.0,
            y + 4.5
        );
    }

    // Bars and rotated x tick labels
    let n = counts.len().max(1) as f32;
    let slot = plot_w / n;
    for (i, (condition, count)) in counts.entries().iter().enumerate() {
        let cx = left + slot * (i as f32 + 0.5);
        let bar_w = slot * 0.5;
        let y = y_of(*count);
        let _ = writeln!(
            svg,
            r#"<rect x="{}" y="{y}" width="{bar_w}" height="{}" fill="{}"/>"#,
            cx - bar_w / 2.0,
            bottom - y,
            to_hex(colors.color_for(condition))
        );
        let _ = writeln!(
            svg,
            r#"<line x1="{cx}" y1="{bottom}" x2="{cx}" y2="{}" stroke="black"/>"#,
            bottom + 5.0
        );
        let ly = bottom + 14.0;
        let _ = writeln!(
            svg,
            r#"<text x="{cx}" y="{ly}" font-size="13" text-anchor="end" transform="rotate(-45 {cx} {ly})">{}</text>"#,
            escape(condition)
        );
    }

    // Frame and axis labels
    let _ = writeln!(
        svg,
        r#"<rect x="{left}" y="{top}" width="{plot_w}" height="{plot_h}" fill="none" stroke="black"/>"#
    );
    let _ = writeln!(
        svg,
        r#"<text x="{}" y="{}" font-size="15" text-anchor="middle">Condition</text>"#,
        left + plot_w / 2.0,
        HEIGHT - 15.0
    );
    let _ = writeln!(
        svg,
        r#"<text x="25" y="{mid}" font-size="15" text-anchor="middle" transform="rotate(-90 25 {mid})">Number of Samples</text>"#,
        mid = top + plot_h / 2.0
    );
    svg.push_str("</svg>\n");
    svg
}

// ---------------------------------------------------------------------------
// Rasterisation
// ---------------------------------------------------------------------------

fn rasterize(svg: &str, options: &ChartOptions) -> Result<RgbaImage> {
    let mut svg_options = Options::default();
    let fontdb = svg_options.fontdb_mut();
    fontdb.load_system_fonts();
    if let Some(font) = &options.font {
        let before = fontdb.len();
        match fontdb.load_font_file(font) {
            Ok(()) => {
                let family = fontdb
                    .faces()
                    .nth(before)
                    .and_then(|face| face.families.first())
                    .map(|(name, _)| name.clone());
                if let Some(family) = family {
                    log::debug!("using font family '{family}' from {}", font.display());
                    fontdb.set_sans_serif_family(family);
                }
            }
            Err(e) => log::warn!("could not load font {}: {e}", font.display()),
        }
    }
    if fontdb.is_empty() {
        log::warn!("no fonts available; chart text will not be drawn");
    }

    let tree = Tree::from_str(svg, &svg_options).context("parsing chart SVG")?;

    let scale = options.dpi as f32 / UNITS_PER_INCH;
    let width = (tree.size().width() * scale).round() as u32;
    let height = (tree.size().height() * scale).round() as u32;
    let mut pixmap = Pixmap::new(width, height)
        .with_context(|| format!("allocating {width}x{height} chart (dpi {})", options.dpi))?;
    pixmap.fill(tiny_skia::Color::WHITE);

    let transform = tiny_skia::Transform::from_scale(scale, scale);
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    // Opaque background, so premultiplied and straight alpha coincide.
    RgbaImage::from_raw(width, height, pixmap.take()).context("building chart image buffer")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::histogram::build_condition_histogram;
    use crate::data::model::{MetadataValue, SampleTable};
    use std::collections::BTreeMap;

    fn counts(conditions: &[&str]) -> ConditionCounts {
        let columns = vec!["sample_id".into(), "condition".into(), "replicate".into()];
        let rows = conditions
            .iter()
            .enumerate()
            .map(|(i, c)| {
                BTreeMap::from([
                    ("sample_id".to_string(), MetadataValue::Integer(i as i64)),
                    ("condition".to_string(), MetadataValue::String(c.to_string())),
                    ("replicate".to_string(), MetadataValue::Integer(1)),
                ])
            })
            .collect();
        build_condition_histogram(&SampleTable::from_rows(columns, rows).unwrap())
    }

    fn small() -> ChartOptions {
        ChartOptions {
            dpi: 20,
            ..ChartOptions::default()
        }
    }

    #[test]
    fn nice_steps() {
        assert_eq!(nice_step(0), 1);
        assert_eq!(nice_step(4), 1);
        assert_eq!(nice_step(7), 2);
        assert_eq!(nice_step(25), 5);
        assert_eq!(nice_step(100), 20);
        assert_eq!(nice_step(1000), 200);
    }

    #[test]
    fn svg_has_one_bar_per_condition_and_escaped_labels() {
        let c = counts(&["treated", "a<b", "treated"]);
        let svg = chart_svg(&c, &ColorMap::new(&c, BarColors::Classic));
        assert!(svg.contains("Sample Distribution by Condition"));
        assert!(svg.contains("Number of Samples"));
        assert!(svg.contains(">a&lt;b</text>"));
        assert!(svg.contains(r##"fill="#87ceeb""##));
        assert!(svg.contains(r##"fill="#f08080""##));
    }

    #[test]
    fn renders_png_at_requested_dpi() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("results");
        let path = render_distribution_chart(&counts(&["treated", "control"]), &out, &small())
            .unwrap();

        assert_eq!(path, out.join(CHART_FILE_NAME));
        let img = image::open(&path).unwrap();
        assert_eq!((img.width(), img.height()), (200, 120));
    }

    #[test]
    fn rendering_twice_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let c = counts(&["treated", "treated", "control"]);
        let first = render_distribution_chart(&c, dir.path(), &small()).unwrap();
        let second = render_distribution_chart(&c, dir.path(), &small()).unwrap();
        assert_eq!(first, second);
        assert!(second.is_file());
    }

    #[test]
    fn empty_histogram_still_renders() {
        let dir = tempfile::tempdir().unwrap();
        let path = render_distribution_chart(&counts(&[]), dir.path(), &small()).unwrap();
        assert!(path.is_file());
    }

    #[test]
    fn unwritable_output_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, b"x").unwrap();
        assert!(render_distribution_chart(&counts(&["a"]), &blocker.join("sub"), &small()).is_err());
    }
}
