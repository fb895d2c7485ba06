use clap::ValueEnum;
use palette::{Hsl, IntoColor, Srgb, named};

use crate::data::histogram::ConditionCounts;

/// 8-bit sRGB colour as used in the chart.
pub type Rgb8 = Srgb<u8>;

/// How bars are coloured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum BarColors {
    /// Alternate sky blue and light coral.
    #[default]
    Classic,
    /// One evenly spaced hue per condition.
    Hues,
}

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Rgb8> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Srgb::new(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

/// `n` colours cycling through sky blue and light coral.
pub fn classic_palette(n: usize) -> Vec<Rgb8> {
    [named::SKYBLUE, named::LIGHTCORAL]
        .into_iter()
        .cycle()
        .take(n)
        .collect()
}

/// `#rrggbb` form for SVG attributes.
pub fn to_hex(c: Rgb8) -> String {
    format!("#{:02x}{:02x}{:02x}", c.red, c.green, c.blue)
}

// ---------------------------------------------------------------------------
// Color mapping: condition → colour
// ---------------------------------------------------------------------------

/// Bar colours for a histogram, in the histogram's display order.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: Vec<(String, Rgb8)>,
    default_color: Rgb8,
}

impl ColorMap {
    pub fn new(counts: &ConditionCounts, scheme: BarColors) -> Self {
        let palette = match scheme {
            BarColors::Classic => classic_palette(counts.len()),
            BarColors::Hues => generate_palette(counts.len()),
        };
        let mapping = counts
            .entries()
            .iter()
            .zip(palette)
            .map(|((condition, _), c)| (condition.clone(), c))
            .collect();

        ColorMap {
            mapping,
            default_color: named::GRAY,
        }
    }

    /// Look up the colour for a given condition.
    pub fn color_for(&self, condition: &str) -> Rgb8 {
        self.mapping
            .iter()
            .find(|(c, _)| c == condition)
            .map(|(_, color)| *color)
            .unwrap_or(self.default_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classic_alternates_two_colours() {
        let p = classic_palette(3);
        assert_eq!(p, vec![named::SKYBLUE, named::LIGHTCORAL, named::SKYBLUE]);
        assert_eq!(to_hex(p[0]), "#87ceeb");
        assert_eq!(to_hex(p[1]), "#f08080");
    }

    #[test]
    fn hues_are_distinct() {
        let p = generate_palette(4);
        assert_eq!(p.len(), 4);
        for (i, a) in p.iter().enumerate() {
            for b in &p[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert!(generate_palette(0).is_empty());
    }

    #[test]
    fn unknown_condition_falls_back_to_gray() {
        let map = ColorMap::new(&ConditionCounts::default(), BarColors::Classic);
        assert_eq!(map.color_for("treated"), named::GRAY);
    }
}
