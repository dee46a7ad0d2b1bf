//! Horizontal bar chart of an attribution, encoded as PNG.
//!
//! One row per feature in column order:
//!
//! ```text
//!  Age               |████████          +0.124
//!  Sex           ████|                  -0.051
//!  ...
//!  base 0.412  output 0.731     <- low risk | at risk ->
//! ```
//!
//! Bars grow right of the axis for contributions toward "at risk" (red) and
//! left for contributions toward "low risk" (blue). Bar length is relative
//! to the largest absolute contribution in the attribution. Text uses the
//! 8×8 bitmap glyphs from `font8x8`, so rendering needs no system fonts.

use std::io::Cursor;

use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};

use cadrisk_contracts::{
    attribution::Attribution,
    error::{CadError, CadResult},
};
use cadrisk_core::traits::PlotRenderer;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS: Rgb<u8> = Rgb([128, 128, 128]);
const GRID: Rgb<u8> = Rgb([232, 232, 232]);
const TEXT: Rgb<u8> = Rgb([40, 40, 40]);
const POSITIVE: Rgb<u8> = Rgb([255, 0, 81]);
const NEGATIVE: Rgb<u8> = Rgb([0, 139, 251]);

const GLYPH: u32 = 8;
const MAX_LABEL_CHARS: usize = 24;
/// Width of the value column in characters, e.g. `+0.1234`.
const VALUE_CHARS: u32 = 8;
const GAP: u32 = 8;

/// Renders attributions as fixed-layout bar charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarChartRenderer {
    pub width: u32,
    pub row_height: u32,
    pub margin: u32,
    /// Pixel size of one glyph dot for feature names and values.
    pub text_scale: u32,
}

impl Default for BarChartRenderer {
    fn default() -> Self {
        Self {
            width: 800,
            row_height: 36,
            margin: 16,
            text_scale: 2,
        }
    }
}

/// Horizontal extents of the bar area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Columns {
    plot_left: u32,
    plot_right: u32,
    axis: u32,
}

impl BarChartRenderer {
    /// Pixel height of a chart with `rows` features.
    pub fn height_for(&self, rows: usize) -> u32 {
        self.margin * 2 + self.row_height * rows.max(1) as u32 + self.footer_height()
    }

    /// X coordinate of the zero axis for `attribution`.
    pub fn axis_x(&self, attribution: &Attribution) -> u32 {
        self.columns(attribution).axis
    }

    /// Left edge of the bar area; feature names are drawn to its left.
    pub fn plot_left(&self, attribution: &Attribution) -> u32 {
        self.columns(attribution).plot_left
    }

    fn footer_height(&self) -> u32 {
        GLYPH + GAP
    }

    fn columns(&self, attribution: &Attribution) -> Columns {
        let char_width = GLYPH * self.text_scale;
        let label_chars = attribution
            .contributions
            .iter()
            .map(|c| c.feature.chars().count().min(MAX_LABEL_CHARS))
            .max()
            .unwrap_or(0) as u32;

        let plot_left = (self.margin + label_chars * char_width + GAP).min(self.width / 2);
        let plot_right = self
            .width
            .saturating_sub(self.margin + VALUE_CHARS * char_width)
            .max(plot_left + 2);
        Columns {
            plot_left,
            plot_right,
            axis: plot_left + (plot_right - plot_left) / 2,
        }
    }

    /// Draw the chart without encoding it.
    pub fn draw(&self, attribution: &Attribution) -> RgbImage {
        let rows = attribution.contributions.len();
        let height = self.height_for(rows);
        let mut img = RgbImage::from_pixel(self.width, height, BACKGROUND);

        let Columns { plot_left, plot_right, axis } = self.columns(attribution);
        let half_span = (plot_right - axis).min(axis - plot_left).max(1);
        let largest = attribution
            .contributions
            .iter()
            .map(|c| c.contribution.abs())
            .filter(|v| v.is_finite())
            .fold(0.0_f64, f64::max);
        let text_height = GLYPH * self.text_scale;

        for (idx, contribution) in attribution.contributions.iter().enumerate() {
            let top = self.margin + idx as u32 * self.row_height;
            let text_top = top + self.row_height.saturating_sub(text_height) / 2;

            fill(&mut img, self.margin, top, self.width - self.margin, top + 1, GRID);

            let label: String = contribution.feature.chars().take(MAX_LABEL_CHARS).collect();
            draw_text(&mut img, self.margin, text_top, &label, self.text_scale, TEXT);

            let value = if contribution.contribution.is_finite() {
                format!("{:+.4}", contribution.contribution)
            } else {
                "n/a".to_string()
            };
            draw_text(&mut img, plot_right + GAP, text_top, &value, self.text_scale, TEXT);

            if largest <= 0.0 || !contribution.contribution.is_finite() {
                continue;
            }
            let length = ((contribution.contribution.abs() / largest) * half_span as f64).round() as u32;
            if length == 0 {
                continue;
            }
            let pad = self.row_height / 5;
            let (x0, x1, color) = if contribution.contribution > 0.0 {
                (axis, axis + length, POSITIVE)
            } else {
                (axis - length, axis, NEGATIVE)
            };
            fill(&mut img, x0, top + pad, x1, top + self.row_height - pad, color);
        }

        let rows_bottom = self.margin + self.row_height * rows.max(1) as u32;
        fill(&mut img, axis, self.margin, axis + 1, rows_bottom, AXIS);

        // Footer: expected value and output on the left, direction legend at the axis.
        let footer_top = rows_bottom + GAP / 2;
        let summary = format!("base {:.3}  output {:.3}", attribution.baseline, attribution.output);
        draw_text(&mut img, self.margin, footer_top, &summary, 1, TEXT);
        let low = "<- low risk";
        let low_width = low.len() as u32 * GLYPH;
        draw_text(&mut img, axis.saturating_sub(low_width + GAP / 2), footer_top, low, 1, NEGATIVE);
        draw_text(&mut img, axis + GAP / 2, footer_top, "at risk ->", 1, POSITIVE);

        img
    }
}

impl PlotRenderer for BarChartRenderer {
    fn render(&self, attribution: &Attribution) -> CadResult<Vec<u8>> {
        let img = self.draw(attribution);
        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut cursor, ImageOutputFormat::Png)
            .map_err(|e| CadError::Render {
                reason: format!("PNG encoding failed: {e}"),
            })?;
        Ok(cursor.into_inner())
    }
}

/// Fill the half-open rectangle `[x0, x1) × [y0, y1)`, clipped to the image.
fn fill(img: &mut RgbImage, x0: u32, y0: u32, x1: u32, y1: u32, color: Rgb<u8>) {
    let x1 = x1.min(img.width());
    let y1 = y1.min(img.height());
    for y in y0..y1 {
        for x in x0..x1 {
            img.put_pixel(x, y, color);
        }
    }
}

/// Draw `text` with its top-left corner at `(x, y)`, each glyph dot
/// `scale` pixels wide. Characters without a glyph are left blank.
fn draw_text(img: &mut RgbImage, x: u32, y: u32, text: &str, scale: u32, color: Rgb<u8>) {
    let advance = GLYPH * scale;
    for (i, ch) in text.chars().enumerate() {
        let Some(glyph) = BASIC_FONTS.get(ch) else {
            continue;
        };
        let left = x + i as u32 * advance;
        for (row, &bits) in glyph.iter().enumerate() {
            for col in 0..GLYPH {
                if bits & (1 << col) != 0 {
                    let px = left + col * scale;
                    let py = y + row as u32 * scale;
                    fill(img, px, py, px + scale, py + scale, color);
                }
            }
        }
    }
}
