//! City name label: TrueType glyphs when a font loads, otherwise a small
//! built-in stroke font.

use std::path::{Path, PathBuf};

use tiny_skia::PathBuilder;
use tracing::{debug, warn};

use super::canvas::{Canvas, polyline_path};
use crate::config::Colour;

const CURVE_SUBDIVISIONS: u8 = 12;
pub const FONTS_DIR: &str = "fonts";
const DEFAULT_FONT: &str = "RobotoSerif.ttf";

/// Glyph strokes on a 4x6 grid, y up. Strokes are separated by `|`, each
/// point is two digits `xy`.
fn stroke_glyph(ch: char) -> Option<&'static str> {
    let strokes = match ch {
        'A' => "00 26 40|13 33",
        'B' => "00 06 36 45 44 33 03|33 42 41 30 00",
        'C' => "41 30 10 01 05 16 36 45",
        'D' => "00 06 26 44 42 20 00",
        'E' => "40 00 06 46|03 33",
        'F' => "00 06 46|03 33",
        'G' => "45 36 16 05 01 10 30 41 43 23",
        'H' => "00 06|40 46|03 43",
        'I' => "10 30|20 26|16 36",
        'J' => "01 10 20 31 36|16 46",
        'K' => "00 06|46 03 40",
        'L' => "06 00 40",
        'M' => "00 06 23 46 40",
        'N' => "00 06 40 46",
        'O' => "10 01 05 16 36 45 41 30 10",
        'P' => "00 06 36 45 44 33 03",
        'Q' => "10 01 05 16 36 45 41 30 10|22 40",
        'R' => "00 06 36 45 44 33 03|23 40",
        'S' => "45 36 16 05 04 13 33 42 41 30 10 01",
        'T' => "06 46|26 20",
        'U' => "06 01 10 30 41 46",
        'V' => "06 20 46",
        'W' => "06 10 23 30 46",
        'X' => "00 46|06 40",
        'Y' => "06 23 46|23 20",
        'Z' => "06 46 00 40",
        '0' => "10 01 05 16 36 45 41 30 10|11 35",
        '1' => "14 26 20|10 30",
        '2' => "05 16 36 45 44 00 40",
        '3' => "05 16 36 45 44 33 13|33 42 41 30 10 01",
        '4' => "30 36 02 42",
        '5' => "46 06 04 34 43 41 30 10 01",
        '6' => "45 36 16 05 01 10 30 41 42 33 03",
        '7' => "06 46 10",
        '8' => "13 04 05 16 36 45 44 33 13 02 01 10 30 41 42 33",
        '9' => "43 13 04 05 16 36 45 41 30 10 01",
        '-' => "13 33",
        '.' => "20 21",
        ',' => "21 10",
        '\'' => "25 26",
        _ => return None,
    };
    Some(strokes)
}

fn parse_strokes(encoded: &str) -> Vec<Vec<(f32, f32)>> {
    encoded
        .split('|')
        .map(|stroke| {
            stroke
                .split_whitespace()
                .filter_map(|point| {
                    let mut digits = point.chars().filter_map(|c| c.to_digit(10));
                    Some((digits.next()? as f32, digits.next()? as f32))
                })
                .collect()
        })
        .collect()
}

/// Grid units per glyph cell, including spacing
const STROKE_ADVANCE: f32 = 5.5;
const STROKE_CAP_HEIGHT: f32 = 6.0;

pub struct TtfFont {
    data: Vec<u8>,
}

impl TtfFont {
    fn load(path: &Path) -> Option<Self> {
        let data = std::fs::read(path).ok()?;
        let face = fontmesh::Face::parse(&data, 0).ok()?;
        if fontmesh::char_to_mesh_3d(&face, 'A', 1.0, CURVE_SUBDIVISIONS).is_err() {
            return None;
        }
        Some(Self { data })
    }

    fn face(&self) -> Option<fontmesh::Face<'_>> {
        fontmesh::Face::parse(&self.data, 0).ok()
    }

    /// Width in em units
    fn advance(&self, text: &str) -> f32 {
        let Some(face) = self.face() else {
            return 0.0;
        };
        text.chars()
            .map(|ch| fontmesh::glyph_advance(&face, ch).unwrap_or(0.3))
            .sum()
    }

    /// Draw with the baseline starting at (x, baseline), `size` pixels per em
    fn draw(
        &self,
        canvas: &mut Canvas,
        text: &str,
        x: f32,
        baseline: f32,
        size: f32,
        colour: Colour,
    ) {
        let Some(face) = self.face() else {
            return;
        };
        let mut pb = PathBuilder::new();
        let mut cursor = x;

        for ch in text.chars() {
            if !ch.is_whitespace()
                && let Ok(mesh) = fontmesh::char_to_mesh_3d(&face, ch, 1.0, CURVE_SUBDIVISIONS)
            {
                // only the front cap; side walls and the back cap would
                // cancel it under the non-zero rule
                let cap_z = mesh
                    .vertices
                    .iter()
                    .map(|v| v[2])
                    .fold(f32::INFINITY, f32::min);
                for tri in mesh.indices.chunks(3) {
                    let Some(corners) = tri
                        .iter()
                        .map(|&i| mesh.vertices.get(i as usize))
                        .collect::<Option<Vec<_>>>()
                    else {
                        continue;
                    };
                    if corners.len() < 3 || corners.iter().any(|v| (v[2] - cap_z).abs() > 1e-4) {
                        continue;
                    }
                    let at = |v: usize| {
                        (
                            cursor + corners[v][0] * size,
                            baseline - corners[v][1] * size,
                        )
                    };
                    let ((x0, y0), (x1, y1), (x2, y2)) = (at(0), at(1), at(2));
                    pb.move_to(x0, y0);
                    pb.line_to(x1, y1);
                    pb.line_to(x2, y2);
                    pb.close();
                }
            }
            cursor += fontmesh::glyph_advance(&face, ch).unwrap_or(0.3) * size;
        }

        if let Some(path) = pb.finish() {
            canvas.fill_winding(&path, colour);
        }
    }
}

/// Font used for the map label
pub enum LabelFont {
    Ttf(TtfFont),
    Stroke,
}

impl LabelFont {
    /// Try `path`, then the style's font in the fonts directory, then the
    /// default font; fall back to the stroke font.
    pub fn load(path: Option<&Path>, style_font: Option<&str>) -> Self {
        let mut candidates: Vec<PathBuf> = Vec::new();
        candidates.extend(path.map(Path::to_path_buf));
        candidates.extend(style_font.map(|name| Path::new(FONTS_DIR).join(name)));
        candidates.push(Path::new(FONTS_DIR).join(DEFAULT_FONT));

        for candidate in &candidates {
            if let Some(font) = TtfFont::load(candidate) {
                debug!("Label font: {}", candidate.display());
                return Self::Ttf(font);
            }
        }

        if path.is_some() {
            warn!("Could not load label font, using built-in stroke font");
        } else {
            debug!("No TrueType font found, using built-in stroke font");
        }
        Self::Stroke
    }

    pub fn is_ttf(&self) -> bool {
        matches!(self, Self::Ttf(_))
    }

    /// Rendered width at `size` pixels
    pub fn text_width(&self, text: &str, size: f32) -> f32 {
        match self {
            Self::Ttf(font) => font.advance(text) * size,
            Self::Stroke => {
                let unit = size / STROKE_CAP_HEIGHT;
                let count = text.chars().count() as f32;
                (count * STROKE_ADVANCE - 1.5).max(0.0) * unit
            }
        }
    }

    /// Draw `text` with its bottom-right corner at (right, bottom)
    pub fn draw_right_aligned(
        &self,
        canvas: &mut Canvas,
        text: &str,
        right: f32,
        bottom: f32,
        size: f32,
        colour: Colour,
    ) {
        let left = right - self.text_width(text, size);
        match self {
            Self::Ttf(font) => font.draw(canvas, text, left, bottom, size, colour),
            Self::Stroke => draw_stroke_text(canvas, text, left, bottom, size, colour),
        }
    }
}

fn draw_stroke_text(
    canvas: &mut Canvas,
    text: &str,
    x: f32,
    bottom: f32,
    size: f32,
    colour: Colour,
) {
    let unit = size / STROKE_CAP_HEIGHT;
    let width = (unit * 0.8).max(1.0);

    for (n, ch) in text.chars().enumerate() {
        let Some(encoded) = stroke_glyph(ch.to_ascii_uppercase()) else {
            continue;
        };
        let origin = x + n as f32 * STROKE_ADVANCE * unit;
        for stroke in parse_strokes(encoded) {
            let points: Vec<(f32, f32)> = stroke
                .iter()
                .map(|&(gx, gy)| (origin + gx * unit, bottom - gy * unit))
                .collect();
            if let Some(path) = polyline_path(&points) {
                canvas.stroke(&path, colour, width);
            }
        }
    }
}
