//! Thin drawing layer over a `tiny_skia::Pixmap` in pixel coordinates.

use tiny_skia::{
    FillRule, LineCap, LineJoin, Mask, Paint, Path, PathBuilder, Pixmap, PixmapPaint, Rect,
    Stroke, Transform,
};

use super::RenderError;
use crate::config::Colour;

pub fn paint(colour: Colour) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(colour.r, colour.g, colour.b, colour.a);
    paint.anti_alias = true;
    paint
}

pub fn to_skia(colour: Colour) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba8(colour.r, colour.g, colour.b, colour.a)
}

/// One closed subpath per ring. Rings with fewer than three points are
/// skipped; `None` when nothing is left.
pub fn rings_path<'a>(rings: impl IntoIterator<Item = &'a [(f32, f32)]>) -> Option<Path> {
    let mut pb = PathBuilder::new();
    for ring in rings {
        if ring.len() < 3 {
            continue;
        }
        pb.move_to(ring[0].0, ring[0].1);
        for &(x, y) in &ring[1..] {
            pb.line_to(x, y);
        }
        pb.close();
    }
    pb.finish()
}

pub fn polyline_path(points: &[(f32, f32)]) -> Option<Path> {
    let (first, rest) = points.split_first()?;
    if rest.is_empty() {
        return None;
    }
    let mut pb = PathBuilder::new();
    pb.move_to(first.0, first.1);
    for &(x, y) in rest {
        pb.line_to(x, y);
    }
    pb.finish()
}

/// Owned RGBA canvas
pub struct Canvas {
    pixmap: Pixmap,
}

impl Canvas {
    pub fn new(width: u32, height: u32, background: Colour) -> Result<Self, RenderError> {
        let mut pixmap =
            Pixmap::new(width, height).ok_or(RenderError::InvalidSize { width, height })?;
        pixmap.fill(to_skia(background));
        Ok(Self { pixmap })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Fill with the even-odd rule, so inner rings punch holes
    pub fn fill(&mut self, path: &Path, colour: Colour) {
        self.pixmap.fill_path(
            path,
            &paint(colour),
            FillRule::EvenOdd,
            Transform::identity(),
            None,
        );
    }

    /// Fill with the non-zero rule, used for glyph triangles
    pub fn fill_winding(&mut self, path: &Path, colour: Colour) {
        self.pixmap.fill_path(
            path,
            &paint(colour),
            FillRule::Winding,
            Transform::identity(),
            None,
        );
    }

    /// Stroke with round caps and joins
    pub fn stroke(&mut self, path: &Path, colour: Colour, width: f32) {
        let stroke = Stroke {
            width,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Stroke::default()
        };
        self.pixmap
            .stroke_path(path, &paint(colour), &stroke, Transform::identity(), None);
    }

    /// Paste `other` with its top-left corner at (x, y), clipped to the
    /// ellipse inscribed in the pasted area
    pub fn paste_oval(&mut self, other: &Canvas, x: i32, y: i32) {
        let oval = Rect::from_xywh(
            x as f32,
            y as f32,
            other.width() as f32,
            other.height() as f32,
        )
        .and_then(PathBuilder::from_oval);
        let Some(oval) = oval else {
            return;
        };
        let Some(mut mask) = Mask::new(self.width(), self.height()) else {
            return;
        };
        mask.fill_path(&oval, FillRule::Winding, true, Transform::identity());

        self.pixmap.draw_pixmap(
            x,
            y,
            other.pixmap.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            Some(&mask),
        );
    }

    /// Straight (non-premultiplied) RGBA at a pixel, for inspection
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let p = self.pixmap.pixel(x, y)?.demultiply();
        Some([p.red(), p.green(), p.blue(), p.alpha()])
    }

    pub fn encode_png(&self) -> Result<Vec<u8>, RenderError> {
        self.pixmap
            .encode_png()
            .map_err(|e| RenderError::Encode(e.to_string()))
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: Colour = Colour::rgb(255, 255, 255);
    const RED: Colour = Colour::rgb(255, 0, 0);

    fn square(x0: f32, y0: f32, x1: f32, y1: f32) -> Vec<(f32, f32)> {
        vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1)]
    }

    #[test]
    fn test_even_odd_leaves_hole() {
        let mut canvas = Canvas::new(100, 100, WHITE).unwrap();
        let outer = square(10.0, 10.0, 90.0, 90.0);
        let hole = square(40.0, 40.0, 60.0, 60.0);
        let path = rings_path([outer.as_slice(), hole.as_slice()]).unwrap();
        canvas.fill(&path, RED);

        assert_eq!(canvas.pixel(20, 20), Some([255, 0, 0, 255]));
        assert_eq!(canvas.pixel(50, 50), Some([255, 255, 255, 255]));
        assert_eq!(canvas.pixel(5, 5), Some([255, 255, 255, 255]));
    }

    #[test]
    fn test_degenerate_paths() {
        let line = [(0.0, 0.0), (1.0, 1.0)];
        assert!(rings_path([&line[..]]).is_none());
        assert!(polyline_path(&[(1.0, 1.0)]).is_none());
        assert!(polyline_path(&line).is_some());
    }

    #[test]
    fn test_paste_oval_clips_corners() {
        let mut base = Canvas::new(100, 100, WHITE).unwrap();
        let red = Canvas::new(80, 80, RED).unwrap();
        base.paste_oval(&red, 10, 10);

        assert_eq!(base.pixel(50, 50), Some([255, 0, 0, 255]));
        // corner of the pasted square lies outside the inscribed circle
        assert_eq!(base.pixel(12, 12), Some([255, 255, 255, 255]));
        assert_eq!(base.pixel(95, 50), Some([255, 255, 255, 255]));
    }

    #[test]
    fn test_zero_size_canvas_rejected() {
        assert!(matches!(
            Canvas::new(0, 10, WHITE),
            Err(RenderError::InvalidSize { .. })
        ));
    }
}
