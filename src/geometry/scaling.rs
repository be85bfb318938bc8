/// Bounding box in projected coordinates (meters)
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Bounds {
    /// Create bounds from a set of points
    pub fn from_points(points: &[(f64, f64)]) -> Option<Self> {
        let (&(x0, y0), rest) = points.split_first()?;
        let mut bounds = Self {
            min_x: x0,
            max_x: x0,
            min_y: y0,
            max_y: y0,
        };
        bounds.expand(rest);
        Some(bounds)
    }

    /// Square of side `2 * half` around `(x, y)`
    pub fn around(x: f64, y: f64, half: f64) -> Self {
        Self {
            min_x: x - half,
            max_x: x + half,
            min_y: y - half,
            max_y: y + half,
        }
    }

    /// Expand bounds to include another set of points
    pub fn expand(&mut self, points: &[(f64, f64)]) {
        for &(x, y) in points {
            self.min_x = self.min_x.min(x);
            self.max_x = self.max_x.max(x);
            self.min_y = self.min_y.min(y);
            self.max_y = self.max_y.max(y);
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Maps projected coordinates (meters) onto a pixel grid.
///
/// The bounds are scaled uniformly so they cover the whole target and
/// centred; the overflow on the longer side falls outside the frame. Pixel
/// y grows downwards, so north ends up at the top.
#[derive(Debug, Clone)]
pub struct Scaler {
    /// Pixels per meter
    scale: f64,
    offset_x: f64,
    offset_y: f64,
    height_px: f64,
}

impl Scaler {
    pub fn cover(bounds: &Bounds, width_px: u32, height_px: u32) -> Self {
        let (w, h) = (width_px as f64, height_px as f64);
        let scale = match (bounds.width() > 0.0, bounds.height() > 0.0) {
            (true, true) => (w / bounds.width()).max(h / bounds.height()),
            (true, false) => w / bounds.width(),
            (false, true) => h / bounds.height(),
            (false, false) => 1.0,
        };

        let offset_x = (w - bounds.width() * scale) / 2.0 - bounds.min_x * scale;
        let offset_y = (h - bounds.height() * scale) / 2.0 - bounds.min_y * scale;

        Self {
            scale,
            offset_x,
            offset_y,
            height_px: h,
        }
    }

    /// Scale a point from meters to pixels
    pub fn scale(&self, x: f64, y: f64) -> (f32, f32) {
        let px = x * self.scale + self.offset_x;
        let py = self.height_px - (y * self.scale + self.offset_y);
        (px as f32, py as f32)
    }

    pub fn scale_points(&self, points: &[(f64, f64)]) -> Vec<(f32, f32)> {
        points.iter().map(|&(x, y)| self.scale(x, y)).collect()
    }

    /// Pixels per meter
    pub fn scale_factor(&self) -> f64 {
        self.scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_from_points() {
        let points = vec![(0.0, 0.0), (1000.0, 2000.0), (500.0, 1000.0)];
        let bounds = Bounds::from_points(&points).unwrap();

        assert_eq!(bounds.min_x, 0.0);
        assert_eq!(bounds.max_x, 1000.0);
        assert_eq!(bounds.min_y, 0.0);
        assert_eq!(bounds.max_y, 2000.0);
        assert!(Bounds::from_points(&[]).is_none());
    }

    #[test]
    fn test_scaler_square() {
        let bounds = Bounds::around(0.0, 0.0, 500.0);
        let scaler = Scaler::cover(&bounds, 1000, 1000);

        assert!((scaler.scale_factor() - 1.0).abs() < 1e-9);
        let (x, y) = scaler.scale(0.0, 0.0);
        assert!((x - 500.0).abs() < 0.01);
        assert!((y - 500.0).abs() < 0.01);
    }

    #[test]
    fn test_scaler_flips_y() {
        let bounds = Bounds::around(0.0, 0.0, 100.0);
        let scaler = Scaler::cover(&bounds, 200, 200);

        let (_, north) = scaler.scale(0.0, 100.0);
        let (_, south) = scaler.scale(0.0, -100.0);
        assert!(north.abs() < 0.01);
        assert!((south - 200.0).abs() < 0.01);
    }

    #[test]
    fn test_scaler_covers_wide_bounds() {
        // 2:1 bounds into a square: height fills, width overflows
        let bounds = Bounds {
            min_x: 0.0,
            max_x: 2000.0,
            min_y: 0.0,
            max_y: 1000.0,
        };
        let scaler = Scaler::cover(&bounds, 500, 500);

        assert!((scaler.scale_factor() - 0.5).abs() < 1e-9);
        let (left, _) = scaler.scale(0.0, 0.0);
        let (right, _) = scaler.scale(2000.0, 0.0);
        assert!((left + 250.0).abs() < 0.01);
        assert!((right - 750.0).abs() < 0.01);
    }
}
