use crate::domain::Point;

/// Meters per degree of latitude
pub const METERS_PER_DEGREE: f64 = 111_320.0;

/// Equirectangular projection from WGS84 to local meters
///
/// - x = (lon - center_lon) * cos(center_lat) * 111320
/// - y = (lat - center_lat) * 111320
///
/// Accurate enough for the few kilometres a city map spans.
#[derive(Debug, Clone)]
pub struct Projector {
    center_lat: f64,
    center_lon: f64,
    cos_lat: f64,
}

impl Projector {
    /// `center` is (lat, lon) in WGS84
    pub fn new(center: (f64, f64)) -> Self {
        let (lat, lon) = center;
        Self {
            center_lat: lat,
            center_lon: lon,
            cos_lat: lat.to_radians().cos(),
        }
    }

    /// Project a lat/lon pair to (x, y) meters from the centre
    pub fn project(&self, lat: f64, lon: f64) -> (f64, f64) {
        let x = (lon - self.center_lon) * self.cos_lat * METERS_PER_DEGREE;
        let y = (lat - self.center_lat) * METERS_PER_DEGREE;
        (x, y)
    }

    pub fn project_points(&self, points: &[Point]) -> Vec<(f64, f64)> {
        points.iter().map(|p| self.project(p.lat, p.lon)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projector_center() {
        let proj = Projector::new((47.4979, 19.0402));
        let (x, y) = proj.project(47.4979, 19.0402);
        assert!(x.abs() < 0.01);
        assert!(y.abs() < 0.01);
    }

    #[test]
    fn test_projector_1km() {
        let proj = Projector::new((47.4979, 19.0402));

        // 0.009 degrees of latitude is about 1 km
        let (_, y) = proj.project(47.4979 + 0.009, 19.0402);
        assert!((y - 1000.0).abs() < 50.0);

        // longitude degrees shrink with cos(lat)
        let (x, _) = proj.project(47.4979, 19.0402 + 0.009);
        assert!((x - 1000.0 * 47.4979_f64.to_radians().cos()).abs() < 50.0);
    }

    #[test]
    fn test_project_points() {
        let proj = Projector::new((0.0, 0.0));
        let points = [Point::new(1, 0.0, 0.0), Point::new(2, 0.001, 0.0)];
        let projected = proj.project_points(&points);
        assert_eq!(projected.len(), 2);
        assert!((projected[1].1 - 111.32).abs() < 0.01);
    }
}
