use std::collections::HashSet;

use geo::{Coord, LineString};

use super::{Point, PointId};

/// Closed ordered boundary. The first point is repeated at the end.
#[derive(Debug, Clone, PartialEq)]
pub struct Ring {
    pub points: Vec<Point>,
}

impl Ring {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn is_closed(&self) -> bool {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => self.points.len() >= 2 && first.id == last.id,
            _ => false,
        }
    }

    /// Number of distinct point ids on the ring
    pub fn distinct_len(&self) -> usize {
        self.points.iter().map(|p| p.id).collect::<HashSet<_>>().len()
    }

    /// Fewer than three distinct points cannot enclose an area
    pub fn is_degenerate(&self) -> bool {
        self.distinct_len() < 3
    }

    pub fn ids(&self) -> impl Iterator<Item = PointId> + '_ {
        self.points.iter().map(|p| p.id)
    }

    /// Ring as a geo line string in (x = lon, y = lat)
    pub fn to_line_string(&self) -> LineString<f64> {
        self.points
            .iter()
            .map(|p| Coord { x: p.lon, y: p.lat })
            .collect()
    }
}

/// Outer ring with zero or more holes
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub outer: Ring,
    pub holes: Vec<Ring>,
}

impl Polygon {
    pub fn new(outer: Ring) -> Self {
        Self {
            outer,
            holes: Vec::new(),
        }
    }

    pub fn to_geo(&self) -> geo::Polygon<f64> {
        geo::Polygon::new(
            self.outer.to_line_string(),
            self.holes.iter().map(Ring::to_line_string).collect(),
        )
    }
}

/// Open stroked path, used for streets
#[derive(Debug, Clone, PartialEq)]
pub struct OpenPath {
    pub points: Vec<Point>,
}

impl OpenPath {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Ring {
        Ring::new(vec![
            Point::new(1, 0.0, 0.0),
            Point::new(2, 0.0, 1.0),
            Point::new(3, 1.0, 1.0),
            Point::new(4, 1.0, 0.0),
            Point::new(1, 0.0, 0.0),
        ])
    }

    #[test]
    fn test_ring_closed_and_distinct() {
        let ring = square();
        assert!(ring.is_closed());
        assert_eq!(ring.distinct_len(), 4);
        assert!(!ring.is_degenerate());
    }

    #[test]
    fn test_degenerate_ring() {
        let ring = Ring::new(vec![
            Point::new(1, 0.0, 0.0),
            Point::new(2, 0.0, 1.0),
            Point::new(1, 0.0, 0.0),
        ]);
        assert!(ring.is_degenerate());
    }

    #[test]
    fn test_line_string_uses_lon_as_x() {
        let line = square().to_line_string();
        assert_eq!(line.0[1], Coord { x: 1.0, y: 0.0 });
        assert_eq!(line.0[3], Coord { x: 0.0, y: 1.0 });
    }

    #[test]
    fn test_geo_polygon_keeps_holes() {
        let hole = Ring::new(vec![
            Point::new(5, 0.25, 0.25),
            Point::new(6, 0.25, 0.75),
            Point::new(7, 0.75, 0.75),
            Point::new(5, 0.25, 0.25),
        ]);
        let polygon = Polygon {
            outer: square(),
            holes: vec![hole],
        };
        let shape = polygon.to_geo();
        assert_eq!(shape.exterior().0.len(), 5);
        assert_eq!(shape.interiors().len(), 1);
    }
}
