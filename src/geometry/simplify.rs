use geo::{LineString, Simplify};

/// Douglas-Peucker over projected points. Endpoints are always kept.
pub fn simplify_polyline(points: &[(f64, f64)], epsilon: f64) -> Vec<(f64, f64)> {
    if points.len() < 3 || epsilon <= 0.0 {
        return points.to_vec();
    }

    let line: LineString<f64> = points
        .iter()
        .map(|&(x, y)| geo::coord! { x: x, y: y })
        .collect();

    line.simplify(&epsilon)
        .0
        .into_iter()
        .map(|c| (c.x, c.y))
        .collect()
}

/// Tolerance in meters matching a fraction of a pixel at `pixels_per_meter`
pub fn pixel_epsilon(pixels_per_meter: f64, fraction_of_pixel: f64) -> f64 {
    if pixels_per_meter > 0.0 {
        fraction_of_pixel / pixels_per_meter
    } else {
        0.0
    }
}
