//! Building adjacency: which footprints touch or nearly touch.

pub mod graph;
pub mod grid;

use std::collections::HashSet;

use geo::{BoundingRect, Intersects, LineString, Rect, coord};
use rayon::prelude::*;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::assembly::AreaFeature;
use crate::domain::{FeatureId, PointId, Polygon};

pub use graph::AdjacencyGraph;
pub use grid::GridIndex;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AdjacencyError {
    #[error("proximity threshold must be positive and finite, got {0}")]
    InvalidThreshold(f64),
    #[error("grid cell size must be positive and finite, got {0}")]
    InvalidCellSize(f64),
}

/// Tunables for the adjacency test, both in degrees
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(default)]
pub struct AdjacencyConfig {
    /// Boundaries closer than this are linked (1e-5 is roughly a metre)
    pub proximity_threshold: f64,
    pub cell_size: f64,
}

impl Default for AdjacencyConfig {
    fn default() -> Self {
        Self {
            proximity_threshold: 1e-5,
            cell_size: 5e-4,
        }
    }
}

impl AdjacencyConfig {
    pub fn validate(&self) -> Result<(), AdjacencyError> {
        if !(self.proximity_threshold.is_finite() && self.proximity_threshold > 0.0) {
            return Err(AdjacencyError::InvalidThreshold(self.proximity_threshold));
        }
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(AdjacencyError::InvalidCellSize(self.cell_size));
        }
        Ok(())
    }
}

/// Geometry of one building, prepared once for pairwise tests. `shapes`
/// keep their holes; `outlines` and `ids` are outer rings only.
struct Footprint {
    id: FeatureId,
    shapes: Vec<geo::Polygon<f64>>,
    outlines: Vec<LineString<f64>>,
    ids: HashSet<PointId>,
    bounds: Rect<f64>,
}

impl Footprint {
    fn from_area(area: &AreaFeature) -> Option<Footprint> {
        let outlines: Vec<LineString<f64>> = area
            .polygons
            .iter()
            .map(|p| p.outer.to_line_string())
            .collect();
        let shapes = area.polygons.iter().map(Polygon::to_geo).collect();
        let bounds = geo::MultiLineString::new(outlines.clone()).bounding_rect()?;
        let ids = area.polygons.iter().flat_map(|p| p.outer.ids()).collect();

        Some(Footprint {
            id: area.id,
            shapes,
            outlines,
            ids,
            bounds,
        })
    }

    fn expanded_bounds(&self, margin: f64) -> Rect<f64> {
        Rect::new(
            coord! { x: self.bounds.min().x - margin, y: self.bounds.min().y - margin },
            coord! { x: self.bounds.max().x + margin, y: self.bounds.max().y + margin },
        )
    }
}

fn boxes_within(a: &Rect<f64>, b: &Rect<f64>, margin: f64) -> bool {
    a.min().x <= b.max().x + margin
        && b.min().x <= a.max().x + margin
        && a.min().y <= b.max().y + margin
        && b.min().y <= a.max().y + margin
}

#[allow(deprecated)]
fn outline_distance(a: &LineString<f64>, b: &LineString<f64>) -> f64 {
    use geo::EuclideanDistance;
    a.euclidean_distance(b)
}

fn shared_point_count(a: &Footprint, b: &Footprint) -> usize {
    let (small, large) = if a.ids.len() <= b.ids.len() { (a, b) } else { (b, a) };
    small.ids.iter().filter(|id| large.ids.contains(id)).count()
}

fn are_adjacent(a: &Footprint, b: &Footprint, threshold: f64) -> bool {
    if !boxes_within(&a.bounds, &b.bounds, threshold) {
        return false;
    }
    if shared_point_count(a, b) >= 2 {
        return true;
    }
    // also covers one footprint inside the other, but not inside a courtyard
    let overlapping = a
        .shapes
        .iter()
        .any(|pa| b.shapes.iter().any(|pb| pa.intersects(pb)));
    if overlapping {
        return true;
    }
    a.outlines.iter().any(|la| {
        b.outlines
            .iter()
            .any(|lb| outline_distance(la, lb) < threshold)
    })
}

/// Build the building adjacency graph.
///
/// Every building becomes a node, isolated ones included. Candidate pairs
/// come from a [`GridIndex`] over threshold-expanded bounding boxes and
/// are then tested exactly, in parallel.
pub fn build_adjacency<'a>(
    buildings: impl IntoIterator<Item = &'a AreaFeature>,
    config: &AdjacencyConfig,
) -> Result<AdjacencyGraph, AdjacencyError> {
    config.validate()?;

    let mut graph = AdjacencyGraph::new();
    let mut footprints = Vec::new();
    for area in buildings {
        graph.add_node(area.id);
        match Footprint::from_area(area) {
            Some(footprint) => footprints.push(footprint),
            None => debug!("{} has no outer geometry, left isolated", area.id),
        }
    }

    let threshold = config.proximity_threshold;
    let mut grid = GridIndex::new(config.cell_size);
    for (index, footprint) in footprints.iter().enumerate() {
        grid.insert(index, footprint.expanded_bounds(threshold));
    }

    let candidates: Vec<(usize, usize)> = grid.candidate_pairs().into_iter().collect();
    let edges: Vec<(FeatureId, FeatureId)> = candidates
        .par_iter()
        .filter(|&&(i, j)| are_adjacent(&footprints[i], &footprints[j], threshold))
        .map(|&(i, j)| (footprints[i].id, footprints[j].id))
        .collect();

    for (u, v) in edges {
        graph.add_edge(u, v);
    }

    info!(
        "Adjacency: {} buildings, {} candidate pairs in {} cells, {} edges",
        graph.node_count(),
        candidates.len(),
        grid.cell_count(),
        graph.edge_count()
    );
    Ok(graph)
}

/// Quadratic reference version of [`build_adjacency`], without the grid
pub fn build_adjacency_naive<'a>(
    buildings: impl IntoIterator<Item = &'a AreaFeature>,
    config: &AdjacencyConfig,
) -> Result<AdjacencyGraph, AdjacencyError> {
    config.validate()?;

    let mut graph = AdjacencyGraph::new();
    let mut footprints = Vec::new();
    for area in buildings {
        graph.add_node(area.id);
        footprints.extend(Footprint::from_area(area));
    }

    for (n, a) in footprints.iter().enumerate() {
        for b in &footprints[n + 1..] {
            if are_adjacent(a, b, config.proximity_threshold) {
                graph.add_edge(a.id, b.id);
            }
        }
    }
    Ok(graph)
}
