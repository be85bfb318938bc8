//! Polygon assembly: features in, polygons / open paths / diagnostics out.

pub mod chain;

use geo::{Contains, InteriorPoint};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::{
    Feature, FeatureId, FeatureKind, FeatureSource, OpenPath, PointId, Polygon, Ring, Role,
};
use crate::osm::PrimitiveStore;

pub use chain::{Chains, chain_rings};

/// Why a feature could not be assembled
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AssemblyError {
    #[error("{role:?} boundary does not close: chain {start} .. {end} has no continuation")]
    OpenChain {
        role: Role,
        start: PointId,
        end: PointId,
    },
    #[error("ring has {distinct} distinct points, at least 3 are needed")]
    Degenerate { distinct: usize },
    #[error("feature has no usable outer boundary")]
    Empty,
}

/// Assembled geometry of one feature
#[derive(Debug, Clone, PartialEq)]
pub enum Assembled {
    /// One polygon per outer ring
    Area(Vec<Polygon>),
    /// Unclosed single way
    Path(OpenPath),
}

/// Assemble one feature.
///
/// Single closed ways are outer rings; single open ways are paths.
/// Grouped boundaries are chained per role: every closed outer chain is a
/// polygon, every closed inner chain a hole of the outer ring containing
/// it. Any chain left open, or an outer ring with fewer than three
/// distinct points, fails the whole feature.
pub fn assemble(feature: &Feature, store: &PrimitiveStore) -> Result<Assembled, AssemblyError> {
    match &feature.source {
        FeatureSource::SinglePath(segment) => {
            if segment.is_closed() {
                let ring = resolve_ring(&segment.points, store);
                check_ring(&ring)?;
                Ok(Assembled::Area(vec![Polygon::new(ring)]))
            } else {
                let points = store.resolve(&segment.points);
                if points.len() < 2 {
                    return Err(AssemblyError::Degenerate {
                        distinct: points.len(),
                    });
                }
                Ok(Assembled::Path(OpenPath::new(points)))
            }
        }
        FeatureSource::MultiPartBoundary(segments) => {
            let outer: Vec<&[PointId]> = segments
                .iter()
                .filter(|s| s.role != Some(Role::Inner))
                .map(|s| s.points.as_slice())
                .collect();
            let inner: Vec<&[PointId]> = segments
                .iter()
                .filter(|s| s.role == Some(Role::Inner))
                .map(|s| s.points.as_slice())
                .collect();

            let outer_rings = closed_rings(&outer, Role::Outer, store)?;
            let inner_rings = closed_rings(&inner, Role::Inner, store)?;

            let mut polygons = Vec::with_capacity(outer_rings.len());
            for ring in outer_rings {
                check_ring(&ring)?;
                polygons.push(Polygon::new(ring));
            }
            if polygons.is_empty() {
                return Err(AssemblyError::Empty);
            }

            for hole in inner_rings {
                if hole.is_degenerate() {
                    debug!("{}: dropping degenerate hole", feature.id);
                    continue;
                }
                let owner = owning_polygon(&polygons, &hole);
                polygons[owner].holes.push(hole);
            }

            Ok(Assembled::Area(polygons))
        }
    }
}

/// Chain one role's segments and resolve the closed rings to coordinates
fn closed_rings(
    segments: &[&[PointId]],
    role: Role,
    store: &PrimitiveStore,
) -> Result<Vec<Ring>, AssemblyError> {
    let chains = chain_rings(segments);
    if let Some(open) = chains.open.first() {
        return Err(AssemblyError::OpenChain {
            role,
            start: open.first().copied().unwrap_or(PointId(0)),
            end: open.last().copied().unwrap_or(PointId(0)),
        });
    }
    Ok(chains
        .rings
        .iter()
        .map(|ids| resolve_ring(ids, store))
        .collect())
}

/// Resolve ring ids, re-closing it if the closing point was missing from
/// the response
fn resolve_ring(ids: &[PointId], store: &PrimitiveStore) -> Ring {
    let mut ring = Ring::new(store.resolve(ids));
    if !ring.is_closed()
        && let Some(&first) = ring.points.first()
    {
        ring.points.push(first);
    }
    ring
}

fn check_ring(ring: &Ring) -> Result<(), AssemblyError> {
    if ring.is_degenerate() {
        return Err(AssemblyError::Degenerate {
            distinct: ring.distinct_len(),
        });
    }
    Ok(())
}

/// Index of the polygon whose outer ring contains a point inside the
/// hole, falling back to the first polygon. Hole vertices may lie on the
/// outer boundary, so they are not used for the test.
fn owning_polygon(polygons: &[Polygon], hole: &Ring) -> usize {
    let Some(inside) = geo::Polygon::new(hole.to_line_string(), vec![]).interior_point() else {
        return 0;
    };
    polygons
        .iter()
        .position(|polygon| {
            geo::Polygon::new(polygon.outer.to_line_string(), vec![]).contains(&inside)
        })
        .unwrap_or(0)
}

/// An assembled area feature
#[derive(Debug, Clone, PartialEq)]
pub struct AreaFeature {
    pub id: FeatureId,
    pub kind: FeatureKind,
    pub polygons: Vec<Polygon>,
}

/// An assembled open path feature
#[derive(Debug, Clone, PartialEq)]
pub struct PathFeature {
    pub id: FeatureId,
    pub kind: FeatureKind,
    pub path: OpenPath,
}

/// A feature that could not be assembled, kept for diagnostics
#[derive(Debug, Clone, PartialEq)]
pub struct Malformed {
    pub id: FeatureId,
    pub kind: FeatureKind,
    pub error: AssemblyError,
}

/// Outcome of assembling a batch of features
#[derive(Debug, Default, Clone)]
pub struct AssemblyReport {
    pub areas: Vec<AreaFeature>,
    pub paths: Vec<PathFeature>,
    pub malformed: Vec<Malformed>,
}

impl AssemblyReport {
    pub fn areas_of(&self, kind: FeatureKind) -> impl Iterator<Item = &AreaFeature> {
        self.areas.iter().filter(move |a| a.kind == kind)
    }

    pub fn buildings(&self) -> impl Iterator<Item = &AreaFeature> {
        self.areas_of(FeatureKind::Building)
    }
}

/// Assemble every feature; failures are collected, never propagated
pub fn assemble_all(features: &[Feature], store: &PrimitiveStore) -> AssemblyReport {
    let mut report = AssemblyReport::default();

    for feature in features {
        match assemble(feature, store) {
            Ok(Assembled::Area(polygons)) => report.areas.push(AreaFeature {
                id: feature.id,
                kind: feature.kind,
                polygons,
            }),
            Ok(Assembled::Path(path)) => report.paths.push(PathFeature {
                id: feature.id,
                kind: feature.kind,
                path,
            }),
            Err(error) => {
                debug!("{} ({:?}) is malformed: {}", feature.id, feature.kind, error);
                report.malformed.push(Malformed {
                    id: feature.id,
                    kind: feature.kind,
                    error,
                });
            }
        }
    }

    info!(
        "Assembled {} areas and {} paths from {} features",
        report.areas.len(),
        report.paths.len(),
        features.len()
    );
    if !report.malformed.is_empty() {
        warn!(
            "{} features are malformed and will not be filled",
            report.malformed.len()
        );
    }

    report
}
