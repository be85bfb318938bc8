//! End-to-end map pipeline: assembled features in, styled image out.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::adjacency::{AdjacencyError, build_adjacency};
use crate::assembly::{AreaFeature, AssemblyReport, assemble_all};
use crate::colouring::{ColourAssignment, ColouringError, assign_colours};
use crate::config::Style;
use crate::domain::{Feature, FeatureKind, OpenPath, Polygon, StreetClass};
use crate::osm::PrimitiveStore;
use crate::render::{
    BuildingShape, Canvas, RenderError, RenderOptions, Scene, StreetLine, compose, save_png,
};

pub const DEFAULT_OUTPUT_DIR: &str = "maps";

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Adjacency(#[from] AdjacencyError),
    #[error(transparent)]
    Colouring(#[from] ColouringError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub buildings: usize,
    pub edges: usize,
    pub conflicts: usize,
    pub malformed: usize,
    pub streets: usize,
    pub parks: usize,
    pub water: usize,
}

pub struct RenderOutput {
    pub image: Canvas,
    pub stats: RenderStats,
    /// `None` under random fill
    pub assignment: Option<ColourAssignment>,
}

impl RenderOutput {
    pub fn save(&self, path: &Path) -> Result<(), RenderError> {
        save_png(&self.image, path)
    }
}

/// A city's features, assembled once and renderable in any style
pub struct CityMap {
    name: String,
    center: (f64, f64),
    report: AssemblyReport,
    streets: Vec<(OpenPath, StreetClass)>,
}

impl CityMap {
    /// `center` is the (lat, lon) the map is projected around
    pub fn new(
        name: impl Into<String>,
        center: (f64, f64),
        features: &[Feature],
        store: &PrimitiveStore,
    ) -> Self {
        let report = assemble_all(features, store);

        let open_streets = report.paths.iter().filter_map(|p| match p.kind {
            FeatureKind::Street(class) => Some((p.path.clone(), class)),
            _ => None,
        });
        // closed ways tagged as streets (roundabouts, squares) are drawn as
        // their outline
        let ring_streets = report.areas.iter().flat_map(|a| match a.kind {
            FeatureKind::Street(class) => a
                .polygons
                .iter()
                .map(|p| (OpenPath::new(p.outer.points.clone()), class))
                .collect::<Vec<_>>(),
            _ => Vec::new(),
        });
        let streets: Vec<(OpenPath, StreetClass)> = open_streets.chain(ring_streets).collect();

        let ignored = report
            .paths
            .iter()
            .filter(|p| !matches!(p.kind, FeatureKind::Street(_)))
            .count();
        if ignored > 0 {
            debug!("{ignored} open ways of area categories are not drawn");
        }

        Self {
            name: name.into(),
            center,
            report,
            streets,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn report(&self) -> &AssemblyReport {
        &self.report
    }

    pub fn building_count(&self) -> usize {
        self.report.buildings().count()
    }

    fn polygons_of(&self, kind: FeatureKind) -> Vec<&Polygon> {
        self.report
            .areas_of(kind)
            .flat_map(|a| a.polygons.iter())
            .collect()
    }

    /// Colour the buildings and compose the map in `style`
    pub fn render(
        &self,
        style: &Style,
        options: &RenderOptions,
    ) -> Result<RenderOutput, PipelineError> {
        options.validate()?;
        let buildings: Vec<&AreaFeature> = self.report.buildings().collect();

        let (assignment, edges) = if options.random_fill {
            debug!("Random fill: skipping adjacency and colouring");
            (None, 0)
        } else {
            let graph = build_adjacency(buildings.iter().copied(), &options.adjacency)?;
            let assignment =
                assign_colours(&graph, style.building_palette.len(), &options.colouring)?;
            (Some(assignment), graph.edge_count())
        };

        let water = self.polygons_of(FeatureKind::Water);
        let parks = self.polygons_of(FeatureKind::Park);
        let scene = Scene {
            center: self.center,
            buildings: buildings
                .iter()
                .map(|b| BuildingShape {
                    polygons: &b.polygons,
                    colour: assignment.as_ref().and_then(|a| a.colour_of(b.id)),
                })
                .collect(),
            streets: self
                .streets
                .iter()
                .map(|(path, class)| StreetLine {
                    path,
                    class: *class,
                })
                .collect(),
            water,
            parks,
            label: self.name.clone(),
        };

        let image = compose(&scene, style, options)?;
        let stats = RenderStats {
            buildings: buildings.len(),
            edges,
            conflicts: assignment.as_ref().map_or(0, |a| a.conflicts),
            malformed: self.report.malformed.len(),
            streets: scene.streets.len(),
            parks: scene.parks.len(),
            water: scene.water.len(),
        };
        info!(
            "Rendered {} in {}: {} buildings, {} edges, {} conflicts",
            self.name, style.name, stats.buildings, stats.edges, stats.conflicts
        );

        Ok(RenderOutput {
            image,
            stats,
            assignment,
        })
    }
}

/// Where a map is saved: `path` with a `.png` extension, or
/// `maps/<city>-<style>.png` with spaces replaced by underscores
pub fn output_path(path: Option<&Path>, city: &str, style: &str) -> PathBuf {
    match path {
        Some(path) if path.extension().is_some_and(|e| e.eq_ignore_ascii_case("png")) => {
            path.to_path_buf()
        }
        Some(path) => {
            let mut name = path.as_os_str().to_os_string();
            name.push(".png");
            PathBuf::from(name)
        }
        None => {
            Path::new(DEFAULT_OUTPUT_DIR).join(format!("{city}-{style}.png").replace(' ', "_"))
        }
    }
}
