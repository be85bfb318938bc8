//! Layer compositor: turns assembled geometry and a style into an image.
//!
//! Layers are drawn bottom-up as background, water, parks, buildings,
//! streets. The map is then pasted into the final canvas inside an oval
//! frame and the city name is written in the bottom-right corner.

pub mod canvas;
pub mod label;

use std::iter;
use std::path::{Path, PathBuf};

use rand::prelude::*;
use rand::rngs::StdRng;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::adjacency::AdjacencyConfig;
use crate::colouring::ColouringConfig;
use crate::config::{DEFAULT_SCALE, DEFAULT_SIZE, Style};
use crate::domain::{OpenPath, Point, Polygon, Ring, StreetClass};
use crate::geometry::{Bounds, Projector, Scaler, pixel_epsilon, simplify_polyline};

pub use canvas::Canvas;
pub use label::LabelFont;

/// Line widths are given for a 1000 px map and scaled from there
const REFERENCE_SIZE: f32 = 1000.0;
/// Half extent of the fallback frame when there is nothing to fit, meters
const FALLBACK_HALF_EXTENT: f64 = 500.0;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid image size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
    #[error("map scale must be in (0, 1], got {0}")]
    InvalidScale(f32),
    #[error("style {0:?} has an empty building palette")]
    EmptyPalette(String),
    #[error("failed to encode PNG: {0}")]
    Encode(String),
    #[error("failed to write {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Which layers to draw
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LayerSet {
    pub buildings: bool,
    pub streets: bool,
    pub parks: bool,
    pub water: bool,
}

impl Default for LayerSet {
    fn default() -> Self {
        Self {
            buildings: true,
            streets: true,
            parks: true,
            water: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub width: u32,
    pub height: u32,
    /// Share of the canvas taken by the map, the rest is frame and label
    pub scale: f32,
    pub layers: LayerSet,
    /// Label font; the style's font and the default font are tried next
    pub font: Option<PathBuf>,
    /// Street width in pixels for a 1000 px map, before the class factor
    pub street_width: f32,
    pub simplify_streets: bool,
    /// Colour every building at random instead of by adjacency
    pub random_fill: bool,
    pub adjacency: AdjacencyConfig,
    pub colouring: ColouringConfig,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: DEFAULT_SIZE,
            height: DEFAULT_SIZE,
            scale: DEFAULT_SCALE,
            layers: LayerSet::default(),
            font: None,
            street_width: 2.0,
            simplify_streets: true,
            random_fill: false,
            adjacency: AdjacencyConfig::default(),
            colouring: ColouringConfig::default(),
        }
    }
}

impl RenderOptions {
    pub fn validate(&self) -> Result<(), RenderError> {
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::InvalidSize {
                width: self.width,
                height: self.height,
            });
        }
        if !(self.scale.is_finite() && self.scale > 0.0 && self.scale <= 1.0) {
            return Err(RenderError::InvalidScale(self.scale));
        }
        Ok(())
    }

    /// Pixel size of the framed map area
    pub fn map_size(&self) -> (u32, u32) {
        let side = |n: u32| ((n as f32 * self.scale).round() as u32).clamp(1, n);
        (side(self.width), side(self.height))
    }
}

/// A building and its palette index, `None` for a random pick
#[derive(Debug, Clone)]
pub struct BuildingShape<'a> {
    pub polygons: &'a [Polygon],
    pub colour: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct StreetLine<'a> {
    pub path: &'a OpenPath,
    pub class: StreetClass,
}

/// Everything the compositor draws, in WGS84
#[derive(Debug, Clone, Default)]
pub struct Scene<'a> {
    /// (lat, lon) projection centre
    pub center: (f64, f64),
    pub water: Vec<&'a Polygon>,
    pub parks: Vec<&'a Polygon>,
    pub buildings: Vec<BuildingShape<'a>>,
    pub streets: Vec<StreetLine<'a>>,
    pub label: String,
}

impl Scene<'_> {
    /// Projected extent of the buildings, or of everything when there are
    /// no buildings
    fn bounds(&self, projector: &Projector) -> Bounds {
        let ring_points = |ring: &Ring| projector.project_points(&ring.points);
        let building_points: Vec<(f64, f64)> = self
            .buildings
            .iter()
            .flat_map(|b| b.polygons.iter())
            .flat_map(|p| ring_points(&p.outer))
            .collect();
        if let Some(bounds) = Bounds::from_points(&building_points) {
            return bounds;
        }

        let other_points: Vec<(f64, f64)> = self
            .water
            .iter()
            .chain(&self.parks)
            .flat_map(|p| ring_points(&p.outer))
            .chain(
                self.streets
                    .iter()
                    .flat_map(|s| projector.project_points(&s.path.points)),
            )
            .collect();
        Bounds::from_points(&other_points)
            .unwrap_or_else(|| Bounds::around(0.0, 0.0, FALLBACK_HALF_EXTENT))
    }
}

/// WGS84 to pixel mapping for one map
struct Frame {
    projector: Projector,
    scaler: Scaler,
}

impl Frame {
    fn points(&self, points: &[Point]) -> Vec<(f32, f32)> {
        self.scaler
            .scale_points(&self.projector.project_points(points))
    }

    fn polygon_path(&self, polygon: &Polygon) -> Option<tiny_skia::Path> {
        let rings: Vec<Vec<(f32, f32)>> = iter::once(&polygon.outer)
            .chain(&polygon.holes)
            .map(|ring| self.points(&ring.points))
            .collect();
        canvas::rings_path(rings.iter().map(Vec::as_slice))
    }
}

/// Draw `scene` in `style`
pub fn compose(
    scene: &Scene,
    style: &Style,
    options: &RenderOptions,
) -> Result<Canvas, RenderError> {
    options.validate()?;
    let palette = &style.building_palette;
    if palette.is_empty() {
        return Err(RenderError::EmptyPalette(style.name.clone()));
    }

    let (map_w, map_h) = options.map_size();
    let projector = Projector::new(scene.center);
    let bounds = scene.bounds(&projector);
    let frame = Frame {
        scaler: Scaler::cover(&bounds, map_w, map_h),
        projector,
    };
    let px = map_w.min(map_h) as f32 / REFERENCE_SIZE;
    debug!(
        "Map area {:.0}m x {:.0}m -> {}x{} px",
        bounds.width(),
        bounds.height(),
        map_w,
        map_h
    );

    let mut map = Canvas::new(map_w, map_h, style.background_colour)?;
    let layers = options.layers;

    if layers.water {
        for path in scene.water.iter().filter_map(|p| frame.polygon_path(p)) {
            map.fill(&path, style.water_colour);
        }
    }

    if layers.parks {
        for path in scene.parks.iter().filter_map(|p| frame.polygon_path(p)) {
            map.fill(&path, style.park_colour);
        }
    }

    if layers.buildings {
        let mut rng = StdRng::seed_from_u64(options.colouring.seed);
        let outline_width = px.max(1.0);
        for building in &scene.buildings {
            let index = building
                .colour
                .filter(|&c| c < palette.len())
                .unwrap_or_else(|| rng.random_range(0..palette.len()));
            let fill = palette[index];
            let outline = style.building_outline(index).unwrap_or(fill);
            for path in building.polygons.iter().filter_map(|p| frame.polygon_path(p)) {
                map.fill(&path, fill);
                map.stroke(&path, outline, outline_width);
            }
        }
    }

    if layers.streets {
        let epsilon = pixel_epsilon(frame.scaler.scale_factor(), 0.5);
        for street in &scene.streets {
            let mut points = frame.projector.project_points(&street.path.points);
            if options.simplify_streets {
                points = simplify_polyline(&points, epsilon);
            }
            let width = options.street_width * street.class.width_factor() * px;
            if let Some(path) = canvas::polyline_path(&frame.scaler.scale_points(&points)) {
                map.stroke(&path, style.street_colour, width.max(0.5));
            }
        }
    }

    let mut image = Canvas::new(options.width, options.height, style.background_colour)?;
    let dx = (options.width - map_w) / 2;
    let dy = (options.height - map_h) / 2;
    image.paste_oval(&map, dx as i32, dy as i32);

    if !scene.label.is_empty() {
        let font = LabelFont::load(options.font.as_deref(), style.font.as_deref());
        let margin = (options.height - map_h) as f32;
        let size = (margin * 0.3).max(options.height as f32 * 0.02);
        font.draw_right_aligned(
            &mut image,
            &scene.label.to_uppercase(),
            options.width as f32 * 0.95,
            options.height as f32 - size * 0.35,
            size,
            style.text_colour,
        );
    }

    info!(
        "Composed {}x{} image: {} water, {} parks, {} buildings, {} streets",
        options.width,
        options.height,
        scene.water.len(),
        scene.parks.len(),
        scene.buildings.len(),
        scene.streets.len()
    );
    Ok(image)
}

/// Write `canvas` as PNG, creating parent directories
pub fn save_png(canvas: &Canvas, path: &Path) -> Result<(), RenderError> {
    let io_error = |source| RenderError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_error)?;
    }
    let bytes = canvas.encode_png()?;
    std::fs::write(path, bytes).map_err(io_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Colour;

    const BACKGROUND: Colour = Colour::rgb(240, 240, 240);
    const STREET: Colour = Colour::rgb(20, 20, 20);
    const RED: Colour = Colour::rgb(200, 0, 0);
    const BLUE: Colour = Colour::rgb(0, 0, 200);

    fn style() -> Style {
        Style {
            name: "Test".to_string(),
            background_colour: BACKGROUND,
            text_colour: Colour::rgb(0, 0, 0),
            street_colour: STREET,
            park_colour: Colour::rgb(0, 160, 0),
            water_colour: Colour::rgb(0, 100, 220),
            building_palette: vec![RED, BLUE],
            font: None,
        }
    }

    /// Rectangle over [lon0, lon1] x [lat0, lat1]
    fn rect(id: u64, lon0: f64, lon1: f64, lat0: f64, lat1: f64) -> Polygon {
        let corners = [(lat0, lon0), (lat0, lon1), (lat1, lon1), (lat1, lon0), (lat0, lon0)];
        let points = corners
            .iter()
            .enumerate()
            .map(|(n, &(lat, lon))| Point::new(id * 10 + (n as u64 % 4), lat, lon))
            .collect();
        Polygon::new(Ring::new(points))
    }

    struct Fixture {
        left: Vec<Polygon>,
        right: Vec<Polygon>,
        street: OpenPath,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                left: vec![rect(1, -0.001, -0.0002, -0.001, 0.001)],
                right: vec![rect(2, 0.0002, 0.001, -0.001, 0.001)],
                street: OpenPath::new(vec![
                    Point::new(100, -0.001, 0.0),
                    Point::new(101, 0.001, 0.0),
                ]),
            }
        }

        fn scene(&self) -> Scene<'_> {
            Scene {
                center: (0.0, 0.0),
                buildings: vec![
                    BuildingShape {
                        polygons: &self.left,
                        colour: Some(0),
                    },
                    BuildingShape {
                        polygons: &self.right,
                        colour: Some(1),
                    },
                ],
                streets: vec![StreetLine {
                    path: &self.street,
                    class: StreetClass::Residential,
                }],
                label: "Rome".to_string(),
                ..Scene::default()
            }
        }
    }

    fn options() -> RenderOptions {
        RenderOptions {
            street_width: 10.0,
            ..RenderOptions::default()
        }
    }

    fn rgba(c: Colour) -> Option<[u8; 4]> {
        Some([c.r, c.g, c.b, c.a])
    }

    #[test]
    fn test_layers_and_frame() {
        let fixture = Fixture::new();
        let image = compose(&fixture.scene(), &style(), &options()).unwrap();

        assert_eq!((image.width(), image.height()), (1000, 1000));
        assert_eq!(image.pixel(230, 500), rgba(RED));
        assert_eq!(image.pixel(770, 500), rgba(BLUE));
        assert_eq!(image.pixel(500, 500), rgba(STREET));
        // outside the oval frame
        assert_eq!(image.pixel(60, 60), rgba(BACKGROUND));
    }

    #[test]
    fn test_label_is_drawn_bottom_right() {
        let fixture = Fixture::new();
        let image = compose(&fixture.scene(), &style(), &options()).unwrap();

        let inked = |xs: std::ops::Range<u32>| {
            xs.flat_map(|x| (955..1000).map(move |y| (x, y)))
                .filter(|&(x, y)| image.pixel(x, y) != rgba(BACKGROUND))
                .count()
        };
        assert!(inked(700..960) > 0);
        assert_eq!(inked(0..300), 0);
    }

    #[test]
    fn test_disabled_layers_are_skipped() {
        let fixture = Fixture::new();
        let opts = RenderOptions {
            layers: LayerSet {
                streets: false,
                ..LayerSet::default()
            },
            ..options()
        };
        let image = compose(&fixture.scene(), &style(), &opts).unwrap();
        assert_eq!(image.pixel(500, 500), rgba(BACKGROUND));
        assert_eq!(image.pixel(230, 500), rgba(RED));
    }

    #[test]
    fn test_unassigned_buildings_are_seeded() {
        let fixture = Fixture::new();
        let mut scene = fixture.scene();
        for building in &mut scene.buildings {
            building.colour = None;
        }

        let a = compose(&scene, &style(), &options()).unwrap();
        let b = compose(&scene, &style(), &options()).unwrap();
        assert_eq!(a.pixmap().data(), b.pixmap().data());
        let pixel = a.pixel(230, 500);
        assert!(pixel == rgba(RED) || pixel == rgba(BLUE));
    }

    #[test]
    fn test_empty_scene_still_renders() {
        let image = compose(&Scene::default(), &style(), &options()).unwrap();
        assert_eq!(image.pixel(500, 500), rgba(BACKGROUND));
    }

    #[test]
    fn test_invalid_options() {
        let scene = Scene::default();
        let bad_scale = RenderOptions {
            scale: 1.5,
            ..RenderOptions::default()
        };
        assert!(matches!(
            compose(&scene, &style(), &bad_scale),
            Err(RenderError::InvalidScale(_))
        ));

        let no_palette = Style {
            building_palette: Vec::new(),
            ..style()
        };
        assert!(matches!(
            compose(&scene, &no_palette, &RenderOptions::default()),
            Err(RenderError::EmptyPalette(_))
        ));
    }

    #[test]
    fn test_save_png_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("maps").join("nested").join("rome.png");
        let canvas = Canvas::new(8, 8, BACKGROUND).unwrap();

        save_png(&canvas, &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
    }
}
