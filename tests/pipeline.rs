//! Overpass JSON in, PNG out, without touching the network.

use citymap::api::OverpassResponse;
use citymap::city::{CityMap, output_path};
use citymap::colouring::ColourStrategy;
use citymap::config::StyleBook;
use citymap::domain::FeatureId;
use citymap::osm::{PrimitiveStore, extract_features};
use citymap::render::RenderOptions;

/// Two rows of four terraced houses sharing walls, plus a courtyard
/// building made of a multipolygon relation with a hole
fn block_response() -> OverpassResponse {
    let mut elements = Vec::new();
    let node = |id: u64, row: u64, col: u64| {
        serde_json::json!({
            "type": "node",
            "id": id,
            "lat": row as f64 * 1e-4,
            "lon": col as f64 * 1e-4,
        })
    };

    // node grid 4 rows x 5 columns, id = row * 10 + col + 1
    for row in 0..4 {
        for col in 0..5 {
            elements.push(node(row * 10 + col + 1, row, col));
        }
    }
    let id = |row: u64, col: u64| row * 10 + col + 1;
    for row in [0, 2] {
        for col in 0..4 {
            let ring = [
                id(row, col),
                id(row, col + 1),
                id(row + 1, col + 1),
                id(row + 1, col),
                id(row, col),
            ];
            elements.push(serde_json::json!({
                "type": "way",
                "id": 1000 + row * 10 + col,
                "nodes": ring,
                "tags": {"building": "house"},
            }));
        }
    }

    // courtyard building well away from the block
    let corners = [
        (0.0, 0.001),
        (0.0, 0.0016),
        (0.0006, 0.0016),
        (0.0006, 0.001),
        (0.0002, 0.0012),
        (0.0002, 0.0014),
        (0.0004, 0.0014),
        (0.0004, 0.0012),
    ];
    for (n, (lat, lon)) in corners.into_iter().enumerate() {
        elements.push(serde_json::json!({
            "type": "node",
            "id": 500 + n as u64,
            "lat": lat,
            "lon": lon,
        }));
    }
    // outer ring split over two ways, given in reverse order
    elements.push(serde_json::json!({"type": "way", "id": 2001, "nodes": [502, 503, 500]}));
    elements.push(serde_json::json!({"type": "way", "id": 2000, "nodes": [500, 501, 502]}));
    elements.push(serde_json::json!({
        "type": "way",
        "id": 2002,
        "nodes": [504, 505, 506, 507, 504],
    }));
    elements.push(serde_json::json!({
        "type": "relation",
        "id": 3000,
        "tags": {"type": "multipolygon", "building": "yes"},
        "members": [
            {"type": "way", "ref": 2001, "role": "outer"},
            {"type": "way", "ref": 2000, "role": "outer"},
            {"type": "way", "ref": 2002, "role": "inner"},
        ],
    }));

    // street along the bottom of the block
    for (id, lon) in [(900, -0.0001), (901, 0.0017)] {
        elements.push(serde_json::json!({"type": "node", "id": id, "lat": -0.00005, "lon": lon}));
    }
    elements.push(serde_json::json!({
        "type": "way",
        "id": 4000,
        "nodes": [900, 901],
        "tags": {"highway": "primary"},
    }));

    serde_json::from_value(serde_json::json!({ "elements": elements })).unwrap()
}

fn city() -> CityMap {
    let response = block_response();
    let store = PrimitiveStore::merge([&response]);
    let features = extract_features(&store);
    CityMap::new("Block Town", (0.0003, 0.0008), &features, &store)
}

fn options(trials: usize) -> RenderOptions {
    let mut options = RenderOptions {
        width: 300,
        height: 300,
        ..RenderOptions::default()
    };
    options.colouring.trials = trials;
    options.colouring.seed = 1234;
    options
}

#[test]
fn test_relation_building_is_assembled_with_hole() {
    let city = city();
    let report = city.report();
    assert!(report.malformed.is_empty());

    let courtyard = report
        .buildings()
        .find(|b| b.id == FeatureId::relation(3000))
        .expect("courtyard building");
    assert_eq!(courtyard.polygons.len(), 1);
    assert_eq!(courtyard.polygons[0].holes.len(), 1);
    assert_eq!(city.building_count(), 9);
}

#[test]
fn test_block_is_coloured_without_conflicts() {
    let city = city();
    let book = StyleBook::bundled().unwrap();
    let style = book.get("Bauhaus").unwrap();

    let output = city.render(style, &options(50)).unwrap();
    assert_eq!(output.stats.buildings, 9);
    assert_eq!(output.stats.edges, 6);
    assert_eq!(output.stats.conflicts, 0);

    let assignment = output.assignment.unwrap();
    assert_eq!(assignment.colours.len(), 9);
    assert!(
        assignment
            .colours
            .values()
            .all(|&c| c < style.building_palette.len())
    );
}

#[test]
fn test_single_colour_palette_reports_conflicts() {
    let city = city();
    let book = StyleBook::from_toml(
        r##"
[[styles]]
name = "Mono"
background_colour = "#ffffff"
text_colour = "#000000"
street_colour = "#808080"
park_colour = "#00ff00"
water_colour = "#0000ff"
building_palette = ["#ff0000"]
"##,
    )
    .unwrap();

    let output = city.render(book.get("Mono").unwrap(), &options(5)).unwrap();
    assert_eq!(output.stats.edges, 6);
    assert_eq!(output.stats.conflicts, 6);
}

#[test]
fn test_render_is_deterministic_for_a_seed() {
    let city = city();
    let book = StyleBook::bundled().unwrap();
    let style = book.get("Pastel").unwrap();

    let mut sequential = options(20);
    sequential.colouring.parallel = false;
    sequential.colouring.strategy = ColourStrategy::RandomAvailable;
    let mut parallel = sequential.clone();
    parallel.colouring.parallel = true;

    let a = city.render(style, &sequential).unwrap();
    let b = city.render(style, &parallel).unwrap();
    assert_eq!(a.assignment, b.assignment);
    assert_eq!(a.image.pixmap().data(), b.image.pixmap().data());
}

#[test]
fn test_png_written_to_default_location() {
    let city = city();
    let book = StyleBook::bundled().unwrap();
    let style = book.get("Night").unwrap();
    let output = city.render(style, &options(10)).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let relative = output_path(None, city.name(), &style.name);
    assert_eq!(relative.to_str(), Some("maps/Block_Town-Night.png"));

    let path = dir.path().join(relative);
    output.save(&path).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"\x89PNG"));
}
