use anyhow::{Context, Result, bail};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing::{Level, debug, info, warn};

use citymap::api::{FeatureQuery, OverpassResponse, fetch_features, geocode_city};
use citymap::city::{CityMap, output_path};
use citymap::config::{
    DEFAULT_RADIUS, DEFAULT_SCALE, DEFAULT_SIZE, DEFAULT_STYLE, FileConfig, Style, StyleBook,
};
use citymap::osm::{PrimitiveStore, extract_features};
use citymap::render::RenderOptions;

/// Render colourful city maps from OpenStreetMap data
///
/// Examples:
///   # Budapest in the default style
///   citymap -c "Budapest"
///
///   # A wider area of Turin in the Night style, reproducibly
///   citymap -c "Turin" -s Night -r 2000 --seed 42
///
///   # Every bundled style, 3000x3000
///   citymap -c "Vienna" --all-styles --width 3000 --height 3000
///
///   # Coordinates instead of a name
///   citymap --lat 41.9028 --lon 12.4964 --label "Roma"
#[derive(Parser, Debug)]
#[command(name = "citymap")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to config file (optional, auto-searches citymap.toml if not provided)
    #[arg(long)]
    config: Option<PathBuf>,

    /// City name, geocoded with Nominatim
    #[arg(short = 'c', long)]
    city: Option<String>,

    /// Latitude of the map centre (use with --lon)
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Longitude of the map centre (use with --lat)
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    lon: Option<f64>,

    /// Label text (defaults to the city name)
    #[arg(long)]
    label: Option<String>,

    /// Map radius in meters [default: 1000]
    #[arg(short = 'r', long)]
    radius: Option<u32>,

    /// Style name [default: Bauhaus]
    #[arg(short = 's', long)]
    style: Option<String>,

    /// Render the map once per available style, into maps/<city>-<style>.png
    #[arg(long, conflicts_with_all = ["style", "output"])]
    all_styles: bool,

    /// Styles file replacing the bundled styles
    #[arg(long)]
    styles: Option<PathBuf>,

    /// List available styles and exit
    #[arg(short = 'l', long)]
    list_styles: bool,

    /// Image width in pixels [default: 1000]
    #[arg(long)]
    width: Option<u32>,

    /// Image height in pixels [default: 1000]
    #[arg(long)]
    height: Option<u32>,

    /// Share of the image taken by the map, in (0, 1] [default: 0.9]
    #[arg(long)]
    scale: Option<f32>,

    /// Output PNG path (defaults to maps/<city>-<style>.png)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Random seed (defaults to the current time)
    #[arg(long)]
    seed: Option<u64>,

    /// Number of colouring trials
    #[arg(long)]
    trials: Option<usize>,

    /// Colour buildings at random instead of keeping neighbours apart
    #[arg(short = 'f', long)]
    random_fill: bool,

    /// Path to a TTF font for the label (defaults to the style's font in fonts/)
    #[arg(long)]
    font: Option<PathBuf>,

    /// Skip water features
    #[arg(long)]
    no_water: bool,

    /// Skip parks and green areas
    #[arg(long)]
    no_parks: bool,

    /// Skip streets
    #[arg(long)]
    no_streets: bool,

    /// Skip buildings
    #[arg(long)]
    no_buildings: bool,

    /// Enable debug logging
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Only log warnings and errors, no progress spinners
    #[arg(short = 'q', long, conflicts_with = "verbose")]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let total_start = Instant::now();

    let file_config = match args.config {
        Some(ref config_path) => {
            if !config_path.exists() {
                bail!("Config file not found: {:?}", config_path);
            }
            Some(FileConfig::from_path(config_path)?)
        }
        None => FileConfig::load(),
    };
    let file_config = file_config.unwrap_or_default();

    let verbose = args.verbose || file_config.verbose;
    let level = if args.quiet {
        Level::WARN
    } else if verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let book = match args.styles.clone().or(file_config.styles.clone()) {
        Some(path) => StyleBook::load(&path)
            .with_context(|| format!("Failed to load styles from {:?}", path))?,
        None => StyleBook::bundled().context("Bundled styles are invalid")?,
    };

    if args.list_styles {
        for name in book.names() {
            println!("{name}");
        }
        return Ok(());
    }

    if args.all_styles && file_config.output.is_some() {
        warn!("Ignoring the configured output path, --all-styles writes one file per style");
    }

    let styles: Vec<&Style> = if args.all_styles {
        book.styles().iter().collect()
    } else {
        let name = args
            .style
            .clone()
            .or(file_config.style.clone())
            .unwrap_or_else(|| DEFAULT_STYLE.to_string());
        vec![book.get(&name)?]
    };

    let city = args.city.clone().or(file_config.city.clone());
    let lat = args.lat.or(file_config.lat);
    let lon = args.lon.or(file_config.lon);
    if city.is_none() && (lat.is_none() || lon.is_none()) {
        bail!("Must provide either --city/-c, or --lat and --lon");
    }

    let radius = args.radius.or(file_config.radius).unwrap_or(DEFAULT_RADIUS);
    let seed = args.seed.or(file_config.seed).unwrap_or_else(time_seed);
    let overpass_config = file_config.overpass.clone().unwrap_or_default();

    let mut layers = file_config.layers.unwrap_or_default();
    layers.water &= !args.no_water;
    layers.parks &= !args.no_parks;
    layers.streets &= !args.no_streets;
    layers.buildings &= !args.no_buildings;

    let mut colouring = file_config.colouring.unwrap_or_default();
    colouring.seed = seed;
    if let Some(trials) = args.trials {
        colouring.trials = trials;
    }

    let options = RenderOptions {
        width: args.width.or(file_config.width).unwrap_or(DEFAULT_SIZE),
        height: args.height.or(file_config.height).unwrap_or(DEFAULT_SIZE),
        scale: args.scale.or(file_config.scale).unwrap_or(DEFAULT_SCALE),
        layers,
        font: args.font.clone().or(file_config.font.clone()),
        random_fill: args.random_fill || file_config.random_fill,
        adjacency: file_config.adjacency.unwrap_or_default(),
        colouring,
        ..RenderOptions::default()
    };
    options.validate()?;

    info!(
        "Radius {}m, {}x{} px, seed {}, {} style(s), {} Overpass mirror(s)",
        radius,
        options.width,
        options.height,
        seed,
        styles.len(),
        overpass_config.urls.len()
    );

    let (center, city_name) = match (lat, lon) {
        (Some(lt), Some(ln)) => {
            info!("Using provided coordinates: ({:.4}, {:.4})", lt, ln);
            ((lt, ln), city.clone().unwrap_or_else(|| "Custom Location".to_string()))
        }
        _ => {
            let name = city.clone().context("Missing city name")?;
            let spinner = create_spinner("Geocoding city...", args.quiet);
            let start = Instant::now();
            let found = geocode_city(&name).context("Failed to geocode city")?;
            spinner.finish_with_message(format!(
                "Geocoded: {} -> ({:.4}, {:.4}) [{:.1}s]",
                found.display_name,
                found.lat,
                found.lon,
                start.elapsed().as_secs_f32()
            ));
            ((found.lat, found.lon), name)
        }
    };
    let label = args.label.clone().unwrap_or_else(|| city_name.clone());

    let queries = [
        (FeatureQuery::Buildings, layers.buildings),
        (FeatureQuery::Streets, layers.streets),
        (FeatureQuery::Parks, layers.parks),
        (FeatureQuery::Water, layers.water),
    ];
    let mut responses: Vec<OverpassResponse> = Vec::new();
    for (query, enabled) in queries {
        if !enabled {
            continue;
        }
        let spinner = create_spinner(&format!("Fetching {}...", query.label()), args.quiet);
        let start = Instant::now();
        let response = fetch_features(query, center, radius, &overpass_config)
            .with_context(|| format!("Failed to fetch {} from Overpass API", query.label()))?;
        spinner.finish_with_message(format!(
            "Fetched {} {} elements [{:.1}s]",
            response.elements.len(),
            query.label(),
            start.elapsed().as_secs_f32()
        ));
        responses.push(response);
    }

    let spinner = create_spinner("Assembling features...", args.quiet);
    let start = Instant::now();
    let store = PrimitiveStore::merge(&responses);
    debug!(
        "Indexed {} points and {} ways",
        store.point_count(),
        store.way_count()
    );
    let features = extract_features(&store);
    let city_map = CityMap::new(label, center, &features, &store);
    if layers.buildings && city_map.building_count() == 0 {
        bail!("No buildings found in the specified area. Try increasing the radius");
    }
    spinner.finish_with_message(format!(
        "Assembled {} features ({} buildings, {} malformed) [{:.1}s]",
        features.len(),
        city_map.building_count(),
        city_map.report().malformed.len(),
        start.elapsed().as_secs_f32()
    ));

    let mut written = Vec::new();
    for style in styles {
        let spinner = create_spinner(&format!("Rendering {}...", style.name), args.quiet);
        let start = Instant::now();
        let output = city_map
            .render(style, &options)
            .with_context(|| format!("Failed to render style {}", style.name))?;

        let explicit = if args.all_styles {
            None
        } else {
            args.output.as_deref().or(file_config.output.as_deref())
        };
        let path = output_path(explicit, &city_name, &style.name);
        output
            .save(&path)
            .with_context(|| format!("Failed to write {:?}", path))?;

        spinner.finish_with_message(format!(
            "Rendered {}: {} buildings, {} conflicts [{:.1}s]",
            style.name,
            output.stats.buildings,
            output.stats.conflicts,
            start.elapsed().as_secs_f32()
        ));
        written.push(path);
    }

    println!();
    println!(
        "Done! Total time: {:.1}s",
        total_start.elapsed().as_secs_f32()
    );
    for path in &written {
        println!("Output: {}", path.display());
    }

    Ok(())
}

fn time_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

fn create_spinner(message: &str, hidden: bool) -> ProgressBar {
    if hidden {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb
}
