pub mod style;

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::adjacency::AdjacencyConfig;
use crate::colouring::ColouringConfig;
use crate::render::LayerSet;

pub use style::{Colour, Style, StyleBook, StyleError};

pub const DEFAULT_RADIUS: u32 = 1000;
pub const DEFAULT_SIZE: u32 = 1000;
pub const DEFAULT_SCALE: f32 = 0.9;
pub const DEFAULT_STYLE: &str = "Bauhaus";

/// Settings read from `citymap.toml`. Every top-level value is optional so
/// command line flags can take precedence field by field.
#[derive(Debug, Deserialize, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub radius: Option<u32>,
    #[serde(default)]
    pub style: Option<String>,
    /// Styles file replacing the bundled set
    #[serde(default)]
    pub styles: Option<PathBuf>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub scale: Option<f32>,
    #[serde(default)]
    pub output: Option<PathBuf>,
    #[serde(default)]
    pub font: Option<PathBuf>,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub random_fill: bool,
    #[serde(default)]
    pub verbose: bool,
    #[serde(default)]
    pub layers: Option<LayerSet>,
    #[serde(default)]
    pub overpass: Option<OverpassConfig>,
    #[serde(default)]
    pub adjacency: Option<AdjacencyConfig>,
    #[serde(default)]
    pub colouring: Option<ColouringConfig>,
}

fn default_overpass_urls() -> Vec<String> {
    vec![
        "https://overpass-api.de/api/interpreter".to_string(),
        "https://overpass.private.coffee/api/interpreter".to_string(),
        "https://maps.mail.ru/osm/tools/overpass/api/interpreter".to_string(),
    ]
}

fn default_timeout_secs() -> u64 {
    200
}

fn default_max_retries() -> u32 {
    3
}

#[derive(Debug, Deserialize, Clone)]
pub struct OverpassConfig {
    #[serde(default = "default_overpass_urls")]
    pub urls: Vec<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for OverpassConfig {
    fn default() -> Self {
        Self {
            urls: default_overpass_urls(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

impl FileConfig {
    /// First parseable config file from the search path, if any
    pub fn load() -> Option<Self> {
        for path in get_config_paths() {
            if path.exists()
                && let Ok(contents) = std::fs::read_to_string(&path)
            {
                match toml::from_str(&contents) {
                    Ok(config) => return Some(config),
                    Err(e) => warn!("Failed to parse config file {:?}: {}", path, e),
                }
            }
        }
        None
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&contents).context("Failed to parse config file")
    }
}

fn get_config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("citymap.toml"), PathBuf::from(".citymap.toml")];

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("citymap").join("config.toml"));
        paths.push(config_dir.join("citymap.toml"));
    }

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".citymap.toml"));
    }

    paths
}
