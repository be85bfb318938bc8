use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::OverpassConfig;

const USER_AGENT: &str = "citymap/0.1.0";

/// Raw Overpass API response
#[derive(Debug, Deserialize, Default)]
pub struct OverpassResponse {
    pub elements: Vec<Element>,
}

/// A single element from Overpass (node, way or relation)
#[derive(Debug, Deserialize, Clone)]
pub struct Element {
    #[serde(rename = "type")]
    pub type_: String,
    pub id: u64,
    #[serde(default)]
    pub nodes: Option<Vec<u64>>,
    #[serde(default)]
    pub members: Option<Vec<Member>>,
    #[serde(default)]
    pub tags: Option<HashMap<String, String>>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
}

/// Relation member reference
#[derive(Debug, Deserialize, Clone)]
pub struct Member {
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(rename = "ref")]
    pub ref_: u64,
    #[serde(default)]
    pub role: String,
}

/// Which layer a query fetches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureQuery {
    Buildings,
    Streets,
    Parks,
    Water,
}

impl FeatureQuery {
    fn selectors(self) -> &'static [&'static str] {
        match self {
            FeatureQuery::Buildings => &[r#"way["building"]"#, r#"relation["building"]"#],
            FeatureQuery::Streets => &[r#"way["highway"]"#],
            FeatureQuery::Parks => &[
                r#"way["leisure"~"^(park|garden|playground|pitch|nature_reserve)$"]"#,
                r#"relation["leisure"~"^(park|garden|nature_reserve)$"]"#,
                r#"way["landuse"~"^(grass|forest|meadow|recreation_ground|village_green)$"]"#,
                r#"relation["landuse"~"^(grass|forest|meadow|recreation_ground)$"]"#,
                r#"way["natural"~"^(wood|scrub|grassland)$"]"#,
                r#"relation["natural"~"^(wood|scrub|grassland)$"]"#,
            ],
            FeatureQuery::Water => &[
                r#"way["natural"~"^(water|bay|wetland)$"]"#,
                r#"relation["natural"~"^(water|bay|wetland)$"]"#,
                r#"way["waterway"~"^(riverbank|dock)$"]"#,
                r#"relation["waterway"="riverbank"]"#,
                r#"way["landuse"~"^(reservoir|basin)$"]"#,
            ],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FeatureQuery::Buildings => "buildings",
            FeatureQuery::Streets => "streets",
            FeatureQuery::Parks => "parks",
            FeatureQuery::Water => "water",
        }
    }
}

/// Build the Overpass QL for one feature layer around a point.
///
/// `out body; >; out skel qt;` returns the tagged ways/relations first and
/// then, recursing down, every member way and node they reference.
pub fn build_query(
    query: FeatureQuery,
    center: (f64, f64),
    radius_m: u32,
    timeout_secs: u64,
) -> String {
    let (lat, lon) = center;
    let around = format!("(around:{radius_m},{lat},{lon})");
    let body: String = query
        .selectors()
        .iter()
        .map(|selector| format!("  {selector}{around};\n"))
        .collect();

    format!("[out:json][timeout:{timeout_secs}];\n(\n{body});\nout body;\n>;\nout skel qt;")
}

/// Fetch one feature layer from the configured Overpass mirrors
pub fn fetch_features(
    query: FeatureQuery,
    center: (f64, f64),
    radius_m: u32,
    config: &OverpassConfig,
) -> Result<OverpassResponse> {
    // server-side timeout a bit below the client one
    let server_timeout = config.timeout_secs.saturating_sub(20).max(30);
    let ql = build_query(query, center, radius_m, server_timeout);
    debug!(layer = query.label(), "overpass query:\n{ql}");
    execute_overpass_query(&ql, config)
}

/// Execute an Overpass query, cycling through mirrors and retrying on
/// 429/504 responses
fn execute_overpass_query(query: &str, config: &OverpassConfig) -> Result<OverpassResponse> {
    if config.urls.is_empty() {
        bail!("No Overpass mirrors configured");
    }

    let client = reqwest::blocking::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .context("Failed to create HTTP client")?;

    let max_retries = config.max_retries.max(1);
    let mut last_error = None;

    for attempt in 0..max_retries {
        let url = &config.urls[attempt as usize % config.urls.len()];
        if attempt > 0 {
            let wait_secs = 10 * attempt as u64;
            warn!(
                "Overpass request failed, retrying {} in {}s (attempt {}/{})",
                url,
                wait_secs,
                attempt + 1,
                max_retries
            );
            std::thread::sleep(Duration::from_secs(wait_secs));
        }

        // Overpass expects form-encoded data=<query>
        let response = match client.post(url).form(&[("data", query)]).send() {
            Ok(response) => response,
            Err(e) => {
                last_error = Some(format!("{url}: {e}"));
                continue;
            }
        };

        match response.status().as_u16() {
            200 => {
                let result: OverpassResponse = response
                    .json()
                    .context("Failed to parse Overpass JSON response")?;
                return Ok(result);
            }
            429 | 504 => {
                last_error = Some(format!(
                    "{} returned status {} (attempt {})",
                    url,
                    response.status(),
                    attempt + 1
                ));
            }
            status => {
                bail!("Overpass API returned error status: {}", status);
            }
        }
    }

    bail!(
        "Overpass API failed after {} attempts: {}",
        max_retries,
        last_error.unwrap_or_else(|| "Unknown error".to_string())
    )
}
