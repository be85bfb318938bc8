use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::thread;
use std::time::Duration;
use tracing::info;

const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/search";
const USER_AGENT: &str = "citymap/0.1.0";

#[derive(Debug, Deserialize)]
struct NominatimResult {
    lat: String,
    lon: String,
    #[serde(default)]
    name: String,
    display_name: String,
    #[serde(default)]
    importance: f64,
}

/// A geocoded city centre
#[derive(Debug, Clone, PartialEq)]
pub struct City {
    pub name: String,
    pub display_name: String,
    pub lat: f64,
    pub lon: f64,
}

/// Geocode a city name to its centre.
///
/// Asks Nominatim for every match and keeps the most important one, which
/// resolves "Paris" to France rather than Texas. Sleeps one second first
/// to respect the Nominatim rate limit.
pub fn geocode_city(city: &str) -> Result<City> {
    thread::sleep(Duration::from_secs(1));

    let client = reqwest::blocking::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(30))
        .build()
        .context("Failed to create HTTP client")?;

    let response = client
        .get(NOMINATIM_URL)
        .query(&[("q", city), ("format", "jsonv2"), ("limit", "10")])
        .send()
        .context("Failed to send request to Nominatim API")?;

    if !response.status().is_success() {
        bail!("Nominatim API returned error status: {}", response.status());
    }

    let results: Vec<NominatimResult> = response
        .json()
        .context("Failed to parse Nominatim JSON response")?;

    let city = pick_most_important(results, city)?;
    info!("Geocoded {} -> ({:.4}, {:.4})", city.display_name, city.lat, city.lon);
    Ok(city)
}

fn pick_most_important(results: Vec<NominatimResult>, query: &str) -> Result<City> {
    let best = results
        .into_iter()
        .max_by(|a, b| a.importance.total_cmp(&b.importance))
        .ok_or_else(|| anyhow::anyhow!("City not found: {}", query))?;

    let lat: f64 = best
        .lat
        .parse()
        .context("Failed to parse latitude from Nominatim response")?;
    let lon: f64 = best
        .lon
        .parse()
        .context("Failed to parse longitude from Nominatim response")?;

    let name = if best.name.is_empty() {
        query.to_string()
    } else {
        best.name
    };

    Ok(City {
        name,
        display_name: best.display_name,
        lat,
        lon,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_most_important() {
        let json = r#"[
            {"lat":"33.66","lon":"-95.55","name":"Paris","display_name":"Paris, Texas","importance":0.4},
            {"lat":"48.8588","lon":"2.3200","name":"Paris","display_name":"Paris, France","importance":0.9}
        ]"#;
        let results: Vec<NominatimResult> = serde_json::from_str(json).unwrap();

        let city = pick_most_important(results, "Paris").unwrap();
        assert_eq!(city.display_name, "Paris, France");
        assert!((city.lat - 48.8588).abs() < 1e-9);
    }

    #[test]
    fn test_no_results() {
        assert!(pick_most_important(Vec::new(), "Atlantis").is_err());
    }
}
