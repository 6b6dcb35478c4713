//! Parsing of the provider's composite place names.
//!
//! Names arrive as comma-separated hierarchies such as
//! `"Govindpuri, South Delhi, Delhi, 110019, India"`. The city is picked with
//! a heuristic that skips postal codes, sub-district units, directional
//! districts and abbreviations. It is a best-effort parse: it can pick a
//! state or miss a city whose name contains a cardinal direction.

use serde::Deserialize;
use serde_json::Value;

use crate::types::LocationDetails;

/// Marker of a sub-district administrative unit.
const SUB_DISTRICT_MARKER: &str = "tehsil";
const CARDINAL_DIRECTIONS: [&str; 4] = ["south", "north", "east", "west"];

#[derive(Debug, Deserialize)]
struct RealtimeLocation {
    location: Option<LocationBlock>,
}

#[derive(Debug, Deserialize)]
struct LocationBlock {
    name: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

/// Location details from a realtime payload; `None` without a location block.
pub fn build_location_details(realtime: Option<&Value>) -> Option<LocationDetails> {
    let parsed = RealtimeLocation::deserialize(realtime?)
        .map_err(|e| tracing::debug!("Realtime location block unreadable: {}", e))
        .ok()?;
    let block = parsed.location?;
    let name = block.name?;
    let (lat, lon) = (block.lat?, block.lon?);

    let parts: Vec<&str> = name.split(", ").collect();
    let primary_name = parts.first().copied().unwrap_or_default().to_string();
    let country = parts.last().copied().unwrap_or_default().to_string();

    Some(LocationDetails {
        primary_name,
        city: pick_city(&parts).to_string(),
        country,
        coordinates: format!("{:.4}, {:.4}", lat, lon),
        full_name: name,
    })
}

/// Scan from the second-to-last token backwards for a plausible city.
fn pick_city<'a>(parts: &[&'a str]) -> &'a str {
    let Some(end) = parts.len().checked_sub(1) else {
        return "";
    };

    parts[..end]
        .iter()
        .rev()
        .copied()
        .find(|part| is_city_candidate(part))
        .unwrap_or_default()
}

fn is_city_candidate(part: &str) -> bool {
    let lower = part.to_lowercase();
    let numeric = !lower.is_empty() && lower.bytes().all(|b| b.is_ascii_digit());

    !numeric
        && !lower.contains(SUB_DISTRICT_MARKER)
        && !CARDINAL_DIRECTIONS.iter().any(|d| lower.contains(d))
        && lower.chars().count() > 2
}

/// Title-case each whitespace-separated word.
pub fn capitalize_words(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    let mut word: String = first.to_uppercase().collect();
                    word.push_str(&chars.as_str().to_lowercase());
                    word
                }
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
