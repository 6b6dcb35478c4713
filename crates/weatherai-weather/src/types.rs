use serde::{Deserialize, Serialize};

use crate::condition::WeatherCondition;

/// Category of weather data cached independently per location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataKind {
    Realtime,
    Forecast,
}

impl DataKind {
    /// Key used for this kind inside the persisted cache blob
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Realtime => "realtime",
            Self::Forecast => "forecast",
        }
    }
}

impl std::fmt::Display for DataKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Geographic position reported by the upstream API
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// Current conditions from the realtime endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temperature: Option<i64>,
    pub apparent_temperature: Option<i64>,
    pub humidity: Option<i64>,
    pub wind_speed: Option<i64>,
    pub pressure: Option<i64>,
    pub uv_index: Option<f64>,
    pub visibility: Option<f64>,
    pub weather_code: Option<i64>,
    pub condition: WeatherCondition,
}

/// One hour of the 24-hour outlook
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyEntry {
    /// Local `HH:MM AM/PM`
    pub time: String,
    pub temperature: Option<i64>,
    pub weather_code: Option<i64>,
    pub condition: WeatherCondition,
    pub humidity: Option<i64>,
    pub wind_speed: Option<i64>,
    pub precipitation_chance: Option<i64>,
}

/// One day of the multi-day outlook
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyEntry {
    /// Weekday name, e.g. `Monday`
    pub day: String,
    /// Day and month, e.g. `17 November`
    pub date: String,
    pub temperature_avg: Option<i64>,
    pub weather_code: Option<i64>,
    pub condition: WeatherCondition,
    pub humidity: Option<i64>,
    /// Maximum gust; 0 when the provider omits it
    pub wind_speed: i64,
    /// Average precipitation probability; 0 when the provider omits it
    pub precipitation_chance: i64,
}

/// Local sunrise and sunset for the first forecast day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SunTimes {
    pub sunrise: String,
    pub sunset: String,
}

impl SunTimes {
    /// The `N/A` pair used when the forecast has no daily data.
    pub fn unavailable() -> Self {
        Self {
            sunrise: crate::time::NOT_AVAILABLE.to_string(),
            sunset: crate::time::NOT_AVAILABLE.to_string(),
        }
    }
}

impl Default for SunTimes {
    fn default() -> Self {
        Self::unavailable()
    }
}

/// Best-effort breakdown of the provider's composite place name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationDetails {
    pub full_name: String,
    pub primary_name: String,
    /// Empty when no token survives the filters
    pub city: String,
    pub country: String,
    /// `lat, lon` to four decimal places
    pub coordinates: String,
}

/// Everything one page load needs to display a city
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityWeather {
    /// City as requested (after default-city resolution)
    pub city: String,
    pub current: Option<CurrentConditions>,
    pub location: Option<LocationDetails>,
    pub hourly: Vec<HourlyEntry>,
    pub daily: Vec<DailyEntry>,
    pub sun_times: SunTimes,
    /// AI-written summary passed through from the forecast backend
    pub insight: Option<String>,
}

impl CityWeather {
    /// Page heading: the parsed primary name, else the request title-cased.
    pub fn heading(&self) -> String {
        match &self.location {
            Some(details) if !details.primary_name.is_empty() => details.primary_name.clone(),
            _ => crate::location::capitalize_words(&self.city),
        }
    }
}
