use serde::{Deserialize, Serialize};

/// Weather condition categories mapped from Tomorrow.io weather codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    Clear,
    PartlyCloudy,
    Rain,
    Drizzle,
    FreezingRain,
    Snow,
    Thunderstorm,
    #[default]
    Unknown,
}

impl WeatherCondition {
    /// Convert a Tomorrow.io weather code to a WeatherCondition.
    /// See: https://docs.tomorrow.io/reference/data-layers-weather-codes
    pub fn from_code(code: i64) -> Self {
        match code {
            1000 => Self::Clear,
            1100..=1102 => Self::PartlyCloudy,
            4000..=4201 => Self::Rain,
            5000..=5001 => Self::Drizzle,
            6000..=6201 => Self::FreezingRain,
            7000..=7102 => Self::Snow,
            8000.. => Self::Thunderstorm,
            _ => Self::Unknown,
        }
    }

    /// Classify an optional code; a missing code is `Unknown`.
    pub fn from_optional_code(code: Option<i64>) -> Self {
        code.map(Self::from_code).unwrap_or_default()
    }

    /// Get a human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::PartlyCloudy => "Partly Cloudy",
            Self::Rain => "Rain",
            Self::Drizzle => "Drizzle",
            Self::FreezingRain => "Freezing Rain",
            Self::Snow => "Snow",
            Self::Thunderstorm => "Thunderstorm",
            Self::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}
