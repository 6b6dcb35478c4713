//! UTC timestamp rendering in a fixed display time zone.
//!
//! Every timestamp is shown in one zone regardless of the queried location.
//! Coordinates are accepted by [`LocalClock::to_local_time`] but never select
//! a zone.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::types::Coordinates;

/// Placeholder rendered for missing or unparsable timestamps.
pub const NOT_AVAILABLE: &str = "N/A";

/// Display zone used when none is configured.
pub const DEFAULT_TIME_ZONE: Tz = chrono_tz::Asia::Kolkata;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalClock {
    tz: Tz,
}

impl Default for LocalClock {
    fn default() -> Self {
        Self::new(DEFAULT_TIME_ZONE)
    }
}

impl LocalClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Build from an IANA zone name such as `Asia/Kolkata`.
    pub fn from_name(name: &str) -> Option<Self> {
        name.parse::<Tz>().ok().map(Self::new)
    }

    pub fn time_zone(&self) -> Tz {
        self.tz
    }

    /// `HH:MM AM/PM` for an RFC 3339 timestamp, or `N/A`.
    pub fn to_local_time(&self, utc: &str, _coords: Option<Coordinates>) -> String {
        self.format(utc, "%I:%M %p")
    }

    /// Full weekday name, e.g. `Monday`.
    pub fn day_name(&self, utc: &str) -> String {
        self.format(utc, "%A")
    }

    /// Day of month and full month name, e.g. `17 November`.
    pub fn calendar_date(&self, utc: &str) -> String {
        self.format(utc, "%-d %B")
    }

    fn format(&self, utc: &str, pattern: &str) -> String {
        match parse_utc(utc) {
            Some(instant) => instant.with_timezone(&self.tz).format(pattern).to_string(),
            None => {
                tracing::debug!("Unparsable timestamp: {:?}", utc);
                NOT_AVAILABLE.to_string()
            }
        }
    }
}

fn parse_utc(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
