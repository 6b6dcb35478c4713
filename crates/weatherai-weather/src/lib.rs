//! Weather data for WeatherAI
//!
//! Fetches realtime conditions from Tomorrow.io and forecasts from the
//! application backend, caches raw payloads with a TTL, and normalizes them
//! into display-ready records.

pub mod cache;
pub mod condition;
pub mod fetcher;
pub mod forecast;
pub mod location;
pub mod service;
pub mod time;
pub mod types;

pub use cache::{CacheBackend, CacheEntry, CacheStore, FileBackend, MemoryBackend, ResponseCache};
pub use condition::WeatherCondition;
pub use fetcher::WeatherFetcher;
pub use forecast::{build_current, build_daily, build_hourly, build_sun_times};
pub use location::{build_location_details, capitalize_words};
pub use service::{Endpoints, LoadOutcome, WeatherService};
pub use time::LocalClock;
pub use types::*;
