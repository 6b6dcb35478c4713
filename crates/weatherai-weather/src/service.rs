//! Page-load orchestration: fetch both payloads for a city and shape them.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde_json::Value;
use url::Url;
use weatherai_core::{ConfigError, WeatherConfig, WeatherError};

use crate::cache::ResponseCache;
use crate::fetcher::WeatherFetcher;
use crate::forecast::{build_current, build_daily, build_hourly, build_sun_times};
use crate::location::build_location_details;
use crate::time::LocalClock;
use crate::types::{CityWeather, DataKind};

/// Path of the forecast/insight route on the application backend.
const FORECAST_PATH: &str = "fetch-weather-forecast";

/// Result of a [`WeatherService::load_city`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Loaded(Box<CityWeather>),
    /// A newer load started before this one finished; its result was dropped.
    Superseded,
}

/// Upstream endpoints for both data kinds.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub realtime_url: Url,
    pub backend_url: Url,
    pub api_key: Option<String>,
}

impl Endpoints {
    pub fn from_config(config: &WeatherConfig) -> Result<Self, ConfigError> {
        let parse = |field: &str, value: &str| {
            Url::parse(value).map_err(|e| ConfigError::InvalidUrl {
                field: field.to_string(),
                reason: e.to_string(),
            })
        };

        Ok(Self {
            realtime_url: parse("weather.realtime_url", &config.realtime_url)?,
            backend_url: parse("weather.backend_url", &config.backend_url)?,
            api_key: config.api_key.clone(),
        })
    }

    /// `{realtime_url}?location=<city>&apikey=<key>`
    pub fn realtime(&self, city: &str) -> Url {
        let mut url = self.realtime_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("location", city);
            if let Some(key) = &self.api_key {
                query.append_pair("apikey", key);
            }
        }
        url
    }

    /// `{backend_url}/fetch-weather-forecast?locationName=<city>`
    pub fn forecast(&self, city: &str) -> Result<Url, WeatherError> {
        let mut base = self.backend_url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let mut url = base
            .join(FORECAST_PATH)
            .map_err(|e| WeatherError::Misconfigured(e.to_string()))?;
        url.query_pairs_mut().append_pair("locationName", city);
        Ok(url)
    }
}

/// Loads and shapes weather for one city at a time.
///
/// Every [`load_city`](Self::load_city) takes a new generation; a load that
/// finishes after a newer one has started resolves to
/// [`LoadOutcome::Superseded`] instead of its data or error.
#[derive(Debug)]
pub struct WeatherService {
    fetcher: WeatherFetcher,
    endpoints: Endpoints,
    clock: LocalClock,
    default_city: String,
    generation: AtomicU64,
}

impl WeatherService {
    pub fn new(
        fetcher: WeatherFetcher,
        endpoints: Endpoints,
        clock: LocalClock,
        default_city: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            endpoints,
            clock,
            default_city: default_city.into(),
            generation: AtomicU64::new(0),
        }
    }

    /// Wire a service from configuration around an injected cache.
    pub fn from_config(config: &WeatherConfig, cache: ResponseCache) -> Result<Self, WeatherError> {
        let endpoints =
            Endpoints::from_config(config).map_err(|e| WeatherError::Misconfigured(e.to_string()))?;
        let clock = LocalClock::from_name(&config.display_time_zone)
            .ok_or_else(|| ConfigError::UnknownTimeZone(config.display_time_zone.clone()))
            .map_err(|e| WeatherError::Misconfigured(e.to_string()))?;
        let cache = cache.with_ttl(Duration::from_secs(config.cache_ttl_secs));
        let fetcher = WeatherFetcher::with_timeout(
            cache,
            config.request_timeout_secs.map(Duration::from_secs),
        )?;

        Ok(Self::new(fetcher, endpoints, clock, config.default_city.clone()))
    }

    pub fn clock(&self) -> &LocalClock {
        &self.clock
    }

    /// The requested city, or the default when blank.
    pub fn resolve_city<'a>(&'a self, requested: &'a str) -> &'a str {
        let trimmed = requested.trim();
        if trimmed.is_empty() {
            &self.default_city
        } else {
            trimmed
        }
    }

    /// Fetch realtime and forecast data for `city` and shape it for display.
    ///
    /// Either request failing fails the whole load; partial data is never
    /// returned.
    pub async fn load_city(&self, city: &str) -> Result<LoadOutcome, WeatherError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let city = self.resolve_city(city).to_string();
        tracing::info!("Loading weather for {} (generation {})", city, generation);

        let result = self.fetch_both(&city).await;

        let latest = self.generation.load(Ordering::SeqCst);
        if latest != generation {
            tracing::debug!(
                "Discarding weather for {} (generation {}, latest {})",
                city,
                generation,
                latest
            );
            return Ok(LoadOutcome::Superseded);
        }

        let (realtime, forecast) = result?;
        Ok(LoadOutcome::Loaded(Box::new(self.shape(city, &realtime, &forecast))))
    }

    async fn fetch_both(&self, city: &str) -> Result<(Value, Value), WeatherError> {
        let realtime_url = self.endpoints.realtime(city);
        let forecast_url = self.endpoints.forecast(city)?;

        tokio::try_join!(
            self.fetcher
                .fetch(city, DataKind::Realtime, realtime_url.as_str()),
            self.fetcher
                .fetch(city, DataKind::Forecast, forecast_url.as_str())
        )
    }

    /// Normalize raw payloads; the forecast envelope is `{data, insight}`.
    fn shape(&self, city: String, realtime: &Value, forecast: &Value) -> CityWeather {
        let body = forecast.get("data");
        CityWeather {
            city,
            current: build_current(Some(realtime)),
            location: build_location_details(Some(realtime)),
            hourly: build_hourly(body, &self.clock),
            daily: build_daily(body, &self.clock),
            sun_times: build_sun_times(body, &self.clock),
            insight: forecast
                .get("insight")
                .and_then(Value::as_str)
                .map(str::to_string),
        }
    }
}
