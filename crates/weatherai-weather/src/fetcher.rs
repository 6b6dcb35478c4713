//! Cache-or-fetch for a single (location, kind) pair.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use reqwest::Client;
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::instrument;
use weatherai_core::{NetworkError, ReqwestErrorExt, WeatherError};

use crate::cache::{location_key, ResponseCache};
use crate::types::DataKind;

type FetchResult = Result<Value, NetworkError>;
type InFlight = Arc<OnceCell<FetchResult>>;

/// Serves payloads from the [`ResponseCache`] and falls back to a live GET.
///
/// Concurrent fetches for the same location and kind share one request.
#[derive(Debug)]
pub struct WeatherFetcher {
    client: Client,
    cache: Mutex<ResponseCache>,
    in_flight: Mutex<HashMap<(String, DataKind), InFlight>>,
}

impl WeatherFetcher {
    /// Fetcher with the HTTP client's default timeout behaviour.
    pub fn new(cache: ResponseCache) -> Result<Self, WeatherError> {
        Self::with_timeout(cache, None)
    }

    pub fn with_timeout(
        cache: ResponseCache,
        timeout: Option<Duration>,
    ) -> Result<Self, WeatherError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| WeatherError::Network(e.into_network_error()))?;

        Ok(Self::with_client(client, cache))
    }

    pub fn with_client(client: Client, cache: ResponseCache) -> Self {
        Self {
            client,
            cache: Mutex::new(cache),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Return the payload for `(location, kind)`, fetching `url` on a cache miss.
    ///
    /// A hit makes no network call. A miss makes exactly one GET and, on
    /// success, one cache write. Failures are returned as-is: no retry and no
    /// fallback to stale data.
    #[instrument(skip(self, url), level = "debug")]
    pub async fn fetch(
        &self,
        location: &str,
        kind: DataKind,
        url: &str,
    ) -> Result<Value, WeatherError> {
        let key = location_key(location);

        if let Some(data) = self.cached(&key, kind) {
            tracing::debug!("Serving {} for {} from cache", kind, key);
            return Ok(data);
        }

        let slot_key = (key.clone(), kind);
        let slot = self
            .in_flight
            .lock()
            .entry(slot_key.clone())
            .or_default()
            .clone();

        let result = slot
            .get_or_init(|| self.fetch_live(&key, kind, url))
            .await
            .clone();

        {
            let mut in_flight = self.in_flight.lock();
            if in_flight
                .get(&slot_key)
                .is_some_and(|current| Arc::ptr_eq(current, &slot))
            {
                in_flight.remove(&slot_key);
            }
        }

        result.map_err(WeatherError::Network)
    }

    fn cached(&self, key: &str, kind: DataKind) -> Option<Value> {
        let cache = self.cache.lock();
        let mut store = cache.load();
        cache.get(&mut store, key, kind).map(|entry| entry.data)
    }

    async fn fetch_live(&self, key: &str, kind: DataKind, url: &str) -> FetchResult {
        tracing::info!("Fetching {} weather for {}", kind, key);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| {
                let err = e.into_network_error();
                tracing::warn!("{} request for {} failed: {}", kind, key, err);
                err
            })?;

        let data: Value = response.json().await.map_err(|e| {
            tracing::warn!("{} response for {} was not JSON: {}", kind, key, e);
            NetworkError::InvalidResponse(e.to_string())
        })?;

        let cache = self.cache.lock();
        let mut store = cache.load();
        cache.put(&mut store, key, kind, data.clone());

        Ok(data)
    }
}
