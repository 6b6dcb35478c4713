//! Persistent response cache keyed by (location, data kind).
//!
//! The whole store lives in one JSON blob of the shape
//! `{ "<location>": { "realtime": {"data": .., "timestamp": ms}, "forecast": .. } }`.
//! It is read fully and rewritten fully on every mutation. Reads evict
//! expired and legacy entries and persist the eviction immediately.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use weatherai_core::WeatherError;

use crate::types::DataKind;

/// Maximum age of a cached response.
pub const CACHE_TTL: Duration = Duration::from_millis(600_000);

/// Well-known name the blob is stored under.
pub const CACHE_STORAGE_KEY: &str = "weatherCache";

/// File name of the blob for file-backed storage.
pub const CACHE_FILE_NAME: &str = "weather_cache.json";

/// Current time in epoch milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Normalize a location name into its cache key.
pub fn location_key(location: &str) -> String {
    location.to_lowercase()
}

/// Where the serialized store is kept.
pub trait CacheBackend: Send + Sync {
    /// Returns `None` when nothing has been stored yet.
    fn read(&self) -> Result<Option<String>, WeatherError>;

    fn write(&self, blob: &str) -> Result<(), WeatherError>;
}

/// Stores the blob as a JSON file.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `weather_cache.json` inside the given directory.
    pub fn in_dir(config_dir: &Path) -> Self {
        Self::new(config_dir.join(CACHE_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CacheBackend for FileBackend {
    fn read(&self) -> Result<Option<String>, WeatherError> {
        match std::fs::read_to_string(&self.path) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(WeatherError::Cache(format!(
                "Failed to read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    fn write(&self, blob: &str) -> Result<(), WeatherError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                WeatherError::Cache(format!("Failed to create cache directory: {}", e))
            })?;
        }
        std::fs::write(&self.path, blob).map_err(|e| {
            WeatherError::Cache(format!("Failed to write {}: {}", self.path.display(), e))
        })
    }
}

/// Keeps the blob in memory; clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    blob: Arc<Mutex<Option<String>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing blob (possibly malformed).
    pub fn with_contents(blob: impl Into<String>) -> Self {
        Self {
            blob: Arc::new(Mutex::new(Some(blob.into()))),
        }
    }

    /// Snapshot of the stored blob.
    pub fn contents(&self) -> Option<String> {
        self.blob.lock().clone()
    }
}

impl CacheBackend for MemoryBackend {
    fn read(&self) -> Result<Option<String>, WeatherError> {
        Ok(self.blob.lock().clone())
    }

    fn write(&self, blob: &str) -> Result<(), WeatherError> {
        *self.blob.lock() = Some(blob.to_string());
        Ok(())
    }
}

/// A timestamped upstream payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub data: Value,
    /// Creation time in epoch milliseconds
    pub timestamp: i64,
}

impl CacheEntry {
    /// Structural check: `None` for legacy entries that lack `data` or a
    /// numeric `timestamp`.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let data = object.get("data")?;
        let timestamp = object.get("timestamp")?;
        let timestamp = timestamp
            .as_i64()
            .or_else(|| timestamp.as_f64().map(|ms| ms as i64))?;

        Some(Self {
            data: data.clone(),
            timestamp,
        })
    }

    pub fn is_fresh_at(&self, now_ms: i64, ttl: Duration) -> bool {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        now_ms.saturating_sub(self.timestamp) < ttl_ms
    }
}

/// `location -> kind -> raw entry`. Entries stay raw JSON so legacy
/// shapes survive deserialization and can be detected on read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheStore(BTreeMap<String, BTreeMap<String, Value>>);

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Cached location keys.
    pub fn locations(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// The stored value as-is, without any freshness or structure check.
    pub fn raw_entry(&self, location: &str, kind: DataKind) -> Option<&Value> {
        self.0
            .get(&location_key(location))
            .and_then(|kinds| kinds.get(kind.as_str()))
    }

    pub fn insert_raw(&mut self, location: &str, kind: DataKind, value: Value) {
        self.0
            .entry(location_key(location))
            .or_default()
            .insert(kind.as_str().to_string(), value);
    }

    fn remove(&mut self, location: &str, kind: DataKind) -> Option<Value> {
        let key = location_key(location);
        let kinds = self.0.get_mut(&key)?;
        let removed = kinds.remove(kind.as_str());
        if kinds.is_empty() {
            self.0.remove(&key);
        }
        removed
    }
}

/// TTL cache over an injected [`CacheBackend`].
pub struct ResponseCache {
    backend: Box<dyn CacheBackend>,
    ttl: Duration,
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl ResponseCache {
    pub fn new(backend: impl CacheBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            ttl: CACHE_TTL,
        }
    }

    /// File-backed cache inside the application config directory.
    pub fn in_dir(config_dir: &Path) -> Self {
        Self::new(FileBackend::in_dir(config_dir))
    }

    /// Memory-only cache (for testing).
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Read the persisted store. Missing or malformed blobs yield an empty store.
    pub fn load(&self) -> CacheStore {
        let blob = match self.backend.read() {
            Ok(Some(blob)) => blob,
            Ok(None) => return CacheStore::new(),
            Err(e) => {
                tracing::warn!("Weather cache unreadable, starting empty: {}", e);
                return CacheStore::new();
            }
        };

        match serde_json::from_str(&blob) {
            Ok(store) => store,
            Err(e) => {
                tracing::warn!("Weather cache malformed, starting empty: {}", e);
                CacheStore::new()
            }
        }
    }

    /// Persist the full store, overwriting prior content.
    pub fn save(&self, store: &CacheStore) -> Result<(), WeatherError> {
        let blob = serde_json::to_string(store)
            .map_err(|e| WeatherError::Cache(format!("Failed to serialize cache: {}", e)))?;
        self.backend.write(&blob)
    }

    /// Fresh, well-formed entry for `(location, kind)`.
    ///
    /// Expired or legacy entries are removed and the store is persisted
    /// before returning `None`.
    pub fn get(
        &self,
        store: &mut CacheStore,
        location: &str,
        kind: DataKind,
    ) -> Option<CacheEntry> {
        self.get_at(store, location, kind, now_millis())
    }

    pub fn get_at(
        &self,
        store: &mut CacheStore,
        location: &str,
        kind: DataKind,
        now_ms: i64,
    ) -> Option<CacheEntry> {
        let raw = store.raw_entry(location, kind)?;

        match CacheEntry::from_value(raw) {
            Some(entry) if entry.is_fresh_at(now_ms, self.ttl) => return Some(entry),
            Some(entry) => tracing::debug!(
                "Cache expired for {} {} (age {} ms), evicting",
                location,
                kind,
                now_ms.saturating_sub(entry.timestamp)
            ),
            None => tracing::debug!("Clearing legacy cache entry for {} {}", location, kind),
        }

        store.remove(location, kind);
        self.persist(store);
        None
    }

    /// Store `data` stamped with the current time and persist.
    pub fn put(&self, store: &mut CacheStore, location: &str, kind: DataKind, data: Value) {
        self.put_at(store, location, kind, data, now_millis());
    }

    pub fn put_at(
        &self,
        store: &mut CacheStore,
        location: &str,
        kind: DataKind,
        data: Value,
        now_ms: i64,
    ) {
        store.insert_raw(
            location,
            kind,
            serde_json::json!({ "data": data, "timestamp": now_ms }),
        );
        self.persist(store);
    }

    fn persist(&self, store: &CacheStore) {
        if let Err(e) = self.save(store) {
            tracing::warn!("Failed to persist weather cache: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use serde_json::json;

    const NOW: i64 = 1_763_251_200_000;

    fn cache_with(backend: &MemoryBackend) -> ResponseCache {
        ResponseCache::new(backend.clone())
    }

    fn persisted(backend: &MemoryBackend) -> Value {
        serde_json::from_str(&backend.contents().expect("blob written")).unwrap()
    }

    #[test]
    fn test_load_missing_blob_is_empty() {
        let cache = ResponseCache::in_memory();
        assert!(cache.load().is_empty());
    }

    #[test]
    fn test_load_malformed_blob_is_empty() {
        let cache = ResponseCache::new(MemoryBackend::with_contents("{not json"));
        assert!(cache.load().is_empty());

        let cache = ResponseCache::new(MemoryBackend::with_contents("[1, 2, 3]"));
        assert!(cache.load().is_empty());
    }

    #[test]
    fn test_round_trip() {
        let backend = MemoryBackend::new();
        let cache = cache_with(&backend);
        let mut store = cache.load();
        let payload = json!({"data": {"values": {"temperature": 21.4}}});

        cache.put(&mut store, "paris", DataKind::Realtime, payload.clone());
        let entry = cache.get(&mut store, "paris", DataKind::Realtime).unwrap();
        assert_eq!(entry.data, payload);

        // A fresh load sees the persisted entry too
        let mut reloaded = cache.load();
        let entry = cache.get(&mut reloaded, "paris", DataKind::Realtime).unwrap();
        assert_eq!(entry.data, payload);
    }

    #[test]
    fn test_case_insensitive_keys() {
        let backend = MemoryBackend::new();
        let cache = cache_with(&backend);
        let mut store = CacheStore::new();

        cache.put(&mut store, "Paris", DataKind::Forecast, json!(1));
        assert!(cache.get(&mut store, "PARIS", DataKind::Forecast).is_some());
        assert_eq!(store.locations().collect::<Vec<_>>(), vec!["paris"]);
        assert!(persisted(&backend).get("paris").is_some());
    }

    #[test]
    fn test_kinds_are_independent() {
        let cache = ResponseCache::in_memory();
        let mut store = CacheStore::new();

        cache.put(&mut store, "delhi", DataKind::Realtime, json!("rt"));
        assert!(cache.get(&mut store, "delhi", DataKind::Forecast).is_none());
        assert!(cache.get(&mut store, "delhi", DataKind::Realtime).is_some());
    }

    #[test]
    fn test_fresh_just_before_ttl() {
        let cache = ResponseCache::in_memory();
        let mut store = CacheStore::new();
        cache.put_at(&mut store, "delhi", DataKind::Realtime, json!(1), NOW);

        let entry = cache.get_at(&mut store, "delhi", DataKind::Realtime, NOW + 599_999);
        assert_eq!(entry.map(|e| e.timestamp), Some(NOW));
    }

    #[test]
    fn test_expired_at_ttl_is_evicted_and_persisted() {
        let backend = MemoryBackend::new();
        let cache = cache_with(&backend);
        let mut store = CacheStore::new();
        cache.put_at(&mut store, "delhi", DataKind::Realtime, json!(1), NOW);
        cache.put_at(&mut store, "delhi", DataKind::Forecast, json!(2), NOW + 500_000);

        assert!(cache
            .get_at(&mut store, "delhi", DataKind::Realtime, NOW + 600_000)
            .is_none());
        assert!(store.raw_entry("delhi", DataKind::Realtime).is_none());
        assert!(store.raw_entry("delhi", DataKind::Forecast).is_some());

        let blob = persisted(&backend);
        assert!(blob["delhi"].get("realtime").is_none());
        assert_eq!(blob["delhi"]["forecast"]["data"], json!(2));
    }

    #[test]
    fn test_legacy_entries_are_evicted() {
        let legacy = json!({
            "mumbai": {
                "realtime": {"values": {"temperature": 30}},
                "forecast": {"data": {"timelines": {}}}
            },
            "pune": {
                "realtime": {"timestamp": NOW}
            }
        });
        let backend = MemoryBackend::with_contents(legacy.to_string());
        let cache = cache_with(&backend);
        let mut store = cache.load();

        assert!(cache.get_at(&mut store, "mumbai", DataKind::Realtime, NOW).is_none());
        assert!(cache.get_at(&mut store, "mumbai", DataKind::Forecast, NOW).is_none());
        assert!(cache.get_at(&mut store, "pune", DataKind::Realtime, NOW).is_none());
        assert!(store.is_empty());
        assert_eq!(persisted(&backend), json!({}));
    }

    #[test]
    fn test_non_numeric_timestamp_is_legacy() {
        let entry = json!({"data": 1, "timestamp": "yesterday"});
        assert!(CacheEntry::from_value(&entry).is_none());
        assert!(CacheEntry::from_value(&json!("just a string")).is_none());

        let float = json!({"data": null, "timestamp": 1_700_000_000_000.0});
        assert_eq!(
            CacheEntry::from_value(&float),
            Some(CacheEntry {
                data: Value::Null,
                timestamp: 1_700_000_000_000
            })
        );
    }

    #[test]
    fn test_custom_ttl() {
        let cache = ResponseCache::in_memory().with_ttl(Duration::from_secs(1));
        let mut store = CacheStore::new();
        cache.put_at(&mut store, "oslo", DataKind::Forecast, json!(1), NOW);

        assert!(cache.get_at(&mut store, "oslo", DataKind::Forecast, NOW + 999).is_some());
        assert!(cache.get_at(&mut store, "oslo", DataKind::Forecast, NOW + 1_000).is_none());
    }

    #[test]
    fn test_file_backend_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::in_dir(&dir.path().join("weatherai"));
        let mut store = cache.load();
        cache.put(&mut store, "Tokyo", DataKind::Realtime, json!({"ok": true}));

        let path = dir.path().join("weatherai").join(CACHE_FILE_NAME);
        assert!(path.exists());

        let reopened = ResponseCache::new(FileBackend::new(&path));
        let mut store = reopened.load();
        let entry = reopened.get(&mut store, "tokyo", DataKind::Realtime).unwrap();
        assert_eq!(entry.data, json!({"ok": true}));
    }

    #[test]
    fn test_file_backend_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::in_dir(dir.path());
        assert_eq!(backend.read().unwrap(), None);
    }
}
