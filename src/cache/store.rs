// In-memory response cache keyed by request URL.
// Serves entries inside their TTL and falls back to stale entries when upstream fails.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::Result;

use super::transport::Transport;

/// Default freshness window for cached responses: 5 minutes.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// A cached upstream response.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// Full request identity (URL plus query string).
    pub key: String,
    /// The JSON document returned upstream.
    pub payload: Value,
    /// When the payload was fetched.
    pub fetched_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(key: impl Into<String>, payload: Value, fetched_at: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            payload,
            fetched_at,
        }
    }

    /// Age of the entry at `now`. Entries stamped in the future have zero age.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.fetched_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    /// Check if this entry is still inside its freshness window.
    pub fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        self.age(now) < ttl
    }
}

/// Where a returned payload came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
    /// Fetched from upstream during this call.
    Network,
    /// Served from cache inside the TTL.
    Fresh,
    /// Served from an expired entry because the upstream fetch failed.
    Stale,
}

/// Payload plus provenance returned by the cache.
#[derive(Debug, Clone)]
pub struct Cached<T> {
    pub data: T,
    pub source: CacheSource,
    pub fetched_at: DateTime<Utc>,
}

impl<T> Cached<T> {
    pub fn is_stale(&self) -> bool {
        self.source == CacheSource::Stale
    }
}

impl Cached<Value> {
    fn from_entry(entry: CacheEntry, source: CacheSource) -> Self {
        Cached {
            data: entry.payload,
            source,
            fetched_at: entry.fetched_at,
        }
    }
}

/// Keyed, time-bounded memoization in front of a [`Transport`].
///
/// Concurrent misses for the same key are not de-duplicated: each goes
/// upstream and the last response to arrive owns the slot. The map lock is
/// never held across the upstream await.
pub struct ResponseCache<T> {
    transport: T,
    entries: RwLock<HashMap<String, CacheEntry>>,
    default_ttl: Duration,
    max_entries: Option<usize>,
}

impl<T: Transport> ResponseCache<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            entries: RwLock::new(HashMap::new()),
            default_ttl: DEFAULT_TTL,
            max_entries: None,
        }
    }

    /// Set the TTL used by [`ResponseCache::get`].
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Bound the number of entries. Inserting a new key into a full cache
    /// evicts the entry with the oldest `fetched_at`.
    pub fn with_capacity_limit(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries.max(1));
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Fetch with the default TTL.
    pub async fn get(&self, key: &str) -> Result<Cached<Value>> {
        self.fetch(key, self.default_ttl).await
    }

    /// Fetch `key`, serving from cache while the entry is younger than `ttl`.
    pub async fn fetch(&self, key: &str, ttl: Duration) -> Result<Cached<Value>> {
        self.fetch_at(key, ttl, Utc::now()).await
    }

    /// Fetch `key` as of `now`.
    ///
    /// A fresh entry is returned without touching the transport. Otherwise the
    /// transport is asked; success replaces the entry, failure falls back to
    /// whatever entry exists for the key and only errors when there is none.
    pub async fn fetch_at(
        &self,
        key: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<Cached<Value>> {
        let existing = self.lookup(key);

        if let Some(entry) = &existing {
            if entry.is_fresh(ttl, now) {
                debug!(key, "cache hit");
                return Ok(Cached::from_entry(entry.clone(), CacheSource::Fresh));
            }
        }

        debug!(key, "cache miss, fetching");
        match self.transport.get_json(key).await {
            Ok(payload) => {
                self.store(CacheEntry::new(key, payload.clone(), now));
                Ok(Cached {
                    data: payload,
                    source: CacheSource::Network,
                    fetched_at: now,
                })
            }
            Err(err) => match existing.or_else(|| self.lookup(key)) {
                Some(entry) => {
                    warn!(key, error = %err, "stale fallback");
                    Ok(Cached::from_entry(entry, CacheSource::Stale))
                }
                None => {
                    warn!(key, error = %err, "fetch failed with nothing cached");
                    Err(err)
                }
            },
        }
    }

    /// Fetch and deserialize into a typed model.
    pub async fn fetch_json<D: DeserializeOwned>(
        &self,
        key: &str,
        ttl: Duration,
    ) -> Result<Cached<D>> {
        let cached = self.fetch(key, ttl).await?;
        let data = serde_json::from_value(cached.data)?;
        Ok(Cached {
            data,
            source: cached.source,
            fetched_at: cached.fetched_at,
        })
    }

    /// Remove one entry. Returns whether it existed.
    pub fn invalidate(&self, key: &str) -> bool {
        self.write().remove(key).is_some()
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.write().clear();
    }

    pub fn contains(&self, key: &str) -> bool {
        self.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn lookup(&self, key: &str) -> Option<CacheEntry> {
        self.read().get(key).cloned()
    }

    fn store(&self, entry: CacheEntry) {
        let mut entries = self.write();

        if let Some(max) = self.max_entries {
            if !entries.contains_key(&entry.key) && entries.len() >= max {
                let oldest = entries
                    .values()
                    .min_by_key(|e| e.fetched_at)
                    .map(|e| e.key.clone());
                if let Some(oldest) = oldest {
                    debug!(key = %oldest, "evicting oldest cache entry");
                    entries.remove(&oldest);
                }
            }
        }

        entries.insert(entry.key.clone(), entry);
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::testing::{MockTransport, Reply};
    use crate::error::DashError;
    use serde_json::json;

    const URL: &str = "https://api.github.com/users/octocat";

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    #[tokio::test]
    async fn test_second_fetch_within_ttl_skips_network() {
        let transport = MockTransport::new();
        transport.respond(URL, Reply::Json(json!({"login": "octocat"})));
        let cache = ResponseCache::new(transport);

        let first = cache.fetch_at(URL, DEFAULT_TTL, at(0)).await.unwrap();
        let second = cache.fetch_at(URL, DEFAULT_TTL, at(299)).await.unwrap();

        assert_eq!(first.source, CacheSource::Network);
        assert_eq!(second.source, CacheSource::Fresh);
        assert_eq!(first.data, second.data);
        assert_eq!(second.fetched_at, at(0));
        assert_eq!(cache.transport().calls(URL), 1);
    }

    #[tokio::test]
    async fn test_expired_entry_is_refetched() {
        let transport = MockTransport::new();
        transport.respond(URL, Reply::Json(json!({"v": 1})));
        let cache = ResponseCache::new(transport);

        cache.fetch_at(URL, DEFAULT_TTL, at(0)).await.unwrap();
        cache.transport().respond(URL, Reply::Json(json!({"v": 2})));

        // exactly at the TTL boundary the entry is no longer fresh
        let refreshed = cache.fetch_at(URL, DEFAULT_TTL, at(300)).await.unwrap();
        assert_eq!(refreshed.source, CacheSource::Network);
        assert_eq!(refreshed.data, json!({"v": 2}));
        assert_eq!(refreshed.fetched_at, at(300));
        assert_eq!(cache.transport().calls(URL), 2);
    }

    #[tokio::test]
    async fn test_failure_without_entry_propagates() {
        let transport = MockTransport::new();
        transport.respond(URL, Reply::Status(503));
        let cache = ResponseCache::new(transport);

        let err = cache.fetch_at(URL, DEFAULT_TTL, at(0)).await.unwrap_err();
        assert_eq!(err.status(), Some(503));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_failure_with_entry_returns_stale_payload() {
        let transport = MockTransport::new();
        transport.respond(URL, Reply::Json(json!({"login": "octocat"})));
        let cache = ResponseCache::new(transport);

        let original = cache.fetch_at(URL, DEFAULT_TTL, at(0)).await.unwrap();
        cache.transport().respond(URL, Reply::Status(500));

        let stale = cache.fetch_at(URL, DEFAULT_TTL, at(3600)).await.unwrap();
        assert!(stale.is_stale());
        assert_eq!(stale.data, original.data);
        assert_eq!(stale.fetched_at, at(0));

        // the stale entry is kept, not re-stamped
        assert_eq!(cache.lookup(URL).unwrap().fetched_at, at(0));
    }

    #[tokio::test]
    async fn test_not_found_without_entry_is_an_error() {
        let cache = ResponseCache::new(MockTransport::new());
        let err = cache.get("https://api.github.com/users/ghost").await.unwrap_err();
        assert!(matches!(err, DashError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_zero_ttl_always_refetches() {
        let transport = MockTransport::new();
        transport.respond(URL, Reply::Json(json!([])));
        let cache = ResponseCache::new(transport);

        cache.fetch_at(URL, Duration::ZERO, at(0)).await.unwrap();
        cache.fetch_at(URL, Duration::ZERO, at(0)).await.unwrap();
        assert_eq!(cache.transport().calls(URL), 2);
    }

    #[tokio::test]
    async fn test_invalidate_and_clear() {
        let transport = MockTransport::new();
        transport.respond("a", Reply::Json(json!(1)));
        transport.respond("b", Reply::Json(json!(2)));
        let cache = ResponseCache::new(transport);

        cache.get("a").await.unwrap();
        cache.get("b").await.unwrap();
        assert_eq!(cache.len(), 2);

        assert!(cache.invalidate("a"));
        assert!(!cache.invalidate("a"));
        assert!(!cache.contains("a"));
        assert!(cache.contains("b"));

        cache.get("a").await.unwrap();
        assert_eq!(cache.transport().calls("a"), 2);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_capacity_limit_evicts_oldest() {
        let transport = MockTransport::new();
        for key in ["a", "b", "c"] {
            transport.respond(key, Reply::Json(json!(key)));
        }
        let cache = ResponseCache::new(transport).with_capacity_limit(2);

        cache.fetch_at("a", DEFAULT_TTL, at(0)).await.unwrap();
        cache.fetch_at("b", DEFAULT_TTL, at(10)).await.unwrap();
        cache.fetch_at("c", DEFAULT_TTL, at(20)).await.unwrap();

        assert_eq!(cache.len(), 2);
        assert!(!cache.contains("a"));
        assert!(cache.contains("b"));
        assert!(cache.contains("c"));

        // replacing an existing key does not evict anything
        cache.fetch_at("b", Duration::ZERO, at(30)).await.unwrap();
        assert!(cache.contains("c"));
    }

    #[tokio::test]
    async fn test_fetch_json_deserializes() {
        #[derive(serde::Deserialize)]
        struct Login {
            login: String,
        }

        let transport = MockTransport::new();
        transport.respond(URL, Reply::Json(json!({"login": "octocat", "id": 1})));
        let cache = ResponseCache::new(transport);

        let user: Cached<Login> = cache.fetch_json(URL, DEFAULT_TTL).await.unwrap();
        assert_eq!(user.data.login, "octocat");
    }

    #[tokio::test]
    async fn test_transport_failure_falls_back_like_status_failure() {
        let transport = MockTransport::new();
        transport.respond(URL, Reply::Json(json!({"login": "octocat"})));
        transport.respond("https://api.github.com/users/other", Reply::Unreachable);
        let cache = ResponseCache::new(transport);

        cache.fetch_at(URL, DEFAULT_TTL, at(0)).await.unwrap();
        cache.transport().respond(URL, Reply::Unreachable);

        let stale = cache.fetch_at(URL, DEFAULT_TTL, at(600)).await.unwrap();
        assert_eq!(stale.source, CacheSource::Stale);
        assert_eq!(stale.data, json!({"login": "octocat"}));

        let err = cache
            .fetch_at("https://api.github.com/users/other", DEFAULT_TTL, at(600))
            .await
            .unwrap_err();
        assert!(matches!(err, DashError::Io(_)));
        assert_eq!(err.status(), None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_fetches_keep_map_consistent() {
        let transport = MockTransport::new();
        for i in 0..8 {
            transport.respond(&format!("key-{}", i), Reply::Json(json!(i)));
        }
        let cache = std::sync::Arc::new(ResponseCache::new(transport).with_capacity_limit(8));

        let mut tasks = tokio::task::JoinSet::new();
        for n in 0..64 {
            let cache = std::sync::Arc::clone(&cache);
            tasks.spawn(async move {
                let key = format!("key-{}", n % 8);
                let cached = cache.fetch(&key, Duration::ZERO).await.unwrap();
                assert_eq!(cached.data, json!(n % 8));
            });
        }
        while let Some(joined) = tasks.join_next().await {
            joined.unwrap();
        }

        assert_eq!(cache.len(), 8);
        for i in 0..8 {
            let key = format!("key-{}", i);
            assert_eq!(cache.lookup(&key).unwrap().payload, json!(i));
            assert_eq!(cache.transport().calls(&key), 8);
        }
    }

    #[test]
    fn test_future_stamped_entry_is_fresh() {
        let entry = CacheEntry::new(URL, json!(null), at(100));
        assert_eq!(entry.age(at(0)), Duration::ZERO);
        assert!(entry.is_fresh(DEFAULT_TTL, at(0)));
    }
}
