//! Two-tier metadata cache: bounded in-memory LRU in front of a durable
//! key-value store, plus small bounded maps for audio keys, CDN URLs, and
//! head bytes.

use crate::aux::AuxCache;
use crate::config::CacheConfig;
use crate::entry::{CdnEntry, TrackCacheEntry};
use crate::error::{CacheError, Result};
use crate::stats::{CacheCounters, CacheStatistics};
use bridge_traits::store::DurableStore;
use core_async::sync::Mutex;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::{instrument, warn};

fn cold_key(uri: &str) -> String {
    format!("track:{uri}")
}

/// Authoritative cache for track metadata on the playback path.
pub struct MetadataCache {
    config: CacheConfig,
    cold: Arc<dyn DurableStore>,
    hot: Mutex<LruCache<String, TrackCacheEntry>>,
    audio_key: Mutex<AuxCache<(String, String), Vec<u8>>>,
    cdn: Mutex<AuxCache<String, CdnEntry>>,
    head: Mutex<AuxCache<String, Vec<u8>>>,
    counters: CacheCounters,
}

impl MetadataCache {
    pub fn new(config: CacheConfig, cold: Arc<dyn DurableStore>) -> Self {
        let hot_capacity = NonZeroUsize::new(config.max_hot).unwrap_or(NonZeroUsize::MIN);
        Self {
            audio_key: Mutex::new(AuxCache::new(config.max_aux)),
            cdn: Mutex::new(AuxCache::new(config.max_aux)),
            head: Mutex::new(AuxCache::new(config.max_aux)),
            hot: Mutex::new(LruCache::new(hot_capacity)),
            cold,
            config,
            counters: CacheCounters::default(),
        }
    }

    /// Fetches a single track, checking hot then cold, enriching with the
    /// audio-key/CDN/head sub-caches before returning. Cold-tier misses and
    /// errors are both treated as a plain miss.
    #[instrument(skip(self))]
    pub async fn get_track(&self, uri: &str) -> Option<TrackCacheEntry> {
        let now = core_async::time::now_secs() as i64;

        if let Some(entry) = self.hot.lock().await.get(uri).cloned() {
            self.counters.record_hot_hit();
            return Some(self.enrich(entry, now).await);
        }

        match self.cold.get(&cold_key(uri)).await {
            Ok(Some(bytes)) => match serde_json::from_slice::<TrackCacheEntry>(&bytes) {
                Ok(mut entry) => {
                    entry.touch(now);
                    self.hot.lock().await.put(uri.to_string(), entry.clone());
                    self.counters.record_cold_hit();
                    Some(self.enrich(entry, now).await)
                }
                Err(e) => {
                    warn!("failed to deserialize cached track {}: {}", uri, e);
                    self.counters.record_miss();
                    None
                }
            },
            Ok(None) => {
                self.counters.record_miss();
                None
            }
            Err(e) => {
                warn!("cold-tier read failed for {}: {}", uri, e);
                self.counters.record_miss();
                None
            }
        }
    }

    /// Fetches several tracks, preserving order (absent entries are skipped
    /// from the returned map but not from iteration order semantics for
    /// callers who re-zip against their URI list).
    pub async fn get_tracks(&self, uris: &[String]) -> std::collections::HashMap<String, TrackCacheEntry> {
        let mut out = std::collections::HashMap::with_capacity(uris.len());
        for uri in uris {
            if let Some(entry) = self.get_track(uri).await {
                out.insert(uri.clone(), entry);
            }
        }
        out
    }

    async fn enrich(&self, mut entry: TrackCacheEntry, now: i64) -> TrackCacheEntry {
        if entry.audio_key.is_none() {
            if let Some(file_id) = entry.cdn_url.as_ref().map(|_| entry.uri.clone()) {
                let key = (entry.uri.clone(), file_id);
                entry.audio_key = self.audio_key.lock().await.get(&key, now).cloned();
            }
        }
        if entry.cdn_url.is_none() || !entry.is_cdn_valid(now) {
            if let Some(cdn) = self.cdn.lock().await.get(&entry.uri, now) {
                entry.cdn_url = Some(cdn.url.clone());
                entry.cdn_expiry_unix = Some(cdn.expiry_unix);
            }
        }
        if entry.head_bytes.is_none() {
            entry.head_bytes = self.head.lock().await.get(&entry.uri, now).cloned();
        }
        entry
    }

    /// Writes a track to both tiers. Sub-cache fields are written to their
    /// respective bounded maps only when present on `entry`.
    #[instrument(skip(self, entry))]
    pub async fn set_track(&self, uri: &str, mut entry: TrackCacheEntry) -> Result<()> {
        let now = core_async::time::now_secs() as i64;
        entry.uri = uri.to_string();
        entry.touch(now);

        let bytes = serde_json::to_vec(&entry)
            .map_err(|e| CacheError::Serialization(e.to_string()))?;
        if let Err(e) = self.cold.put(&cold_key(uri), bytes).await {
            warn!("cold-tier write failed for {}: {}", uri, e);
            return Err(CacheError::Store(e.to_string()));
        }

        if let Some(key) = entry.audio_key.clone() {
            self.audio_key
                .lock()
                .await
                .insert((uri.to_string(), uri.to_string()), key, now, None);
        }
        if let (Some(url), Some(expiry)) = (entry.cdn_url.clone(), entry.cdn_expiry_unix) {
            self.cdn.lock().await.insert(
                uri.to_string(),
                CdnEntry {
                    url,
                    expiry_unix: expiry,
                    inserted_unix: now,
                },
                now,
                Some(expiry),
            );
        }
        if let Some(head) = entry.head_bytes.clone() {
            self.head
                .lock()
                .await
                .insert(uri.to_string(), head, now, None);
        }

        self.hot.lock().await.put(uri.to_string(), entry);
        Ok(())
    }

    pub async fn set_tracks(&self, batch: Vec<(String, TrackCacheEntry)>) -> Result<()> {
        for (uri, entry) in batch {
            self.set_track(&uri, entry).await?;
        }
        Ok(())
    }

    pub async fn get_audio_key(&self, track_uri: &str, file_id: &str) -> Option<Vec<u8>> {
        let now = core_async::time::now_secs() as i64;
        self.audio_key
            .lock()
            .await
            .get(&(track_uri.to_string(), file_id.to_string()), now)
            .cloned()
    }

    pub async fn set_audio_key(&self, track_uri: &str, file_id: &str, key: Vec<u8>) {
        let now = core_async::time::now_secs() as i64;
        self.audio_key.lock().await.insert(
            (track_uri.to_string(), file_id.to_string()),
            key,
            now,
            None,
        );
    }

    pub async fn get_cdn_url(&self, file_id: &str) -> Option<(String, i64)> {
        let now = core_async::time::now_secs() as i64;
        self.cdn
            .lock()
            .await
            .get(&file_id.to_string(), now)
            .map(|e| (e.url.clone(), e.expiry_unix))
    }

    pub async fn set_cdn_url(&self, file_id: &str, url: String, ttl_secs: u64) {
        let now = core_async::time::now_secs() as i64;
        let expiry = now + ttl_secs as i64;
        self.cdn.lock().await.insert(
            file_id.to_string(),
            CdnEntry {
                url,
                expiry_unix: expiry,
                inserted_unix: now,
            },
            now,
            Some(expiry),
        );
    }

    pub async fn get_head_data(&self, file_id: &str) -> Option<Vec<u8>> {
        let now = core_async::time::now_secs() as i64;
        self.head
            .lock()
            .await
            .get(&file_id.to_string(), now)
            .cloned()
    }

    pub async fn set_head_data(&self, file_id: &str, data: Vec<u8>) {
        let now = core_async::time::now_secs() as i64;
        self.head
            .lock()
            .await
            .insert(file_id.to_string(), data, now, None);
    }

    /// Drops expired CDN entries. The durable tier manages its own TTLs and
    /// is out of scope here.
    #[instrument(skip(self))]
    pub async fn cleanup_expired(&self) -> usize {
        let now = core_async::time::now_secs() as i64;
        self.cdn.lock().await.cleanup_expired(now)
    }

    pub async fn clear(&self) {
        self.hot.lock().await.clear();
        self.audio_key.lock().await.clear();
        self.cdn.lock().await.clear();
        self.head.lock().await.clear();
    }

    pub fn statistics(&self) -> CacheStatistics {
        self.counters.snapshot()
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::Result as BridgeResult;
    use core_async::sync::Mutex as StdMutex;
    use std::collections::HashMap as StdHashMap;

    struct InMemoryStore {
        data: StdMutex<StdHashMap<String, Vec<u8>>>,
    }

    impl InMemoryStore {
        fn new() -> Self {
            Self {
                data: StdMutex::new(StdHashMap::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl DurableStore for InMemoryStore {
        async fn get(&self, key: &str) -> BridgeResult<Option<Vec<u8>>> {
            Ok(self.data.lock().await.get(key).cloned())
        }

        async fn put(&self, key: &str, value: Vec<u8>) -> BridgeResult<()> {
            self.data.lock().await.insert(key.to_string(), value);
            Ok(())
        }

        async fn delete(&self, key: &str) -> BridgeResult<()> {
            self.data.lock().await.remove(key);
            Ok(())
        }

        async fn keys_with_prefix(&self, prefix: &str) -> BridgeResult<Vec<String>> {
            Ok(self
                .data
                .lock()
                .await
                .keys()
                .filter(|k| k.starts_with(prefix))
                .cloned()
                .collect())
        }
    }

    fn cache() -> MetadataCache {
        MetadataCache::new(CacheConfig::default(), Arc::new(InMemoryStore::new()))
    }

    #[tokio::test]
    async fn miss_then_hit_after_set() {
        let cache = cache();
        assert!(cache.get_track("spotify:track:a").await.is_none());

        let entry = TrackCacheEntry {
            title: Some("Song".to_string()),
            ..TrackCacheEntry::new("spotify:track:a")
        };
        cache.set_track("spotify:track:a", entry).await.unwrap();

        let fetched = cache.get_track("spotify:track:a").await.unwrap();
        assert_eq!(fetched.title.as_deref(), Some("Song"));

        let stats = cache.statistics();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hot_hits, 1);
    }

    #[tokio::test]
    async fn cold_tier_promotes_into_hot_on_read() {
        let store = Arc::new(InMemoryStore::new());
        let cache = MetadataCache::new(CacheConfig::default(), store.clone());

        let entry = TrackCacheEntry::new("spotify:track:b");
        let bytes = serde_json::to_vec(&entry).unwrap();
        store.put("track:spotify:track:b", bytes).await.unwrap();

        let fetched = cache.get_track("spotify:track:b").await;
        assert!(fetched.is_some());

        // Second lookup should hit hot, not cold.
        let _ = cache.get_track("spotify:track:b").await;
        let stats = cache.statistics();
        assert_eq!(stats.cold_hits, 1);
        assert_eq!(stats.hot_hits, 1);
    }

    #[tokio::test]
    async fn audio_key_and_head_round_trip() {
        let cache = cache();
        cache
            .set_audio_key("spotify:track:a", "file1", vec![1, 2, 3])
            .await;
        assert_eq!(
            cache.get_audio_key("spotify:track:a", "file1").await,
            Some(vec![1, 2, 3])
        );

        cache.set_head_data("file1", vec![9, 9]).await;
        assert_eq!(cache.get_head_data("file1").await, Some(vec![9, 9]));
    }

    #[tokio::test]
    async fn expired_cdn_entry_is_treated_as_miss() {
        let cache = cache();
        cache
            .set_cdn_url("file1", "https://cdn.example/f".to_string(), 0)
            .await;
        // TTL of 0 means expiry == now; a later lookup must observe a miss.
        core_async::time::sleep(std::time::Duration::from_millis(10)).await;
        assert!(cache.get_cdn_url("file1").await.is_none());
    }

    #[tokio::test]
    async fn clear_empties_every_tier() {
        let cache = cache();
        cache
            .set_track("spotify:track:a", TrackCacheEntry::new("spotify:track:a"))
            .await
            .unwrap();
        cache.set_head_data("file1", vec![1]).await;

        cache.clear().await;

        assert!(cache.get_track("spotify:track:a").await.is_none());
        assert!(cache.get_head_data("file1").await.is_none());
    }
}
