//! Resolves a context URI into an ordered, enriched track list, paging
//! transparently and tolerating partial metadata-service failures.

use crate::error::{ContextError, Result};
use crate::source::{ContextPageSource, MetadataBatchSource};
use crate::types::{is_infinite_context, ContextLoadResult, TrackDescriptor};
use core_cache::{MetadataCache, TrackCacheEntry};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{instrument, warn};

const DEFAULT_MAX_INITIAL: usize = 100;
const METADATA_BATCH_SIZE: usize = 500;

/// Resolves context URIs (playlists, albums, stations, single tracks) into
/// ordered, enriched track lists.
pub struct ContextResolver {
    context_source: Arc<dyn ContextPageSource>,
    metadata_source: Arc<dyn MetadataBatchSource>,
    cache: Arc<MetadataCache>,
}

impl ContextResolver {
    pub fn new(
        context_source: Arc<dyn ContextPageSource>,
        metadata_source: Arc<dyn MetadataBatchSource>,
        cache: Arc<MetadataCache>,
    ) -> Self {
        Self {
            context_source,
            metadata_source,
            cache,
        }
    }

    /// Resolves the first `max_initial` (default 100) tracks of a context.
    #[instrument(skip(self))]
    pub async fn load_context(
        &self,
        context_uri: &str,
        max_initial: Option<usize>,
        enrich: bool,
    ) -> Result<ContextLoadResult> {
        let max_initial = max_initial.unwrap_or(DEFAULT_MAX_INITIAL);
        let (uris, total_count, next_page_token) =
            self.collect_pages(context_uri, None, max_initial).await?;
        self.finish(uris, total_count, next_page_token, context_uri, enrich)
            .await
    }

    /// Continues paginated loading from a previously-returned token.
    ///
    /// The public contract names only `(token, enrich)`; `context_uri` is
    /// threaded through explicitly here so `isInfinite` can be recomputed
    /// without the resolver holding per-context state between calls.
    #[instrument(skip(self))]
    pub async fn load_next_page(
        &self,
        context_uri: &str,
        token: &str,
        enrich: bool,
    ) -> Result<ContextLoadResult> {
        let (uris, total_count, next_page_token) = self
            .collect_pages(context_uri, Some(token), usize::MAX)
            .await?;
        self.finish(uris, total_count, next_page_token, context_uri, enrich)
            .await
    }

    /// Re-enriches an already-built descriptor list, e.g. after a cache
    /// invalidation.
    pub async fn enrich_tracks(&self, descriptors: Vec<TrackDescriptor>) -> Vec<TrackDescriptor> {
        let uris: Vec<String> = descriptors.iter().map(|d| d.uri.clone()).collect();
        let resolved = self.resolve_metadata(&uris).await;
        descriptors
            .into_iter()
            .map(|mut d| {
                apply_metadata(&mut d, resolved.get(&d.uri));
                d
            })
            .collect()
    }

    async fn finish(
        &self,
        uris: Vec<String>,
        total_count: Option<usize>,
        next_page_token: Option<String>,
        context_uri: &str,
        enrich: bool,
    ) -> Result<ContextLoadResult> {
        let filtered: Vec<String> = uris.into_iter().filter(|u| !u.is_empty()).collect();

        let tracks = if enrich {
            let resolved = self.resolve_metadata(&filtered).await;
            filtered
                .into_iter()
                .map(|uri| {
                    let mut d = TrackDescriptor::new(uri.clone());
                    apply_metadata(&mut d, resolved.get(&uri));
                    d
                })
                .collect()
        } else {
            filtered.into_iter().map(TrackDescriptor::new).collect()
        };

        Ok(ContextLoadResult {
            tracks,
            total_count,
            next_page_token,
            is_infinite: is_infinite_context(context_uri),
        })
    }

    /// Fetches consecutive pages until `max_collected` URIs are gathered or
    /// no further page token is returned. The first page's failure fails
    /// the whole call; a later page's failure returns the partial list
    /// collected so far along with the token that failed, so the caller can
    /// retry from there.
    async fn collect_pages(
        &self,
        context_uri: &str,
        start_token: Option<&str>,
        max_collected: usize,
    ) -> Result<(Vec<String>, Option<usize>, Option<String>)> {
        let mut uris = Vec::new();
        let mut total_count = None;
        let mut page_token = start_token.map(|t| t.to_string());
        let mut is_first = true;

        loop {
            match self
                .context_source
                .fetch_page(context_uri, page_token.as_deref())
                .await
            {
                Ok(page) => {
                    is_first = false;
                    if total_count.is_none() {
                        total_count = page.total_count;
                    }
                    uris.extend(page.uris);
                    let next = page.next_page_token;
                    if uris.len() >= max_collected || next.is_none() {
                        return Ok((uris, total_count, next));
                    }
                    page_token = next;
                }
                Err(e) => {
                    if is_first {
                        return Err(ContextError::ContextUnavailable(e.to_string()));
                    }
                    warn!("page fetch failed mid-pagination, returning partial list: {}", e);
                    return Ok((uris, total_count, page_token));
                }
            }
        }
    }

    /// Looks up `uris` in the cache, batch-fetching and persisting anything
    /// missing in groups of at most 500. A batch failure leaves its tracks
    /// absent from the result (callers treat that as unplayable/unenriched).
    async fn resolve_metadata(&self, uris: &[String]) -> HashMap<String, TrackCacheEntry> {
        let mut resolved = self.cache.get_tracks(uris).await;
        let uncached: Vec<String> = uris
            .iter()
            .filter(|u| !resolved.contains_key(*u))
            .cloned()
            .collect();

        for chunk in uncached.chunks(METADATA_BATCH_SIZE) {
            match self.metadata_source.fetch_batch(chunk).await {
                Ok(metadatas) => {
                    let mut batch = Vec::with_capacity(metadatas.len());
                    for m in metadatas {
                        let entry = TrackCacheEntry {
                            title: m.title,
                            artist: m.artist,
                            album: m.album,
                            duration_ms: m.duration_ms,
                            is_playable: Some(m.is_playable),
                            ..TrackCacheEntry::new(m.uri.clone())
                        };
                        batch.push((m.uri, entry));
                    }
                    if let Err(e) = self.cache.set_tracks(batch).await {
                        warn!("failed to persist fetched metadata batch: {}", e);
                    }
                }
                Err(e) => {
                    warn!(
                        "metadata batch fetch failed, leaving {} tracks unenriched: {}",
                        chunk.len(),
                        e
                    );
                }
            }
        }

        if !uncached.is_empty() {
            resolved.extend(self.cache.get_tracks(&uncached).await);
        }
        resolved
    }
}

fn apply_metadata(descriptor: &mut TrackDescriptor, entry: Option<&TrackCacheEntry>) {
    match entry {
        Some(entry) => {
            descriptor.title = entry.title.clone();
            descriptor.artist = entry.artist.clone();
            descriptor.album = entry.album.clone();
            descriptor.duration_ms = entry.duration_ms;
            descriptor.is_playable = entry.is_playable.unwrap_or(true);
        }
        None => descriptor.is_playable = false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{ContextPage, RemoteTrackMetadata};
    use async_trait::async_trait;
    use core_cache::CacheConfig;
    use std::sync::Mutex as StdMutex;

    struct StaticPages(Vec<ContextPage>);

    #[async_trait]
    impl ContextPageSource for StaticPages {
        async fn fetch_page(&self, _uri: &str, page_token: Option<&str>) -> Result<ContextPage> {
            let index: usize = page_token.and_then(|t| t.parse().ok()).unwrap_or(0);
            self.0
                .get(index)
                .cloned()
                .ok_or_else(|| ContextError::ContextUnavailable("no such page".to_string()))
        }
    }

    struct StaticBatches(StdMutex<Vec<RemoteTrackMetadata>>);

    #[async_trait]
    impl MetadataBatchSource for StaticBatches {
        async fn fetch_batch(&self, uris: &[String]) -> Result<Vec<RemoteTrackMetadata>> {
            let all = self.0.lock().unwrap();
            Ok(all.iter().filter(|m| uris.contains(&m.uri)).cloned().collect())
        }
    }

    struct NullStore;

    #[async_trait]
    impl bridge_traits::store::DurableStore for NullStore {
        async fn get(&self, _key: &str) -> bridge_traits::error::Result<Option<Vec<u8>>> {
            Ok(None)
        }
        async fn put(&self, _key: &str, _value: Vec<u8>) -> bridge_traits::error::Result<()> {
            Ok(())
        }
        async fn delete(&self, _key: &str) -> bridge_traits::error::Result<()> {
            Ok(())
        }
        async fn keys_with_prefix(&self, _prefix: &str) -> bridge_traits::error::Result<Vec<String>> {
            Ok(Vec::new())
        }
    }

    fn resolver(pages: Vec<ContextPage>, metadata: Vec<RemoteTrackMetadata>) -> ContextResolver {
        let cache = Arc::new(MetadataCache::new(CacheConfig::default(), Arc::new(NullStore)));
        ContextResolver::new(
            Arc::new(StaticPages(pages)),
            Arc::new(StaticBatches(StdMutex::new(metadata))),
            cache,
        )
    }

    #[tokio::test]
    async fn single_page_context_resolves_and_enriches() {
        let pages = vec![ContextPage {
            uris: vec!["spotify:track:a".to_string(), "spotify:track:b".to_string()],
            total_count: Some(2),
            next_page_token: None,
        }];
        let metadata = vec![
            RemoteTrackMetadata {
                uri: "spotify:track:a".to_string(),
                title: Some("A".to_string()),
                is_playable: true,
                ..Default::default()
            },
            RemoteTrackMetadata {
                uri: "spotify:track:b".to_string(),
                title: Some("B".to_string()),
                is_playable: true,
                ..Default::default()
            },
        ];
        let resolver = resolver(pages, metadata);

        let result = resolver
            .load_context("spotify:playlist:p", None, true)
            .await
            .unwrap();

        assert_eq!(result.tracks.len(), 2);
        assert_eq!(result.tracks[0].title.as_deref(), Some("A"));
        assert!(result.next_page_token.is_none());
        assert!(!result.is_infinite);
    }

    #[tokio::test]
    async fn batch_failure_leaves_tracks_unenriched() {
        struct FailingBatches;
        #[async_trait]
        impl MetadataBatchSource for FailingBatches {
            async fn fetch_batch(&self, _uris: &[String]) -> Result<Vec<RemoteTrackMetadata>> {
                Err(ContextError::ContextUnavailable("down".to_string()))
            }
        }

        let pages = vec![ContextPage {
            uris: vec!["spotify:track:a".to_string()],
            total_count: Some(1),
            next_page_token: None,
        }];
        let cache = Arc::new(MetadataCache::new(CacheConfig::default(), Arc::new(NullStore)));
        let resolver = ContextResolver::new(Arc::new(StaticPages(pages)), Arc::new(FailingBatches), cache);

        let result = resolver
            .load_context("spotify:playlist:p", None, true)
            .await
            .unwrap();

        assert_eq!(result.tracks.len(), 1);
        assert!(result.tracks[0].title.is_none());
        assert!(!result.tracks[0].is_playable);
    }

    #[tokio::test]
    async fn first_page_failure_fails_the_call() {
        let resolver = resolver(Vec::new(), Vec::new());
        let err = resolver.load_context("spotify:playlist:p", None, true).await;
        assert!(matches!(err, Err(ContextError::ContextUnavailable(_))));
    }

    #[tokio::test]
    async fn station_uri_is_infinite() {
        let pages = vec![ContextPage {
            uris: vec!["spotify:track:a".to_string()],
            total_count: None,
            next_page_token: None,
        }];
        let resolver = resolver(pages, Vec::new());
        let result = resolver
            .load_context("spotify:station:x", None, false)
            .await
            .unwrap();
        assert!(result.is_infinite);
        assert!(result.total_count.is_none());
    }
}
