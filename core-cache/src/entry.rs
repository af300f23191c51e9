//! Cache entry value types.

use serde::{Deserialize, Serialize};

/// Cached track metadata plus whatever sub-cache fields have been populated.
///
/// Not every field needs to be present — `get_track` enriches an entry from
/// the audio-key/CDN/head sub-caches only with whatever those hold.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackCacheEntry {
    pub uri: String,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub duration_ms: Option<u64>,
    pub is_playable: Option<bool>,

    pub audio_key: Option<Vec<u8>>,
    pub cdn_url: Option<String>,
    pub cdn_expiry_unix: Option<i64>,
    pub head_bytes: Option<Vec<u8>>,

    pub last_accessed_unix: i64,
}

impl TrackCacheEntry {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            ..Default::default()
        }
    }

    /// `true` when a CDN URL is present and its expiry is still in the future.
    pub fn is_cdn_valid(&self, now_unix: i64) -> bool {
        match (self.cdn_url.as_ref(), self.cdn_expiry_unix) {
            (Some(_), Some(expiry)) => expiry > now_unix,
            _ => false,
        }
    }

    pub fn touch(&mut self, now_unix: i64) {
        self.last_accessed_unix = now_unix;
    }
}

/// CDN URL entry with its own expiry, tracked independently of the track's
/// other fields so a CDN refresh doesn't require re-fetching metadata.
#[derive(Debug, Clone)]
pub struct CdnEntry {
    pub url: String,
    pub expiry_unix: i64,
    pub inserted_unix: i64,
}

impl CdnEntry {
    pub fn is_expired(&self, now_unix: i64) -> bool {
        self.expiry_unix <= now_unix
    }
}
