//! Remote collaborators a host wires up: the context-page service and the
//! extended-metadata batch service. Both are thin trait seams over whatever
//! transport the host uses (typically [`bridge_traits::http::HttpClient`]),
//! kept separate so resolution logic can be tested without real network
//! calls.

use crate::error::Result;
use async_trait::async_trait;
use bridge_traits::platform::PlatformSendSync;

/// One page of raw track references from the remote context service.
#[derive(Debug, Clone, Default)]
pub struct ContextPage {
    pub uris: Vec<String>,
    pub total_count: Option<usize>,
    pub next_page_token: Option<String>,
}

/// Fetches context pages (playlist/album/station contents) by URI.
#[async_trait]
pub trait ContextPageSource: PlatformSendSync {
    async fn fetch_page(&self, context_uri: &str, page_token: Option<&str>) -> Result<ContextPage>;
}

/// Raw metadata for one track as returned by the extended-metadata service.
#[derive(Debug, Clone, Default)]
pub struct RemoteTrackMetadata {
    pub uri: String,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub album_uri: Option<String>,
    pub artist_uri: Option<String>,
    pub duration_ms: Option<u64>,
    pub track_number: Option<u32>,
    pub disc_number: Option<u32>,
    pub is_playable: bool,
    pub is_explicit: bool,
}

/// Batch-fetches metadata for uncached URIs, in groups of at most 500.
#[async_trait]
pub trait MetadataBatchSource: PlatformSendSync {
    async fn fetch_batch(&self, uris: &[String]) -> Result<Vec<RemoteTrackMetadata>>;
}
