//! Data model for resolved playback contexts.

use serde::{Deserialize, Serialize};

/// Identity plus enrichable fields for one track. Two descriptors are equal
/// iff their `uri` matches; `uid` only distinguishes queue entries for
/// display (e.g. the same track appearing twice in a playlist).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackDescriptor {
    pub uri: String,
    pub uid: Option<String>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub album_uri: Option<String>,
    pub artist_uri: Option<String>,
    pub duration_ms: Option<u64>,
    pub added_at: Option<i64>,
    pub track_number: Option<u32>,
    pub disc_number: Option<u32>,
    pub is_playable: bool,
    pub is_explicit: bool,
    pub is_user_queued: bool,
}

impl TrackDescriptor {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            uid: None,
            title: None,
            artist: None,
            album: None,
            album_uri: None,
            artist_uri: None,
            duration_ms: None,
            added_at: None,
            track_number: None,
            disc_number: None,
            is_playable: true,
            is_explicit: false,
            is_user_queued: false,
        }
    }
}

impl PartialEq for TrackDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.uri == other.uri
    }
}

/// Handle to a resolved context, minted on `loadContext` and discarded on
/// the next context load.
#[derive(Debug, Clone)]
pub struct ContextHandle {
    pub context_uri: String,
    pub is_infinite: bool,
    pub total_count: Option<usize>,
    pub next_page_token: Option<String>,
}

/// Result of resolving a context page, whether the first page or a
/// continuation.
#[derive(Debug, Clone)]
pub struct ContextLoadResult {
    pub tracks: Vec<TrackDescriptor>,
    pub total_count: Option<usize>,
    pub next_page_token: Option<String>,
    pub is_infinite: bool,
}

/// `true` when `context_uri` denotes a station/radio/autoplay context with
/// no natural end, matched case-insensitively.
pub fn is_infinite_context(context_uri: &str) -> bool {
    let lower = context_uri.to_ascii_lowercase();
    lower.contains(":station:") || lower.contains(":radio:") || lower.contains(":autoplay:")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_equality_ignores_uid() {
        let mut a = TrackDescriptor::new("spotify:track:x");
        a.uid = Some("q0".to_string());
        let b = TrackDescriptor::new("spotify:track:x");
        assert_eq!(a, b);
    }

    #[test]
    fn infinite_context_detection_is_case_insensitive() {
        assert!(is_infinite_context("spotify:station:abc"));
        assert!(is_infinite_context("spotify:STATION:abc"));
        assert!(is_infinite_context("spotify:radio:abc"));
        assert!(is_infinite_context("spotify:autoplay:abc"));
        assert!(!is_infinite_context("spotify:playlist:abc"));
    }
}
