//! The reactive playback state snapshot published to observers: a current
//! value plus a multicast of changes, not a reactive-streams pipeline (see
//! the crate-level docs for the rationale).

use core_context::TrackDescriptor;
use serde::{Deserialize, Serialize};

pub const OPTION_SHUFFLE: u8 = 1 << 0;
pub const OPTION_REPEAT_CONTEXT: u8 = 1 << 1;
pub const OPTION_REPEAT_TRACK: u8 = 1 << 2;

/// Shuffle/repeat bits as carried by `Play`'s `options` argument and the
/// `SetOptions` command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackOptions {
    pub shuffling: bool,
    pub repeating_context: bool,
    pub repeating_track: bool,
}

impl PlaybackOptions {
    pub fn from_bits(bits: u8) -> Self {
        Self {
            shuffling: bits & OPTION_SHUFFLE != 0,
            repeating_context: bits & OPTION_REPEAT_CONTEXT != 0,
            repeating_track: bits & OPTION_REPEAT_TRACK != 0,
        }
    }

    pub fn to_bits(self) -> u8 {
        let mut bits = 0;
        if self.shuffling {
            bits |= OPTION_SHUFFLE;
        }
        if self.repeating_context {
            bits |= OPTION_REPEAT_CONTEXT;
        }
        if self.repeating_track {
            bits |= OPTION_REPEAT_TRACK;
        }
        bits
    }
}

fn track_uri(track: Option<&TrackDescriptor>) -> Option<String> {
    track.map(|t| t.uri.clone())
}

/// Full snapshot of playback as observed by a UI/remote layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackState {
    pub track_uri: Option<String>,
    pub track_uid: Option<String>,
    pub album_uri: Option<String>,
    pub artist_uri: Option<String>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,

    pub context_uri: Option<String>,
    pub context_url: Option<String>,

    pub position_ms: u64,
    pub duration_ms: Option<u64>,

    pub is_playing: bool,
    pub is_paused: bool,
    pub is_buffering: bool,

    pub shuffling: bool,
    pub repeating_context: bool,
    pub repeating_track: bool,
    pub can_seek: bool,

    pub current_index: i64,
    pub prev_tracks: Vec<TrackDescriptor>,
    pub next_tracks: Vec<TrackDescriptor>,
    pub queue_revision: u64,

    pub playback_speed: f32,
    pub timestamp_ms: u64,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            track_uri: None,
            track_uid: None,
            album_uri: None,
            artist_uri: None,
            title: None,
            artist: None,
            album: None,
            context_uri: None,
            context_url: None,
            position_ms: 0,
            duration_ms: None,
            is_playing: false,
            is_paused: false,
            is_buffering: false,
            shuffling: false,
            repeating_context: false,
            repeating_track: false,
            can_seek: false,
            current_index: -1,
            prev_tracks: Vec::new(),
            next_tracks: Vec::new(),
            queue_revision: 0,
            playback_speed: 1.0,
            timestamp_ms: 0,
        }
    }
}

impl PlaybackState {
    pub fn stamp(&mut self) {
        self.timestamp_ms = core_async::time::now_millis();
    }

    pub fn set_current_track(&mut self, track: Option<&TrackDescriptor>) {
        self.track_uri = track_uri(track);
        self.track_uid = track.and_then(|t| t.uid.clone());
        self.album_uri = track.and_then(|t| t.album_uri.clone());
        self.artist_uri = track.and_then(|t| t.artist_uri.clone());
        self.title = track.and_then(|t| t.title.clone());
        self.artist = track.and_then(|t| t.artist.clone());
        self.album = track.and_then(|t| t.album.clone());
        self.duration_ms = track.and_then(|t| t.duration_ms);
    }
}
