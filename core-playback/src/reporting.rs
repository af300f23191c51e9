//! Reporting-event schema: session/playback identity plus the transition
//! metrics payload emitted as tracks start and end. Identities are minted
//! with a session on every context-URI change and a playback id on every
//! track start.

use async_trait::async_trait;
use bridge_traits::platform::PlatformSendSync;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 32 lowercase hex characters, matching the shape of identifiers the
/// playback-reporting backend expects.
pub fn new_hex_id() -> String {
    Uuid::new_v4().simple().to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportingSession {
    pub session_id: String,
    pub context_uri: String,
    pub context_size: Option<usize>,
}

impl ReportingSession {
    pub fn new(context_uri: String, context_size: Option<usize>) -> Self {
        Self {
            session_id: new_hex_id(),
            context_uri,
            context_size,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackInterval {
    pub start_ms: u64,
    pub end_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StartReason {
    PlayBtn,
    FwdBtn,
    BackBtn,
    Transfer,
    Autoplay,
    Remote,
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    TrackDone,
    FwdBtn,
    BackBtn,
    EndPlay,
    Remote,
    Other(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub duration_ms: Option<u64>,
    pub decoded_length: Option<u64>,
    pub bitrate: Option<u32>,
    pub encoding: Option<String>,
    pub transition: Option<String>,
    pub preloaded_audio_key: bool,
    pub audio_key_time_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportingPlayback {
    pub playback_id: String,
    pub session_id: String,
    pub track_id: String,
    pub start_reason: StartReason,
    pub end_reason: Option<EndReason>,
    pub intervals: Vec<PlaybackInterval>,
    pub player_info: PlayerInfo,
}

impl ReportingPlayback {
    pub fn new(session_id: String, track_id: String, start_reason: StartReason) -> Self {
        Self {
            playback_id: new_hex_id(),
            session_id,
            track_id,
            start_reason,
            end_reason: None,
            intervals: Vec::new(),
            player_info: PlayerInfo::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackTransitionMetrics {
    pub track_id: String,
    pub playback_id: String,
    pub context_uri: String,
    pub source_start: String,
    pub reason_start: StartReason,
    pub source_end: String,
    pub reason_end: EndReason,
    pub intervals: Vec<PlaybackInterval>,
    pub player: PlayerInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReportingEvent {
    NewSessionId {
        session_id: String,
        context_uri: String,
        context_size: Option<usize>,
    },
    NewPlaybackId {
        session_id: String,
        playback_id: String,
    },
    TrackTransition {
        device_id: Option<String>,
        last_command_device: Option<String>,
        metrics: TrackTransitionMetrics,
    },
}

/// Host-provided sink for reporting events. Delivery failures are logged and
/// swallowed by the engine; reporting is best-effort and never blocks or
/// fails playback.
#[async_trait]
pub trait ReportingSink: PlatformSendSync {
    async fn report(&self, event: ReportingEvent);
}

/// A sink that drops every event, for deployments (or tests) with nothing
/// wired up for playback reporting.
pub struct NullReportingSink;

#[async_trait]
impl ReportingSink for NullReportingSink {
    async fn report(&self, _event: ReportingEvent) {}
}
