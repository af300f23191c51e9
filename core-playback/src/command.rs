//! The command vocabulary the engine accepts. Commands arrive as a tagged
//! union through a single consumer (the `commandLock`-guarded dispatch
//! path), not as per-command subject streams.

use crate::state::{PlaybackOptions, PlaybackState};

#[derive(Debug, Clone, Default)]
pub struct PlayRequest {
    pub track_uri: Option<String>,
    pub context_uri: Option<String>,
    pub position_ms: Option<u64>,
    pub skip_to_index: Option<usize>,
    pub track_uid: Option<String>,
    pub options: Option<PlaybackOptions>,
}

#[derive(Debug, Clone)]
pub enum Command {
    Play(PlayRequest),
    Pause,
    Resume,
    Stop,
    Seek(u64),
    SkipNext,
    SkipPrevious,
    SetShuffle(bool),
    SetRepeatContext(bool),
    SetRepeatTrack(bool),
    AddToQueue(String),
    SetOptions(u8),
    Transfer(Box<PlaybackState>),
    UpdateContext(String),
}
