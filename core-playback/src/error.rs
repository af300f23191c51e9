//! Error taxonomy for the playback engine.
//!
//! Setup failures (bad URI, missing decoder, no resolver for the context)
//! are returned synchronously from the command that triggered them.
//! Mid-playback failures never propagate through a command handler; they
//! flow out through the error channel the engine exposes instead.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlaybackError {
    #[error("context unavailable: {0}")]
    ContextUnavailable(String),

    #[error("no context resolver configured")]
    ContextResolverUnavailable,

    #[error("invalid uri: {0}")]
    InvalidUri(String),

    #[error("track unavailable: {0}")]
    TrackUnavailable(String),

    #[error("audio device unavailable: {0}")]
    AudioDeviceUnavailable(String),

    #[error("no decoder registered for this stream")]
    DecoderMissing,

    #[error("transient I/O error: {0}")]
    TransientIo(String),

    #[error("operation canceled")]
    Cancelled,

    #[error(transparent)]
    Cache(#[from] core_cache::CacheError),

    #[error(transparent)]
    Context(#[from] core_context::ContextError),

    #[error(transparent)]
    Queue(#[from] core_queue::QueueError),
}

impl PlaybackError {
    /// Retryable without any change in caller behavior.
    pub fn is_transient(&self) -> bool {
        matches!(self, PlaybackError::TransientIo(_) | PlaybackError::AudioDeviceUnavailable(_))
    }

    pub fn is_network_error(&self) -> bool {
        matches!(self, PlaybackError::TransientIo(_) | PlaybackError::ContextUnavailable(_))
    }

    /// `true` when this failure should cause the engine to auto-advance to
    /// the next track rather than stop outright.
    pub fn is_auto_advance(&self) -> bool {
        matches!(self, PlaybackError::TrackUnavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, PlaybackError>;

/// `Clone`-able snapshot of a [`PlaybackError`], broadcast to observers.
/// `PlaybackError` itself can't be `Clone` (its wrapped `CacheError` et al.
/// aren't), so the error channel carries this instead.
#[derive(Debug, Clone)]
pub struct ErrorEvent {
    pub message: String,
    pub transient: bool,
    pub auto_advance: bool,
}

impl From<&PlaybackError> for ErrorEvent {
    fn from(err: &PlaybackError) -> Self {
        Self {
            message: err.to_string(),
            transient: err.is_transient(),
            auto_advance: err.is_auto_advance(),
        }
    }
}
