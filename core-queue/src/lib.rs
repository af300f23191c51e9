//! Holds tracks for the currently playing context: shuffle, user-queued
//! items, navigation, and the `needsMoreTracks` / `stateChanged` signals the
//! engine and UI layer observe.

pub mod error;
pub mod queue;
pub mod state;

pub use error::{QueueError, Result};
pub use queue::PlaybackQueue;
pub use state::{QueueState, MAX_NEXT_TRACKS, MAX_PREV_TRACKS};
