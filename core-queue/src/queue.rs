//! Async-facing `PlaybackQueue`: a single lock around [`QueueState`], with
//! `needsMoreTracks`/`stateChanged` signals delivered after the lock is
//! released so a handler may call back into the queue without deadlocking.

use crate::error::Result;
use crate::state::QueueState;
use core_async::sync::{broadcast, Mutex};
use core_context::TrackDescriptor;
use tracing::instrument;

const SIGNAL_CHANNEL_CAPACITY: usize = 16;

pub struct PlaybackQueue {
    state: Mutex<QueueState>,
    needs_more_tracks_tx: broadcast::Sender<()>,
    state_changed_tx: broadcast::Sender<()>,
}

impl Default for PlaybackQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackQueue {
    pub fn new() -> Self {
        let (needs_more_tracks_tx, _) = broadcast::channel(SIGNAL_CHANNEL_CAPACITY);
        let (state_changed_tx, _) = broadcast::channel(SIGNAL_CHANNEL_CAPACITY);
        Self {
            state: Mutex::new(QueueState::default()),
            needs_more_tracks_tx,
            state_changed_tx,
        }
    }

    pub fn subscribe_needs_more_tracks(&self) -> broadcast::Receiver<()> {
        self.needs_more_tracks_tx.subscribe()
    }

    pub fn subscribe_state_changed(&self) -> broadcast::Receiver<()> {
        self.state_changed_tx.subscribe()
    }

    fn emit_state_changed(&self) {
        let _ = self.state_changed_tx.send(());
    }

    pub async fn set_context(&self, context_uri: String, is_infinite: bool, total_count: Option<usize>) {
        self.state.lock().await.set_context(context_uri, is_infinite, total_count);
        self.emit_state_changed();
    }

    #[instrument(skip(self, tracks))]
    pub async fn set_tracks(&self, tracks: Vec<TrackDescriptor>, start_index: usize) {
        self.state.lock().await.set_tracks(tracks, start_index);
        self.emit_state_changed();
    }

    pub async fn append_tracks(&self, tracks: Vec<TrackDescriptor>) {
        self.state.lock().await.append_tracks(tracks);
        self.emit_state_changed();
    }

    pub async fn clear(&self) {
        self.state.lock().await.clear();
        self.emit_state_changed();
    }

    pub async fn move_next(&self) -> Option<TrackDescriptor> {
        let (track, became_latched) = self.state.lock().await.move_next();
        if became_latched {
            let _ = self.needs_more_tracks_tx.send(());
        }
        if track.is_some() {
            self.emit_state_changed();
        }
        track
    }

    pub async fn move_previous(&self) -> Option<TrackDescriptor> {
        let track = self.state.lock().await.move_previous();
        if track.is_some() {
            self.emit_state_changed();
        }
        track
    }

    pub async fn skip_to(&self, index: usize) -> Result<Option<TrackDescriptor>> {
        let track = self.state.lock().await.skip_to(index)?;
        self.emit_state_changed();
        Ok(track)
    }

    pub async fn add_to_queue(&self, track: TrackDescriptor) -> String {
        let uid = self.state.lock().await.add_to_queue(track);
        self.emit_state_changed();
        uid
    }

    pub async fn remove_from_queue(&self, index: usize) -> Result<TrackDescriptor> {
        let track = self.state.lock().await.remove_from_queue(index)?;
        self.emit_state_changed();
        Ok(track)
    }

    pub async fn set_shuffle(&self, enabled: bool) {
        self.state.lock().await.set_shuffle(enabled);
        self.emit_state_changed();
    }

    pub async fn prev_tracks(&self) -> Vec<TrackDescriptor> {
        self.state.lock().await.prev_tracks()
    }

    pub async fn next_tracks(&self) -> Vec<TrackDescriptor> {
        self.state.lock().await.next_tracks()
    }

    pub async fn queue_revision(&self) -> u64 {
        self.state.lock().await.queue_revision()
    }

    pub async fn current_index(&self) -> i64 {
        self.state.lock().await.current_index
    }

    pub async fn current_track(&self) -> Option<TrackDescriptor> {
        self.state.lock().await.current_track().cloned()
    }

    pub async fn context_uri(&self) -> Option<String> {
        self.state.lock().await.context_uri.clone()
    }

    /// The full physical track list installed for the current context, in
    /// original page order (including tracks with `is_playable == false`).
    pub async fn context_tracks(&self) -> Vec<TrackDescriptor> {
        self.state.lock().await.context_tracks.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(uri: &str) -> TrackDescriptor {
        TrackDescriptor::new(uri.to_string())
    }

    fn tracks(n: usize) -> Vec<TrackDescriptor> {
        (0..n).map(|i| track(&format!("spotify:track:{i}"))).collect()
    }

    #[tokio::test]
    async fn needs_more_tracks_fires_once_then_clears_on_append() {
        let queue = PlaybackQueue::new();
        queue.set_tracks(tracks(6), 0).await;

        let mut rx = queue.subscribe_needs_more_tracks();
        for _ in 0..4 {
            queue.move_next().await;
        }
        assert!(rx.try_recv().is_err());

        // Force "more exists" by pretending the total is larger than what we hold.
        queue.state.lock().await.total_count = Some(100);
        queue.move_next().await;
        assert!(rx.try_recv().is_ok());

        queue.append_tracks(tracks(10)).await;
        // Latch cleared; observed state should allow firing again on next approach to the tail.
        assert!(!queue.state.lock().await.needs_more_latched);
    }

    #[tokio::test]
    async fn state_changed_emits_on_navigation() {
        let queue = PlaybackQueue::new();
        queue.set_tracks(tracks(3), 0).await;
        let mut rx = queue.subscribe_state_changed();
        let _ = rx.try_recv(); // drain the set_tracks emission

        queue.move_next().await;
        assert!(rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn user_queue_round_trips_through_async_api() {
        let queue = PlaybackQueue::new();
        queue.set_tracks(tracks(3), 0).await;
        let uid = queue.add_to_queue(track("spotify:track:x")).await;
        assert_eq!(uid, "q0");

        let next = queue.move_next().await.unwrap();
        assert_eq!(next.uri, "spotify:track:x");
    }
}
