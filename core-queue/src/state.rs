//! Pure queue state and navigation logic, kept free of locking/async so it
//! can be unit-tested directly.

use core_context::TrackDescriptor;
use rand::seq::SliceRandom;
use rand::thread_rng;
use std::collections::hash_map::DefaultHasher;
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};

pub const MAX_PREV_TRACKS: usize = 16;
pub const MAX_NEXT_TRACKS: usize = 48;
const NEEDS_MORE_THRESHOLD: usize = 5;

#[derive(Debug, Default)]
pub struct QueueState {
    pub context_uri: Option<String>,
    pub is_infinite: bool,
    pub total_count: Option<usize>,
    pub context_tracks: Vec<TrackDescriptor>,
    pub user_queue: VecDeque<TrackDescriptor>,
    pub shuffled_indices: Option<Vec<usize>>,
    /// -1 when empty/unstarted, otherwise a valid index into the logical order.
    pub current_index: i64,
    pub user_queue_played: u64,
    pub queue_uid_counter: u64,
    pub needs_more_latched: bool,
}

impl QueueState {
    pub fn set_context(&mut self, context_uri: String, is_infinite: bool, total_count: Option<usize>) {
        self.context_uri = Some(context_uri);
        self.is_infinite = is_infinite;
        self.total_count = total_count;
    }

    pub fn set_tracks(&mut self, tracks: Vec<TrackDescriptor>, start_index: usize) {
        self.context_tracks = tracks;
        self.shuffled_indices = None;
        self.needs_more_latched = false;
        self.current_index = if self.context_tracks.is_empty() {
            -1
        } else {
            start_index.min(self.context_tracks.len() - 1) as i64
        };
    }

    pub fn append_tracks(&mut self, tracks: Vec<TrackDescriptor>) {
        let start = self.context_tracks.len();
        self.context_tracks.extend(tracks);
        if let Some(shuffled) = &mut self.shuffled_indices {
            let mut rng = thread_rng();
            let mut new_indices: Vec<usize> = (start..self.context_tracks.len()).collect();
            new_indices.shuffle(&mut rng);
            shuffled.extend(new_indices);
        }
        self.needs_more_latched = false;
    }

    pub fn clear(&mut self) {
        *self = QueueState::default();
        self.current_index = -1;
    }

    /// Logical position -> index into `context_tracks`.
    fn physical_index(&self, logical: usize) -> Option<usize> {
        match &self.shuffled_indices {
            Some(shuffled) => shuffled.get(logical).copied(),
            None => {
                if logical < self.context_tracks.len() {
                    Some(logical)
                } else {
                    None
                }
            }
        }
    }

    fn track_at_logical(&self, logical: usize) -> Option<&TrackDescriptor> {
        self.physical_index(logical).map(|p| &self.context_tracks[p])
    }

    pub fn current_track(&self) -> Option<&TrackDescriptor> {
        if self.current_index < 0 {
            None
        } else {
            self.track_at_logical(self.current_index as usize)
        }
    }

    /// Returns `(track, became_latched)` so the caller can decide whether to
    /// emit `needsMoreTracks` outside the lock.
    pub fn move_next(&mut self) -> (Option<TrackDescriptor>, bool) {
        if let Some(track) = self.user_queue.pop_front() {
            self.user_queue_played += 1;
            return (Some(track), false);
        }

        let next_logical = if self.current_index < 0 {
            0
        } else {
            self.current_index as usize + 1
        };

        match self.track_at_logical(next_logical) {
            Some(track) => {
                self.current_index = next_logical as i64;
                let track = track.clone();
                let became_latched = self.maybe_latch_needs_more();
                (Some(track), became_latched)
            }
            None => (None, false),
        }
    }

    pub fn move_previous(&mut self) -> Option<TrackDescriptor> {
        if self.current_index <= 0 {
            return None;
        }
        self.current_index -= 1;
        self.current_track().cloned()
    }

    pub fn skip_to(&mut self, index: usize) -> Result<Option<TrackDescriptor>, crate::error::QueueError> {
        if index >= self.context_tracks.len() {
            return Err(crate::error::QueueError::IndexOutOfBounds {
                index,
                len: self.context_tracks.len(),
            });
        }
        self.current_index = index as i64;
        Ok(self.current_track().cloned())
    }

    pub fn add_to_queue(&mut self, mut track: TrackDescriptor) -> String {
        let uid = format!("q{}", self.queue_uid_counter);
        self.queue_uid_counter += 1;
        track.uid = Some(uid.clone());
        track.is_user_queued = true;
        self.user_queue.push_back(track);
        uid
    }

    pub fn remove_from_queue(&mut self, index: usize) -> Result<TrackDescriptor, crate::error::QueueError> {
        if index >= self.user_queue.len() {
            return Err(crate::error::QueueError::IndexOutOfBounds {
                index,
                len: self.user_queue.len(),
            });
        }
        Ok(self.user_queue.remove(index).expect("bounds checked above"))
    }

    /// Enables shuffle: Fisher-Yates over `[0, N)` with the currently
    /// playing index moved to the front. Disabling restores `current_index`
    /// to the natural index of the current track.
    pub fn set_shuffle(&mut self, enabled: bool) {
        if enabled {
            if self.context_tracks.is_empty() {
                self.shuffled_indices = Some(Vec::new());
                return;
            }
            let current_physical = self
                .physical_index(self.current_index.max(0) as usize)
                .unwrap_or(0);

            let mut indices: Vec<usize> = (0..self.context_tracks.len()).collect();
            indices.retain(|&i| i != current_physical);
            let mut rng = thread_rng();
            indices.shuffle(&mut rng);

            let mut permutation = Vec::with_capacity(self.context_tracks.len());
            permutation.push(current_physical);
            permutation.extend(indices);

            self.shuffled_indices = Some(permutation);
            self.current_index = 0;
        } else if let Some(shuffled) = self.shuffled_indices.take() {
            if self.current_index >= 0 {
                if let Some(&natural) = shuffled.get(self.current_index as usize) {
                    self.current_index = natural as i64;
                }
            }
        }
    }

    fn maybe_latch_needs_more(&mut self) -> bool {
        if self.needs_more_latched {
            return false;
        }
        let len = self.context_tracks.len();
        if self.current_index < 0 {
            return false;
        }
        let tracks_remaining = len.saturating_sub(self.current_index as usize + 1);
        let under_threshold = tracks_remaining <= NEEDS_MORE_THRESHOLD;
        let more_exists = self.is_infinite
            || match self.total_count {
                Some(total) => len < total,
                None => true,
            };
        if under_threshold && more_exists {
            self.needs_more_latched = true;
            true
        } else {
            false
        }
    }

    pub fn prev_tracks(&self) -> Vec<TrackDescriptor> {
        if self.current_index <= 0 {
            return Vec::new();
        }
        let current = self.current_index as usize;
        let start = current.saturating_sub(MAX_PREV_TRACKS);
        (start..current)
            .filter_map(|logical| self.track_at_logical(logical).cloned())
            .collect()
    }

    pub fn next_tracks(&self) -> Vec<TrackDescriptor> {
        let mut result: Vec<TrackDescriptor> = self.user_queue.iter().cloned().collect();
        if result.len() >= MAX_NEXT_TRACKS {
            result.truncate(MAX_NEXT_TRACKS);
            return result;
        }

        let start = if self.current_index < 0 {
            0
        } else {
            self.current_index as usize + 1
        };
        let remaining = MAX_NEXT_TRACKS - result.len();
        for logical in start..start + remaining {
            match self.track_at_logical(logical) {
                Some(track) => result.push(track.clone()),
                None => break,
            }
        }
        result
    }

    pub fn queue_revision(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        for track in self.next_tracks() {
            track.uri.hash(&mut hasher);
        }
        hasher.finish()
    }
}
