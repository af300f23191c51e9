//! The playback engine: one actor-style command processor per active
//! context, driving TrackSource -> Decoder -> ProcessorChain -> AudioSink for
//! whatever track is current in the queue.
//!
//! Commands serialize behind a single binary semaphore (`command_lock`) in
//! arrival order. The per-track decode/write loop runs as its own spawned
//! task so a command handler can cancel it (on `Stop`/`Play`/`SkipNext`/
//! `SkipPrevious`) without blocking on decode progress; a seek while a loop
//! is running goes through a one-slot side channel instead of cancellation,
//! since the loop itself polls for it between buffers.

use crate::command::{Command, PlayRequest};
use crate::config::EngineConfig;
use crate::error::{ErrorEvent, PlaybackError, Result};
use crate::reporting::{
    EndReason, PlaybackInterval, ReportingEvent, ReportingPlayback, ReportingSession, ReportingSink,
    StartReason, TrackTransitionMetrics,
};
use crate::snapshot::HeaderSnapshotReader;
use crate::state::{PlaybackOptions, PlaybackState};
use crate::uri;

use bridge_traits::pipeline::{AudioSink, Decoder, ProcessorChain, TrackSource, TrackStream};
use bridge_traits::store::{CommandOutcome, CommandReplySender};
use core_async::sync::broadcast::error::RecvError;
use core_async::sync::{broadcast, watch, CancellationToken, Mutex, Semaphore};
use core_async::task::JoinHandle;
use core_cache::{MetadataCache, TrackCacheEntry};
use core_context::{ContextResolver, TrackDescriptor};
use core_queue::PlaybackQueue;
use std::sync::Arc;
use tracing::{error, instrument, warn};

const ERROR_CHANNEL_CAPACITY: usize = 16;

/// Builds a fresh [`Decoder`] instance; the registry tries each in order
/// against a rewindable header snapshot until one claims the stream.
pub type DecoderFactory = dyn Fn() -> Box<dyn Decoder> + Send + Sync;

/// Builds a fresh [`ProcessorChain`] instance for a track about to start.
pub type ProcessorChainFactory = dyn Fn() -> Box<dyn ProcessorChain> + Send + Sync;

struct ActiveLoop {
    handle: JoinHandle<()>,
    cancel: CancellationToken,
}

enum TrackOutcome {
    Finished { position_ms: u64 },
    Cancelled,
}

pub struct PlaybackEngine {
    config: EngineConfig,
    cache: Arc<MetadataCache>,
    context_resolver: Option<Arc<ContextResolver>>,
    queue: Arc<PlaybackQueue>,
    sources: Vec<Arc<dyn TrackSource>>,
    decoder_factories: Vec<Arc<DecoderFactory>>,
    processor_factory: Option<Arc<ProcessorChainFactory>>,
    sink: Arc<dyn AudioSink>,
    reply_sender: Option<Arc<dyn CommandReplySender>>,
    reporting: Arc<dyn ReportingSink>,

    command_lock: Semaphore,
    seek_slot: Mutex<Option<u64>>,
    active_loop: Mutex<Option<ActiveLoop>>,
    last_context_uri: Mutex<Option<String>>,
    next_page_token: Mutex<Option<String>>,
    session: Mutex<Option<ReportingSession>>,
    current_playback: Mutex<Option<ReportingPlayback>>,
    options: Mutex<PlaybackOptions>,

    state_tx: watch::Sender<PlaybackState>,
    error_tx: broadcast::Sender<ErrorEvent>,
}

impl PlaybackEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: EngineConfig,
        cache: Arc<MetadataCache>,
        queue: Arc<PlaybackQueue>,
        context_resolver: Option<Arc<ContextResolver>>,
        sources: Vec<Arc<dyn TrackSource>>,
        decoder_factories: Vec<Arc<DecoderFactory>>,
        processor_factory: Option<Arc<ProcessorChainFactory>>,
        sink: Arc<dyn AudioSink>,
        reply_sender: Option<Arc<dyn CommandReplySender>>,
        reporting: Arc<dyn ReportingSink>,
    ) -> Arc<Self> {
        let (state_tx, _) = watch::channel(PlaybackState::default());
        let (error_tx, _) = broadcast::channel(ERROR_CHANNEL_CAPACITY);

        let engine = Arc::new(Self {
            config,
            cache,
            context_resolver,
            queue,
            sources,
            decoder_factories,
            processor_factory,
            sink,
            reply_sender,
            reporting,
            command_lock: Semaphore::new(1),
            seek_slot: Mutex::new(None),
            active_loop: Mutex::new(None),
            last_context_uri: Mutex::new(None),
            next_page_token: Mutex::new(None),
            session: Mutex::new(None),
            current_playback: Mutex::new(None),
            options: Mutex::new(PlaybackOptions::default()),
            state_tx,
            error_tx,
        });

        Self::spawn_pagination_task(Arc::clone(&engine));
        engine
    }

    /// Watches `queue.subscribe_needs_more_tracks()` for the life of the
    /// engine and pages in the next batch of the current context whenever
    /// the queue latches the signal. A no-op when there is no resolver
    /// (local-only playback never needs more pages).
    fn spawn_pagination_task(engine: Arc<Self>) {
        if engine.context_resolver.is_none() {
            return;
        }
        core_async::task::spawn(async move {
            let mut rx = engine.queue.subscribe_needs_more_tracks();
            loop {
                match rx.recv().await {
                    Ok(()) => engine.load_more_tracks().await,
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                }
            }
        });
    }

    pub fn subscribe_state(&self) -> watch::Receiver<PlaybackState> {
        self.state_tx.subscribe()
    }

    pub fn subscribe_errors(&self) -> broadcast::Receiver<ErrorEvent> {
        self.error_tx.subscribe()
    }

    pub fn current_state(&self) -> PlaybackState {
        self.state_tx.borrow().clone()
    }

    /// Runs `command`, then delivers its outcome through `reply_sender`
    /// unless `reply_key` is absent or `local/`-prefixed (fire-and-forget).
    pub async fn dispatch(self: &Arc<Self>, reply_key: Option<&str>, command: Command) {
        let result = self.execute(command).await;

        let Some(key) = reply_key else { return };
        if key.starts_with("local/") {
            return;
        }
        let Some(sender) = &self.reply_sender else { return };

        let outcome = match &result {
            Ok(()) => CommandOutcome::Success,
            Err(e) => CommandOutcome::Error(e.to_string()),
        };
        if let Err(e) = sender.send_reply(key, outcome).await {
            warn!("failed to deliver command reply for {}: {}", key, e);
        }
    }

    async fn execute(self: &Arc<Self>, command: Command) -> Result<()> {
        match command {
            Command::Play(req) => self.play(req).await,
            Command::Pause => self.pause().await,
            Command::Resume => self.resume().await,
            Command::Stop => self.stop().await,
            Command::Seek(ms) => self.seek(ms).await,
            Command::SkipNext => self.skip_next().await,
            Command::SkipPrevious => self.skip_previous().await,
            Command::SetShuffle(v) => self.set_shuffle(v).await,
            Command::SetRepeatContext(v) => self.set_repeat_context(v).await,
            Command::SetRepeatTrack(v) => self.set_repeat_track(v).await,
            Command::AddToQueue(uri) => self.add_to_queue(uri).await,
            Command::SetOptions(bits) => self.set_options(bits).await,
            Command::Transfer(state) => self.transfer(*state).await,
            Command::UpdateContext(uri) => self.update_context(uri).await,
        }
    }

    // ---- commands -----------------------------------------------------

    #[instrument(skip(self, req))]
    pub async fn play(self: &Arc<Self>, req: PlayRequest) -> Result<()> {
        let _permit = self.command_lock.acquire().await.expect("command semaphore closed");

        if let Some(opts) = req.options {
            self.queue.set_shuffle(opts.shuffling).await;
            *self.options.lock().await = opts;
        }

        let canonical_track_uri = req.track_uri.as_deref().map(uri::canonicalize_uri);
        if let Some(track_uri) = canonical_track_uri.as_deref() {
            uri::validate_uri(track_uri)?;
        }

        if let Some(context_uri) = req.context_uri.as_deref().map(uri::canonicalize_uri) {
            uri::validate_uri(&context_uri)?;
            let same_context = self.last_context_uri.lock().await.as_deref() == Some(context_uri.as_str());

            if same_context {
                let tracks = self.queue.context_tracks().await;
                let index = Self::resolve_target_index(&tracks, req.track_uid.as_deref(), canonical_track_uri.as_deref(), req.skip_to_index);
                self.queue.skip_to(index).await?;
            } else {
                let resolver = self
                    .context_resolver
                    .as_ref()
                    .ok_or(PlaybackError::ContextResolverUnavailable)?;
                let result = resolver
                    .load_context(&context_uri, None, true)
                    .await
                    .map_err(|e| PlaybackError::ContextUnavailable(e.to_string()))?;

                let start_index =
                    Self::resolve_target_index(&result.tracks, req.track_uid.as_deref(), canonical_track_uri.as_deref(), req.skip_to_index);

                self.queue.set_context(context_uri.clone(), result.is_infinite, result.total_count).await;
                *self.next_page_token.lock().await = result.next_page_token.clone();
                self.queue.set_tracks(result.tracks, start_index).await;
                *self.last_context_uri.lock().await = Some(context_uri.clone());
                self.mint_session(context_uri, result.total_count).await;
            }
        }

        self.spawn_playback_task(req.position_ms, StartReason::PlayBtn).await;
        Ok(())
    }

    /// Target resolution for a `Play` command: `trackUid` match, then
    /// `trackUri` match, then an in-range `skipToIndex`, falling back to the
    /// head of the context. `track_uri` must already be canonicalized.
    fn resolve_target_index(tracks: &[TrackDescriptor], track_uid: Option<&str>, track_uri: Option<&str>, skip_to_index: Option<usize>) -> usize {
        if let Some(uid) = track_uid {
            if let Some(pos) = tracks.iter().position(|t| t.uid.as_deref() == Some(uid)) {
                return pos;
            }
        }
        if let Some(uri) = track_uri {
            if let Some(pos) = tracks.iter().position(|t| t.uri == uri) {
                return pos;
            }
        }
        if let Some(index) = skip_to_index {
            if index < tracks.len() {
                return index;
            }
        }
        0
    }

    /// Pages in the next batch of the current context and appends it to the
    /// queue, advancing the stored continuation token. Silently returns if
    /// there is no resolver, no context, or no further page — the caller is
    /// a background listener with nowhere to report an error.
    async fn load_more_tracks(&self) {
        let Some(resolver) = self.context_resolver.as_ref() else { return };
        let Some(context_uri) = self.last_context_uri.lock().await.clone() else { return };
        let Some(token) = self.next_page_token.lock().await.clone() else { return };

        match resolver.load_next_page(&context_uri, &token, true).await {
            Ok(result) => {
                *self.next_page_token.lock().await = result.next_page_token;
                self.queue.append_tracks(result.tracks).await;
            }
            Err(e) => {
                warn!("failed to load next page for {}: {}", context_uri, e);
            }
        }
    }

    pub async fn pause(&self) -> Result<()> {
        let _permit = self.command_lock.acquire().await.expect("command semaphore closed");
        self.sink.pause().await.map_err(|e| PlaybackError::AudioDeviceUnavailable(e.to_string()))?;

        let mut state = self.current_state();
        state.is_playing = false;
        state.is_paused = true;
        state.stamp();
        let _ = self.state_tx.send(state);
        Ok(())
    }

    pub async fn resume(self: &Arc<Self>) -> Result<()> {
        let _permit = self.command_lock.acquire().await.expect("command semaphore closed");
        let has_active = self.active_loop.lock().await.is_some();

        if has_active {
            let resumed = self.sink.resume().await.map_err(|e| PlaybackError::AudioDeviceUnavailable(e.to_string()))?;
            if !resumed {
                return Err(PlaybackError::AudioDeviceUnavailable("device unavailable on resume".to_string()));
            }
            let mut state = self.current_state();
            state.is_playing = true;
            state.is_paused = false;
            state.stamp();
            let _ = self.state_tx.send(state);
        } else {
            let position = self.current_state().position_ms;
            self.spawn_playback_task(Some(position), StartReason::PlayBtn).await;
        }
        Ok(())
    }

    pub async fn stop(self: &Arc<Self>) -> Result<()> {
        let _permit = self.command_lock.acquire().await.expect("command semaphore closed");
        self.cancel_current_playback().await;
        let _ = self.sink.flush().await;
        self.mark_stopped().await;
        Ok(())
    }

    pub async fn seek(self: &Arc<Self>, position_ms: u64) -> Result<()> {
        let _permit = self.command_lock.acquire().await.expect("command semaphore closed");

        if !self.current_state().can_seek {
            warn!("seek requested on a non-seekable stream; ignoring");
            return Ok(());
        }

        let has_active = self.active_loop.lock().await.is_some();
        if has_active {
            *self.seek_slot.lock().await = Some(position_ms);
            let _ = self.sink.flush().await;

            let mut state = self.current_state();
            state.position_ms = position_ms;
            state.is_buffering = true;
            state.stamp();
            let _ = self.state_tx.send(state);
        } else {
            self.spawn_playback_task(Some(position_ms), StartReason::PlayBtn).await;
        }
        Ok(())
    }

    pub async fn skip_next(self: &Arc<Self>) -> Result<()> {
        let _permit = self.command_lock.acquire().await.expect("command semaphore closed");
        match self.queue.move_next().await {
            Some(_) => {
                self.spawn_playback_task(None, StartReason::FwdBtn).await;
            }
            None => match self.restart_if_repeating_context().await {
                Some(_) => self.spawn_playback_task(None, StartReason::FwdBtn).await,
                None => {
                    self.cancel_current_playback().await;
                    let _ = self.sink.flush().await;
                    self.mark_stopped().await;
                }
            },
        }
        Ok(())
    }

    pub async fn skip_previous(self: &Arc<Self>) -> Result<()> {
        let _permit = self.command_lock.acquire().await.expect("command semaphore closed");
        let position = self.current_state().position_ms;

        if position <= 3_000 {
            self.queue.move_previous().await;
        }
        self.spawn_playback_task(Some(0), StartReason::BackBtn).await;
        Ok(())
    }

    pub async fn set_shuffle(&self, enabled: bool) -> Result<()> {
        let _permit = self.command_lock.acquire().await.expect("command semaphore closed");
        self.queue.set_shuffle(enabled).await;
        self.options.lock().await.shuffling = enabled;
        self.publish_queue_snapshot().await;
        Ok(())
    }

    pub async fn set_repeat_context(&self, enabled: bool) -> Result<()> {
        let _permit = self.command_lock.acquire().await.expect("command semaphore closed");
        self.options.lock().await.repeating_context = enabled;
        self.publish_queue_snapshot().await;
        Ok(())
    }

    pub async fn set_repeat_track(&self, enabled: bool) -> Result<()> {
        let _permit = self.command_lock.acquire().await.expect("command semaphore closed");
        self.options.lock().await.repeating_track = enabled;
        self.publish_queue_snapshot().await;
        Ok(())
    }

    pub async fn add_to_queue(&self, track_uri: String) -> Result<()> {
        let _permit = self.command_lock.acquire().await.expect("command semaphore closed");
        let track_uri = uri::canonicalize_uri(&track_uri);
        uri::validate_uri(&track_uri)?;
        self.queue.add_to_queue(TrackDescriptor::new(track_uri)).await;
        self.publish_queue_snapshot().await;
        Ok(())
    }

    pub async fn set_options(&self, bits: u8) -> Result<()> {
        let _permit = self.command_lock.acquire().await.expect("command semaphore closed");
        let opts = PlaybackOptions::from_bits(bits);
        self.queue.set_shuffle(opts.shuffling).await;
        *self.options.lock().await = opts;
        self.publish_queue_snapshot().await;
        Ok(())
    }

    /// Adopts the shuffle/repeat flags and context of a transfer from another
    /// device. Rehydrating the transferred position/queue itself is left to
    /// a subsequent `Play` once this device is ready to own the stream.
    pub async fn transfer(&self, incoming: PlaybackState) -> Result<()> {
        let _permit = self.command_lock.acquire().await.expect("command semaphore closed");

        let opts = PlaybackOptions {
            shuffling: incoming.shuffling,
            repeating_context: incoming.repeating_context,
            repeating_track: incoming.repeating_track,
        };
        self.queue.set_shuffle(opts.shuffling).await;
        *self.options.lock().await = opts;
        if let Some(context_uri) = incoming.context_uri {
            *self.last_context_uri.lock().await = Some(context_uri);
        }
        Ok(())
    }

    pub async fn update_context(&self, context_uri: String) -> Result<()> {
        let _permit = self.command_lock.acquire().await.expect("command semaphore closed");
        let context_uri = uri::canonicalize_uri(&context_uri);
        uri::validate_uri(&context_uri)?;

        let resolver = self
            .context_resolver
            .as_ref()
            .ok_or(PlaybackError::ContextResolverUnavailable)?;
        let result = resolver
            .load_context(&context_uri, None, true)
            .await
            .map_err(|e| PlaybackError::ContextUnavailable(e.to_string()))?;

        let current_index = self.queue.current_index().await.max(0) as usize;

        self.queue.set_context(context_uri.clone(), result.is_infinite, result.total_count).await;
        *self.next_page_token.lock().await = result.next_page_token.clone();
        self.queue.set_tracks(result.tracks, current_index).await;
        *self.last_context_uri.lock().await = Some(context_uri);
        self.publish_queue_snapshot().await;
        Ok(())
    }

    // ---- playback task lifecycle ---------------------------------------

    async fn cancel_current_playback(&self) {
        let active = self.active_loop.lock().await.take();
        if let Some(active) = active {
            active.cancel.cancel();
            let _ = active.handle.await;
        }
    }

    async fn spawn_playback_task(self: &Arc<Self>, position_ms: Option<u64>, reason: StartReason) {
        self.cancel_current_playback().await;

        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();
        let engine = Arc::clone(self);
        let handle = core_async::task::spawn(async move {
            Self::playback_loop(engine, task_cancel, position_ms, reason).await;
        });
        *self.active_loop.lock().await = Some(ActiveLoop { handle, cancel });
    }

    async fn restart_if_repeating_context(&self) -> Option<TrackDescriptor> {
        if !self.is_repeating_context().await {
            return None;
        }
        self.queue.skip_to(0).await.ok().flatten()
    }

    async fn is_repeating_context(&self) -> bool {
        self.options.lock().await.repeating_context
    }

    async fn is_repeating_track(&self) -> bool {
        self.options.lock().await.repeating_track
    }

    async fn take_pending_seek(&self) -> Option<u64> {
        self.seek_slot.lock().await.take()
    }

    async fn playback_loop(engine: Arc<Self>, cancel: CancellationToken, initial_position_ms: Option<u64>, start_reason: StartReason) {
        let mut seek_ms = initial_position_ms;
        let mut reason = start_reason;

        let mut track = match engine.queue.current_track().await {
            Some(t) => t,
            None => return,
        };

        loop {
            if cancel.is_cancelled() {
                break;
            }

            if !track.is_playable {
                engine.emit_error(&PlaybackError::TrackUnavailable(track.uri.clone()));
                match engine.queue.move_next().await {
                    Some(next) => {
                        track = next;
                        continue;
                    }
                    None => {
                        Self::finish_context_or_restart(&engine, &mut track, &mut reason).await;
                        break;
                    }
                }
            }

            let outcome = Self::play_one_track(&engine, &track, &cancel, seek_ms.take(), reason.clone()).await;

            match outcome {
                Ok(TrackOutcome::Finished { position_ms }) => {
                    engine.end_track(&track, EndReason::TrackDone, position_ms).await;

                    if engine.is_repeating_track().await {
                        seek_ms = Some(0);
                        continue;
                    }
                    match engine.queue.move_next().await {
                        Some(next) => {
                            track = next;
                            reason = StartReason::Autoplay;
                            continue;
                        }
                        None => {
                            if Self::finish_context_or_restart(&engine, &mut track, &mut reason).await {
                                continue;
                            }
                            break;
                        }
                    }
                }
                Ok(TrackOutcome::Cancelled) => {
                    engine.end_track(&track, EndReason::EndPlay, 0).await;
                    break;
                }
                Err(e) => {
                    error!("playback failed for {}: {}", track.uri, e);
                    engine.emit_error(&e);
                    engine.end_track(&track, EndReason::EndPlay, 0).await;

                    if e.is_auto_advance() {
                        match engine.queue.move_next().await {
                            Some(next) => {
                                track = next;
                                reason = StartReason::Autoplay;
                                continue;
                            }
                            None => {
                                if Self::finish_context_or_restart(&engine, &mut track, &mut reason).await {
                                    continue;
                                }
                                break;
                            }
                        }
                    }
                    engine.mark_stopped().await;
                    break;
                }
            }
        }
    }

    /// Called once the queue has no further track. Restarts from index 0
    /// when repeat-context is on (returning `true` and updating `track`),
    /// otherwise flushes the sink and marks playback stopped.
    async fn finish_context_or_restart(engine: &Arc<Self>, track: &mut TrackDescriptor, reason: &mut StartReason) -> bool {
        if let Some(restarted) = engine.restart_if_repeating_context().await {
            *track = restarted;
            *reason = StartReason::Autoplay;
            return true;
        }
        let _ = engine.sink.flush().await;
        engine.mark_stopped().await;
        false
    }

    #[allow(clippy::too_many_lines)]
    async fn play_one_track(
        engine: &Arc<Self>,
        track: &TrackDescriptor,
        cancel: &CancellationToken,
        seek_ms: Option<u64>,
        reason: StartReason,
    ) -> Result<TrackOutcome> {
        let source = engine
            .sources
            .iter()
            .find(|s| s.can_handle(&track.uri))
            .ok_or_else(|| PlaybackError::TrackUnavailable(track.uri.clone()))?;

        let stream = source
            .load(&track.uri)
            .await
            .map_err(|e| PlaybackError::TrackUnavailable(format!("{}: {e}", track.uri)))?;
        let TrackStream { metadata, can_seek, reader } = stream;

        if engine.config.enable_caching {
            let entry = TrackCacheEntry {
                title: metadata.title.clone(),
                artist: metadata.artist.clone(),
                album: metadata.album.clone(),
                duration_ms: metadata.duration_ms,
                is_playable: Some(true),
                ..TrackCacheEntry::new(track.uri.clone())
            };
            if let Err(e) = engine.cache.set_track(&track.uri, entry).await {
                warn!("failed to cache track metadata for {}: {}", track.uri, e);
            }
        }

        let mut snapshot = HeaderSnapshotReader::new(reader);
        let (mut decoder, probe) = engine.negotiate_decoder(&mut snapshot).await?;
        let format = probe.format.clone();

        engine
            .sink
            .initialize(&format, engine.config.sink_buffer_ms)
            .await
            .map_err(|e| PlaybackError::AudioDeviceUnavailable(e.to_string()))?;

        let mut processor = engine.processor_factory.as_ref().map(|f| (**f)());
        if let Some(p) = processor.as_mut() {
            p.initialize(&format);
        }

        let duration_ms = metadata
            .duration_ms
            .or_else(|| probe.duration.map(|d| d.as_millis() as u64));
        engine.begin_track(track, reason, can_seek, duration_ms).await;

        let mut position_ms = seek_ms.unwrap_or(0);
        let mut pending_decode_seek = seek_ms;
        let mut last_publish = std::time::Instant::now();

        loop {
            if cancel.is_cancelled() {
                return Ok(TrackOutcome::Cancelled);
            }

            if let Some(new_seek) = engine.take_pending_seek().await {
                position_ms = new_seek;
                pending_decode_seek = Some(new_seek);
                let _ = engine.sink.flush().await;
            }

            let pcm = decoder
                .decode(&mut snapshot, pending_decode_seek.take())
                .await
                .map_err(|e| PlaybackError::TransientIo(e.to_string()))?;

            let pcm = match pcm {
                Some(pcm) => pcm,
                None => return Ok(TrackOutcome::Finished { position_ms }),
            };
            position_ms = pcm.position_ms;

            let processed = match processor.as_mut() {
                Some(p) => p.process(pcm),
                None => pcm,
            };

            let bytes = pcm_to_bytes(&processed.samples);
            engine
                .sink
                .write(&bytes, cancel)
                .await
                .map_err(|e| PlaybackError::AudioDeviceUnavailable(e.to_string()))?;

            if cancel.is_cancelled() {
                return Ok(TrackOutcome::Cancelled);
            }

            if last_publish.elapsed().as_millis() as u64 >= engine.config.state_publish_interval_ms {
                engine.publish_position(position_ms).await;
                last_publish = std::time::Instant::now();
            }
        }
    }

    /// Tries each registered decoder factory in turn against a rewindable
    /// header snapshot. The winner's probe is returned with the reader
    /// rewound and frozen so `decode` sees the header from the start.
    async fn negotiate_decoder(&self, reader: &mut HeaderSnapshotReader) -> Result<(Box<dyn Decoder>, bridge_traits::pipeline::ProbeResult)> {
        for factory in &self.decoder_factories {
            let mut decoder = (**factory)();
            reader.rewind_for_replay();
            if decoder.can_decode(reader).await {
                reader.rewind_for_replay();
                reader.freeze();
                let probe = decoder
                    .get_format(reader)
                    .await
                    .map_err(|e| PlaybackError::TransientIo(e.to_string()))?;
                return Ok((decoder, probe));
            }
        }
        Err(PlaybackError::DecoderMissing)
    }

    // ---- state/reporting plumbing --------------------------------------

    async fn mint_session(&self, context_uri: String, context_size: Option<usize>) {
        let session = ReportingSession::new(context_uri, context_size);
        self.emit_reporting(ReportingEvent::NewSessionId {
            session_id: session.session_id.clone(),
            context_uri: session.context_uri.clone(),
            context_size: session.context_size,
        });
        *self.session.lock().await = Some(session);
    }

    async fn begin_track(&self, track: &TrackDescriptor, reason: StartReason, can_seek: bool, duration_ms: Option<u64>) {
        let session_id = {
            let session = self.session.lock().await;
            session.as_ref().map(|s| s.session_id.clone()).unwrap_or_else(crate::reporting::new_hex_id)
        };
        let playback = ReportingPlayback::new(session_id.clone(), track.uri.clone(), reason);
        self.emit_reporting(ReportingEvent::NewPlaybackId {
            session_id,
            playback_id: playback.playback_id.clone(),
        });
        *self.current_playback.lock().await = Some(playback);

        let mut state = self.current_state();
        state.set_current_track(Some(track));
        if duration_ms.is_some() {
            state.duration_ms = duration_ms;
        }
        state.can_seek = can_seek;
        state.is_playing = true;
        state.is_paused = false;
        state.is_buffering = false;
        state.position_ms = 0;
        state.context_uri = self.last_context_uri.lock().await.clone();
        state.context_url = state.context_uri.as_deref().map(uri::canonical_context_url);
        state.current_index = self.queue.current_index().await;
        state.prev_tracks = self.queue.prev_tracks().await;
        state.next_tracks = self.queue.next_tracks().await;
        state.queue_revision = self.queue.queue_revision().await;
        state.stamp();
        let _ = self.state_tx.send(state);
    }

    async fn end_track(&self, track: &TrackDescriptor, end_reason: EndReason, position_ms: u64) {
        let Some(mut playback) = self.current_playback.lock().await.take() else {
            return;
        };
        playback.intervals.push(PlaybackInterval { start_ms: 0, end_ms: position_ms });
        let start_reason = playback.start_reason.clone();
        playback.end_reason = Some(end_reason.clone());

        if self.should_report(&track.uri) {
            let context_uri = self.last_context_uri.lock().await.clone().unwrap_or_default();
            self.emit_reporting(ReportingEvent::TrackTransition {
                device_id: None,
                last_command_device: None,
                metrics: TrackTransitionMetrics {
                    track_id: playback.track_id.clone(),
                    playback_id: playback.playback_id.clone(),
                    context_uri,
                    source_start: "playback-engine".to_string(),
                    reason_start: start_reason,
                    source_end: "playback-engine".to_string(),
                    reason_end: end_reason,
                    intervals: playback.intervals.clone(),
                    player: playback.player_info.clone(),
                },
            });
        }
    }

    fn should_report(&self, track_uri: &str) -> bool {
        let cfg = &self.config.event_reporting;
        if uri::is_spotify_track(track_uri) {
            cfg.report_spotify_tracks
        } else if uri::is_podcast(track_uri) {
            cfg.report_podcasts
        } else if uri::is_http_stream(track_uri) {
            cfg.report_http_streams
        } else if uri::is_local_file(track_uri) {
            cfg.report_local_files
        } else {
            false
        }
    }

    fn emit_reporting(&self, event: ReportingEvent) {
        let sink = Arc::clone(&self.reporting);
        core_async::task::spawn(async move { sink.report(event).await });
    }

    fn emit_error(&self, err: &PlaybackError) {
        let _ = self.error_tx.send(ErrorEvent::from(err));
    }

    async fn mark_stopped(&self) {
        let mut state = self.current_state();
        state.is_playing = false;
        state.is_paused = false;
        state.is_buffering = false;
        state.stamp();
        let _ = self.state_tx.send(state);
    }

    async fn publish_position(&self, position_ms: u64) {
        let mut state = self.current_state();
        state.position_ms = position_ms;
        state.stamp();
        let _ = self.state_tx.send(state);
    }

    async fn publish_queue_snapshot(&self) {
        let opts = *self.options.lock().await;
        let mut state = self.current_state();
        state.shuffling = opts.shuffling;
        state.repeating_context = opts.repeating_context;
        state.repeating_track = opts.repeating_track;
        state.current_index = self.queue.current_index().await;
        state.prev_tracks = self.queue.prev_tracks().await;
        state.next_tracks = self.queue.next_tracks().await;
        state.queue_revision = self.queue.queue_revision().await;
        state.stamp();
        let _ = self.state_tx.send(state);
    }
}

fn pcm_to_bytes(samples: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() * 4);
    for sample in samples {
        out.extend_from_slice(&sample.to_le_bytes());
    }
    out
}
