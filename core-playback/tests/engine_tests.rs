//! Integration tests for `PlaybackEngine`, exercised against hand-rolled
//! test-double collaborators rather than mocks: a fixed context behind a
//! `ContextPageSource`, a `TrackSource` that opens any URI, a decoder that
//! yields a handful of silent buffers, a no-op processor, and an in-memory
//! sink.

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::pipeline::{
    AudioCodec, AudioFormat, AudioSink, Decoder, PcmBuffer, ProbeResult, ProcessorChain, SinkStatus, TrackSource,
    TrackStream, TrackStreamMetadata,
};
use bridge_traits::platform::DynAsyncRead;
use bridge_traits::store::DurableStore;
use core_async::sync::CancellationToken;
use core_async::time::{sleep, Duration};
use core_cache::{CacheConfig, MetadataCache};
use core_context::{ContextPage, ContextPageSource, ContextResolver, MetadataBatchSource, RemoteTrackMetadata};
use core_playback::{Command, DecoderFactory, EngineConfig, NullReportingSink, PlaybackEngine, PlayRequest, ProcessorChainFactory};
use core_queue::PlaybackQueue;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct NullStore;

#[async_trait]
impl DurableStore for NullStore {
    async fn get(&self, _key: &str) -> BridgeResult<Option<Vec<u8>>> {
        Ok(None)
    }
    async fn put(&self, _key: &str, _value: Vec<u8>) -> BridgeResult<()> {
        Ok(())
    }
    async fn delete(&self, _key: &str) -> BridgeResult<()> {
        Ok(())
    }
    async fn keys_with_prefix(&self, _prefix: &str) -> BridgeResult<Vec<String>> {
        Ok(Vec::new())
    }
}

/// A single-page context with a fixed track-uri list.
struct FixturePages(Vec<String>);

#[async_trait]
impl ContextPageSource for FixturePages {
    async fn fetch_page(&self, _context_uri: &str, _page_token: Option<&str>) -> core_context::Result<ContextPage> {
        Ok(ContextPage { uris: self.0.clone(), total_count: Some(self.0.len()), next_page_token: None })
    }
}

struct FixtureMetadata;

#[async_trait]
impl MetadataBatchSource for FixtureMetadata {
    async fn fetch_batch(&self, uris: &[String]) -> core_context::Result<Vec<RemoteTrackMetadata>> {
        Ok(uris
            .iter()
            .map(|uri| RemoteTrackMetadata { uri: uri.clone(), is_playable: true, ..Default::default() })
            .collect())
    }
}

/// Opens any URI except ones explicitly marked missing.
struct FixtureSource {
    missing: Vec<String>,
}

#[async_trait]
impl TrackSource for FixtureSource {
    fn can_handle(&self, _uri: &str) -> bool {
        true
    }

    async fn load(&self, uri: &str) -> BridgeResult<TrackStream> {
        if self.missing.iter().any(|m| m == uri) {
            return Err(BridgeError::NotAvailable(uri.to_string()));
        }
        let reader: Box<DynAsyncRead> = Box::new(Cursor::new(b"RIFFfakewavdata".to_vec()));
        Ok(TrackStream {
            metadata: TrackStreamMetadata { duration_ms: Some(1_000), ..Default::default() },
            can_seek: true,
            reader,
        })
    }
}

/// Claims every stream and yields a handful of short PCM chunks before
/// signalling end of stream.
struct FixtureDecoder {
    remaining: usize,
}

#[async_trait]
impl Decoder for FixtureDecoder {
    async fn can_decode(&mut self, _reader: &mut DynAsyncRead) -> bool {
        true
    }

    async fn get_format(&mut self, _reader: &mut DynAsyncRead) -> BridgeResult<ProbeResult> {
        Ok(ProbeResult {
            format: AudioFormat::new(AudioCodec::Wav, 44_100, 2, Some(16), None),
            duration: Some(Duration::from_millis(1_000)),
            tags: Default::default(),
        })
    }

    async fn decode(&mut self, _reader: &mut DynAsyncRead, start_ms: Option<u64>) -> BridgeResult<Option<PcmBuffer>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        Ok(Some(PcmBuffer::new(vec![0.0; 32], start_ms.unwrap_or(0))))
    }
}

struct FixtureProcessor;

impl ProcessorChain for FixtureProcessor {
    fn initialize(&mut self, _format: &AudioFormat) {}
    fn process(&mut self, buffer: PcmBuffer) -> PcmBuffer {
        buffer
    }
}

#[derive(Default)]
struct FixtureSink {
    writes: AtomicUsize,
}

#[async_trait]
impl AudioSink for FixtureSink {
    async fn initialize(&self, _format: &AudioFormat, _buffer_ms: u32) -> BridgeResult<()> {
        Ok(())
    }

    async fn write(&self, _data: &[u8], _cancel: &CancellationToken) -> BridgeResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn pause(&self) -> BridgeResult<()> {
        Ok(())
    }

    async fn resume(&self) -> BridgeResult<bool> {
        Ok(true)
    }

    async fn flush(&self) -> BridgeResult<()> {
        Ok(())
    }

    async fn status(&self) -> SinkStatus {
        SinkStatus { position_ms: 0, buffer_ms: 0, playing: true }
    }
}

fn build_engine(track_uris: Vec<String>, missing: Vec<String>) -> (Arc<PlaybackEngine>, Arc<FixtureSink>) {
    let cache = Arc::new(MetadataCache::new(CacheConfig::default(), Arc::new(NullStore)));
    let queue = Arc::new(PlaybackQueue::new());
    let sink = Arc::new(FixtureSink::default());
    let resolver = Arc::new(ContextResolver::new(
        Arc::new(FixturePages(track_uris)),
        Arc::new(FixtureMetadata),
        Arc::clone(&cache),
    ));

    let decoder_factories: Vec<Arc<DecoderFactory>> =
        vec![Arc::new(|| Box::new(FixtureDecoder { remaining: 3 }) as Box<dyn Decoder>)];
    let processor_factory: Arc<ProcessorChainFactory> = Arc::new(|| Box::new(FixtureProcessor) as Box<dyn ProcessorChain>);

    let engine = PlaybackEngine::new(
        EngineConfig::default(),
        cache,
        queue,
        Some(resolver),
        vec![Arc::new(FixtureSource { missing })],
        decoder_factories,
        Some(processor_factory),
        sink.clone() as Arc<dyn AudioSink>,
        None,
        Arc::new(NullReportingSink),
    );
    (engine, sink)
}

fn play_request(context_uri: &str) -> PlayRequest {
    PlayRequest { context_uri: Some(context_uri.to_string()), ..Default::default() }
}

async fn settle() {
    sleep(Duration::from_millis(80)).await;
}

#[tokio::test]
async fn play_resolves_context_and_starts_first_track() {
    let (engine, sink) = build_engine(
        vec!["spotify:track:0".to_string(), "spotify:track:1".to_string()],
        Vec::new(),
    );
    engine.play(play_request("spotify:playlist:fixture")).await.unwrap();
    settle().await;

    let state = engine.current_state();
    assert_eq!(state.track_uri.as_deref(), Some("spotify:track:0"));
    assert!(state.is_playing);
    assert!(sink.writes.load(Ordering::SeqCst) > 0);

    engine.stop().await.unwrap();
}

#[tokio::test]
async fn unavailable_track_auto_advances_to_next() {
    let (engine, _sink) = build_engine(
        vec!["spotify:track:0".to_string(), "spotify:track:1".to_string()],
        vec!["spotify:track:0".to_string()],
    );
    let mut errors = engine.subscribe_errors();

    engine.dispatch(None, Command::Play(play_request("spotify:playlist:fixture"))).await;

    let event = errors.recv().await.unwrap();
    assert!(event.auto_advance);

    settle().await;
    let state = engine.current_state();
    assert_eq!(state.track_uri.as_deref(), Some("spotify:track:1"));

    engine.stop().await.unwrap();
}

#[tokio::test]
async fn repeat_track_replays_same_track_on_finish() {
    let (engine, _sink) = build_engine(vec!["spotify:track:only".to_string()], Vec::new());
    engine.set_repeat_track(true).await.unwrap();
    engine.play(play_request("spotify:playlist:fixture")).await.unwrap();

    // Give the per-track loop a few cycles to finish and restart repeatedly.
    sleep(Duration::from_millis(200)).await;
    let state = engine.current_state();
    assert_eq!(state.track_uri.as_deref(), Some("spotify:track:only"));
    assert!(state.is_playing);

    engine.stop().await.unwrap();
}

#[tokio::test]
async fn pause_then_resume_round_trips_playing_flag() {
    let (engine, _sink) = build_engine(vec!["spotify:track:a".to_string()], Vec::new());
    engine.play(play_request("spotify:playlist:fixture")).await.unwrap();
    settle().await;

    engine.pause().await.unwrap();
    let paused = engine.current_state();
    assert!(paused.is_paused);
    assert!(!paused.is_playing);

    engine.resume().await.unwrap();
    let resumed = engine.current_state();
    assert!(resumed.is_playing);
    assert!(!resumed.is_paused);

    engine.stop().await.unwrap();
}

#[tokio::test]
async fn stop_halts_playback_and_clears_flags() {
    let (engine, _sink) = build_engine(vec!["spotify:track:a".to_string()], Vec::new());
    engine.play(play_request("spotify:playlist:fixture")).await.unwrap();
    settle().await;

    engine.stop().await.unwrap();
    let state = engine.current_state();
    assert!(!state.is_playing);
    assert!(!state.is_paused);
    assert!(!state.is_buffering);
}

#[tokio::test]
async fn skip_next_advances_and_skip_previous_restarts_or_backs_up() {
    let (engine, _sink) = build_engine(
        vec!["spotify:track:0".to_string(), "spotify:track:1".to_string(), "spotify:track:2".to_string()],
        Vec::new(),
    );
    engine.play(play_request("spotify:playlist:fixture")).await.unwrap();
    settle().await;

    engine.skip_next().await.unwrap();
    settle().await;
    assert_eq!(engine.current_state().track_uri.as_deref(), Some("spotify:track:1"));

    // Fresh past the 3s grace window, so skip_previous goes back a track
    // rather than restarting the current one.
    engine.skip_previous().await.unwrap();
    settle().await;
    assert_eq!(engine.current_state().track_uri.as_deref(), Some("spotify:track:0"));

    engine.stop().await.unwrap();
}

#[tokio::test]
async fn seek_on_non_seekable_state_is_a_logged_no_op() {
    let (engine, _sink) = build_engine(Vec::new(), Vec::new());
    // Default state has can_seek == false and no active loop.
    engine.seek(5_000).await.unwrap();
    let state = engine.current_state();
    assert_eq!(state.position_ms, 0);
}

#[tokio::test]
async fn invalid_track_uri_is_rejected_before_touching_the_queue() {
    let (engine, _sink) = build_engine(Vec::new(), Vec::new());
    let req = PlayRequest { track_uri: Some("not-a-valid-uri".to_string()), ..Default::default() };
    let err = engine.play(req).await;
    assert!(err.is_err());
}
