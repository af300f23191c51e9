//! # Playback Engine Usage Example
//!
//! Demonstrates wiring a `PlaybackEngine` from in-memory pipeline
//! collaborators (no real network/audio device involved) and driving it
//! through play/pause/resume/stop.
//!
//! Run with: `cargo run --example playback_demo --package core-playback`

use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::pipeline::{
    AudioCodec, AudioFormat, AudioSink, Decoder, PcmBuffer, ProbeResult, ProcessorChain,
    SinkStatus, TrackSource, TrackStream, TrackStreamMetadata,
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
use std::sync::Arc;

/// A `DurableStore` that never persists anything; good enough for a demo
/// where the metadata cache only needs its hot tier.
struct InMemoryStore;

#[async_trait]
impl DurableStore for InMemoryStore {
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

/// A single-page context listing a fixed set of track URIs.
struct DemoPages(Vec<String>);

#[async_trait]
impl ContextPageSource for DemoPages {
    async fn fetch_page(&self, _context_uri: &str, _page_token: Option<&str>) -> core_context::Result<ContextPage> {
        Ok(ContextPage { uris: self.0.clone(), total_count: Some(self.0.len()), next_page_token: None })
    }
}

/// Metadata source that marks every track playable without calling out.
struct DemoMetadata;

#[async_trait]
impl MetadataBatchSource for DemoMetadata {
    async fn fetch_batch(&self, uris: &[String]) -> core_context::Result<Vec<RemoteTrackMetadata>> {
        Ok(uris
            .iter()
            .map(|uri| RemoteTrackMetadata { uri: uri.clone(), is_playable: true, ..Default::default() })
            .collect())
    }
}

/// Opens any URI as a short, fake WAV stream.
struct DemoSource;

#[async_trait]
impl TrackSource for DemoSource {
    fn can_handle(&self, _uri: &str) -> bool {
        true
    }

    async fn load(&self, _uri: &str) -> BridgeResult<TrackStream> {
        let reader: Box<DynAsyncRead> = Box::new(Cursor::new(b"RIFFfakewavdata".to_vec()));
        Ok(TrackStream {
            metadata: TrackStreamMetadata { duration_ms: Some(3_000), ..Default::default() },
            can_seek: true,
            reader,
        })
    }
}

/// Yields a handful of silent PCM chunks before signalling end of stream.
struct DemoDecoder {
    remaining: usize,
}

#[async_trait]
impl Decoder for DemoDecoder {
    async fn can_decode(&mut self, _reader: &mut DynAsyncRead) -> bool {
        true
    }

    async fn get_format(&mut self, _reader: &mut DynAsyncRead) -> BridgeResult<ProbeResult> {
        Ok(ProbeResult {
            format: AudioFormat::new(AudioCodec::Wav, 44_100, 2, Some(16), None),
            duration: Some(Duration::from_millis(3_000)),
            tags: Default::default(),
        })
    }

    async fn decode(&mut self, _reader: &mut DynAsyncRead, start_ms: Option<u64>) -> BridgeResult<Option<PcmBuffer>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        Ok(Some(PcmBuffer::new(vec![0.0; 64], start_ms.unwrap_or(0))))
    }
}

struct DemoProcessor;

impl ProcessorChain for DemoProcessor {
    fn initialize(&mut self, _format: &AudioFormat) {}
    fn process(&mut self, buffer: PcmBuffer) -> PcmBuffer {
        buffer
    }
}

/// Prints each write to stdout instead of driving a real output device.
#[derive(Default)]
struct ConsoleSink;

#[async_trait]
impl AudioSink for ConsoleSink {
    async fn initialize(&self, format: &AudioFormat, buffer_ms: u32) -> BridgeResult<()> {
        println!("sink: initialized for {:?} with {}ms buffer", format, buffer_ms);
        Ok(())
    }

    async fn write(&self, data: &[u8], _cancel: &CancellationToken) -> BridgeResult<()> {
        println!("sink: wrote {} bytes", data.len());
        Ok(())
    }

    async fn pause(&self) -> BridgeResult<()> {
        println!("sink: paused");
        Ok(())
    }

    async fn resume(&self) -> BridgeResult<bool> {
        println!("sink: resumed");
        Ok(true)
    }

    async fn flush(&self) -> BridgeResult<()> {
        Ok(())
    }

    async fn status(&self) -> SinkStatus {
        SinkStatus { position_ms: 0, buffer_ms: 0, playing: true }
    }
}

#[tokio::main]
async fn main() {
    let cache = Arc::new(MetadataCache::new(CacheConfig::default(), Arc::new(InMemoryStore)));
    let queue = Arc::new(PlaybackQueue::new());
    let resolver = Arc::new(ContextResolver::new(
        Arc::new(DemoPages(vec![
            "spotify:track:0".to_string(),
            "spotify:track:1".to_string(),
        ])),
        Arc::new(DemoMetadata),
        Arc::clone(&cache),
    ));

    let decoder_factories: Vec<Arc<DecoderFactory>> =
        vec![Arc::new(|| Box::new(DemoDecoder { remaining: 5 }) as Box<dyn Decoder>)];
    let processor_factory: Arc<ProcessorChainFactory> =
        Arc::new(|| Box::new(DemoProcessor) as Box<dyn ProcessorChain>);

    let engine = PlaybackEngine::new(
        EngineConfig::default(),
        cache,
        queue,
        Some(resolver),
        vec![Arc::new(DemoSource)],
        decoder_factories,
        Some(processor_factory),
        Arc::new(ConsoleSink::default()) as Arc<dyn AudioSink>,
        None,
        Arc::new(NullReportingSink),
    );

    println!("=== Playback Demo ===");

    engine
        .play(PlayRequest { context_uri: Some("spotify:playlist:demo".to_string()), ..Default::default() })
        .await
        .expect("play should succeed");
    sleep(Duration::from_millis(100)).await;
    println!("state: {:?}", engine.current_state());

    engine.pause().await.expect("pause should succeed");
    println!("paused: {:?}", engine.current_state());

    engine.resume().await.expect("resume should succeed");
    println!("resumed: {:?}", engine.current_state());

    engine.dispatch(None, Command::SkipNext).await;
    sleep(Duration::from_millis(100)).await;
    println!("after skip: {:?}", engine.current_state());

    engine.stop().await.expect("stop should succeed");
    println!("=== Demo Complete ===");
}
