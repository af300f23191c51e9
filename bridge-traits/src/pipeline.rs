//! Pipeline collaborator contracts.
//!
//! The playback loop drives four pluggable stages — `TrackSource`,
//! `Decoder`, `ProcessorChain`, `AudioSink` — without knowing their concrete
//! implementations. Encrypted CDN streams, local files, individual codecs,
//! and output device drivers are all external collaborators; only the
//! interfaces they expose are defined here.
//!
//! All errors are reported by returning an explicit error value or `false`
//! from the relevant method, never by interrupting the audio path mid-buffer
//! with a panic or an unrelated exception type.

use crate::{
    error::Result,
    platform::{PlatformSend, PlatformSendSync},
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

/// Supported audio codec identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AudioCodec {
    Mp3,
    Aac,
    Flac,
    Vorbis,
    Opus,
    Wav,
    Alac,
    /// Codec is unknown or not yet mapped to a dedicated variant.
    Unknown,
    /// Vendor-specific codec identified by name.
    Other(String),
}

impl AudioCodec {
    pub fn is_lossless(&self) -> bool {
        matches!(self, AudioCodec::Flac | AudioCodec::Wav | AudioCodec::Alac)
    }

    pub fn is_lossy(&self) -> bool {
        matches!(self, AudioCodec::Mp3 | AudioCodec::Aac | AudioCodec::Vorbis | AudioCodec::Opus)
    }
}

/// Negotiated PCM format produced by a [`Decoder`] and consumed by a
/// [`ProcessorChain`] and [`AudioSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFormat {
    pub codec: AudioCodec,
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: Option<u16>,
    pub bitrate: Option<u32>,
}

impl AudioFormat {
    pub fn new(
        codec: AudioCodec,
        sample_rate: u32,
        channels: u16,
        bits_per_sample: Option<u16>,
        bitrate: Option<u32>,
    ) -> Self {
        Self {
            codec,
            sample_rate,
            channels,
            bits_per_sample,
            bitrate,
        }
    }
}

/// A buffer of decoded (or processed) PCM samples, tagged with the stream
/// position of its first frame.
#[derive(Debug, Clone)]
pub struct PcmBuffer {
    /// Interleaved PCM samples in `[-1.0, 1.0]`.
    pub samples: Vec<f32>,
    /// Presentation position of the first frame in this buffer.
    pub position_ms: u64,
}

impl PcmBuffer {
    pub fn new(samples: Vec<f32>, position_ms: u64) -> Self {
        Self { samples, position_ms }
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Metadata a [`TrackSource`] surfaces about the stream it opened, cached by
/// the playback loop onto the current `PlaybackState` (title/artist/album,
/// `durationMs`, `canSeek`).
#[derive(Debug, Clone, Default)]
pub struct TrackStreamMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub duration_ms: Option<u64>,
    pub extra: HashMap<String, String>,
}

/// An opened track stream: metadata plus a byte reader the Decoder probes.
pub struct TrackStream {
    pub metadata: TrackStreamMetadata,
    pub can_seek: bool,
    pub reader: Box<crate::platform::DynAsyncRead>,
}

/// Locates and opens a track by URI. Each registered source is tried in
/// order; the first whose `can_handle` returns `true` is used.
#[async_trait]
pub trait TrackSource: PlatformSendSync {
    /// Returns `true` if this source recognizes the URI scheme/shape.
    fn can_handle(&self, uri: &str) -> bool;

    /// Opens the track, returning a stream plus metadata. Errors surface as
    /// `PlaybackError::TrackUnavailable` to the caller.
    async fn load(&self, uri: &str) -> Result<TrackStream>;

    /// Hints the source to pre-fetch data at `position`, used before a seek
    /// on a stream that cannot seek its underlying reader directly.
    async fn prefetch_for_seek(&self, uri: &str, position: Duration) -> Result<()> {
        let _ = (uri, position);
        Ok(())
    }
}

/// Result of sniffing/probing a stream before full decode.
#[derive(Debug, Clone)]
pub struct ProbeResult {
    pub format: AudioFormat,
    pub duration: Option<Duration>,
    pub tags: HashMap<String, String>,
}

/// Decodes an opened stream into PCM buffers. A decoder instance is
/// stateful: `can_decode` may consume bytes from the reader for sniffing, in
/// which case the caller must rewind before calling `get_format`/`decode`.
#[async_trait]
pub trait Decoder: PlatformSend {
    /// Probes the reader to decide whether this decoder can handle it.
    /// Implementations that consume a prefix for sniffing must leave it
    /// available for `get_format`/`decode` to re-read (registries rewind the
    /// stream between probes).
    async fn can_decode(&mut self, reader: &mut crate::platform::DynAsyncRead) -> bool;

    /// Negotiates the output `AudioFormat` for the stream.
    async fn get_format(&mut self, reader: &mut crate::platform::DynAsyncRead) -> Result<ProbeResult>;

    /// Decodes the next buffer starting at `start_ms` (only honored on the
    /// first call after a seek). Returns `Ok(None)` at end of stream.
    async fn decode(
        &mut self,
        reader: &mut crate::platform::DynAsyncRead,
        start_ms: Option<u64>,
    ) -> Result<Option<PcmBuffer>>;
}

/// Applies per-track transforms (e.g. loudness normalization gain) to
/// decoded PCM before it reaches the sink.
pub trait ProcessorChain: PlatformSend {
    /// Called once per track with the negotiated format.
    fn initialize(&mut self, format: &AudioFormat);

    /// Transforms one buffer. Implementations must not block.
    fn process(&mut self, buffer: PcmBuffer) -> PcmBuffer;
}

/// Current state of an [`AudioSink`], as reported by `status()`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SinkStatus {
    pub position_ms: u64,
    pub buffer_ms: u32,
    pub playing: bool,
}

/// Drives the platform output device. `write` blocks (suspends) the decode
/// loop when the sink's internal buffer is full, providing back-pressure.
#[async_trait]
pub trait AudioSink: PlatformSendSync {
    /// Prepares the sink for a new track's format with a target internal
    /// buffer size in milliseconds.
    async fn initialize(&self, format: &AudioFormat, buffer_ms: u32) -> Result<()>;

    /// Writes PCM bytes to the device, suspending while the buffer is full.
    /// Returns promptly if `cancel` fires mid-write.
    async fn write(&self, data: &[u8], cancel: &core_async::sync::CancellationToken) -> Result<()>;

    /// Pauses output without releasing device resources.
    async fn pause(&self) -> Result<()>;

    /// Resumes output. Returns `false` if the device is no longer available
    /// (the engine surfaces `AudioDeviceUnavailable` and stays paused).
    async fn resume(&self) -> Result<bool>;

    /// Discards any buffered-but-unplayed audio.
    async fn flush(&self) -> Result<()>;

    /// Current device status.
    async fn status(&self) -> SinkStatus;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_codec_classification() {
        assert!(AudioCodec::Flac.is_lossless());
        assert!(!AudioCodec::Flac.is_lossy());
        assert!(AudioCodec::Mp3.is_lossy());
        assert!(!AudioCodec::Mp3.is_lossless());
    }

    #[test]
    fn pcm_buffer_is_empty() {
        let buf = PcmBuffer::new(Vec::new(), 0);
        assert!(buf.is_empty());
        let buf = PcmBuffer::new(vec![0.0, 0.1], 10);
        assert!(!buf.is_empty());
    }
}
