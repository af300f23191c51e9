//! Engine configuration.
//!
//! Mirrors the shape of a streaming-service config: serde-defaulted fields,
//! a `validate()` pass, and named presets for common deployment profiles.

use serde::{Deserialize, Serialize};

/// Requested audio quality tier, interpreted by the `TrackSource`/CDN layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PreferredQuality {
    Normal,
    High,
    VeryHigh,
    Lossless,
}

impl Default for PreferredQuality {
    fn default() -> Self {
        PreferredQuality::Normal
    }
}

fn default_report_spotify_tracks() -> bool {
    true
}

fn default_report_podcasts() -> bool {
    true
}

fn default_report_http_streams() -> bool {
    false
}

fn default_report_local_files() -> bool {
    false
}

/// Which URI schemes generate `NewPlaybackId`/`TrackTransition` reporting
/// events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventReportingConfig {
    #[serde(default = "default_report_spotify_tracks")]
    pub report_spotify_tracks: bool,
    #[serde(default = "default_report_podcasts")]
    pub report_podcasts: bool,
    #[serde(default = "default_report_http_streams")]
    pub report_http_streams: bool,
    #[serde(default = "default_report_local_files")]
    pub report_local_files: bool,
}

impl Default for EventReportingConfig {
    fn default() -> Self {
        Self {
            report_spotify_tracks: default_report_spotify_tracks(),
            report_podcasts: default_report_podcasts(),
            report_http_streams: default_report_http_streams(),
            report_local_files: default_report_local_files(),
        }
    }
}

fn default_hot_track_size() -> usize {
    10_000
}

fn default_context_cache_size() -> usize {
    50
}

fn default_aux_cache_size() -> usize {
    1_000
}

/// Cache sizing knobs, forwarded to [`core_cache::CacheConfig`] (and, for
/// `context_cache_size`, to whatever host-side context cache the deployment
/// wires up alongside the resolver).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSizesConfig {
    #[serde(default = "default_hot_track_size")]
    pub hot_track_size: usize,
    #[serde(default = "default_context_cache_size")]
    pub context_cache_size: usize,
    #[serde(default = "default_aux_cache_size")]
    pub aux_cache_size: usize,
}

impl Default for CacheSizesConfig {
    fn default() -> Self {
        Self {
            hot_track_size: default_hot_track_size(),
            context_cache_size: default_context_cache_size(),
            aux_cache_size: default_aux_cache_size(),
        }
    }
}

impl CacheSizesConfig {
    pub fn to_core_cache_config(&self) -> core_cache::CacheConfig {
        core_cache::CacheConfig {
            max_hot: self.hot_track_size,
            max_aux: self.aux_cache_size,
            ..Default::default()
        }
    }
}

fn default_preferred_quality() -> PreferredQuality {
    PreferredQuality::Normal
}

fn default_enable_caching() -> bool {
    true
}

fn default_enable_normalization() -> bool {
    true
}

fn default_normalization_target_lufs() -> f32 {
    -14.0
}

fn default_initial_volume() -> f32 {
    1.0
}

fn default_enable_local_files() -> bool {
    true
}

fn default_enable_http_streams() -> bool {
    true
}

fn default_sink_buffer_ms() -> u32 {
    100
}

fn default_state_publish_interval_ms() -> u64 {
    500
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_preferred_quality")]
    pub preferred_quality: PreferredQuality,

    #[serde(default = "default_enable_caching")]
    pub enable_caching: bool,

    #[serde(default = "default_enable_normalization")]
    pub enable_normalization: bool,

    /// Loudness normalization target, in LUFS. Negative; default `-14.0`.
    #[serde(default = "default_normalization_target_lufs")]
    pub normalization_target_lufs: f32,

    /// Initial output volume, in `[0.0, 1.0]`.
    #[serde(default = "default_initial_volume")]
    pub initial_volume: f32,

    #[serde(default = "default_enable_local_files")]
    pub enable_local_files: bool,

    #[serde(default = "default_enable_http_streams")]
    pub enable_http_streams: bool,

    #[serde(default)]
    pub event_reporting: EventReportingConfig,

    #[serde(default)]
    pub cache: CacheSizesConfig,

    /// Target sink-side buffer depth, passed to `AudioSink::initialize`.
    #[serde(default = "default_sink_buffer_ms")]
    pub sink_buffer_ms: u32,

    /// Minimum spacing between `PlaybackState` publishes during playback.
    #[serde(default = "default_state_publish_interval_ms")]
    pub state_publish_interval_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            preferred_quality: default_preferred_quality(),
            enable_caching: default_enable_caching(),
            enable_normalization: default_enable_normalization(),
            normalization_target_lufs: default_normalization_target_lufs(),
            initial_volume: default_initial_volume(),
            enable_local_files: default_enable_local_files(),
            enable_http_streams: default_enable_http_streams(),
            event_reporting: EventReportingConfig::default(),
            cache: CacheSizesConfig::default(),
            sink_buffer_ms: default_sink_buffer_ms(),
            state_publish_interval_ms: default_state_publish_interval_ms(),
        }
    }
}

impl EngineConfig {
    /// Smaller buffer, faster state publishes, at the cost of underrun risk
    /// on unstable connections.
    pub fn low_latency() -> Self {
        Self {
            sink_buffer_ms: 50,
            state_publish_interval_ms: 250,
            ..Default::default()
        }
    }

    /// Lossless-preferring, larger buffer, conservative publish cadence.
    pub fn high_quality() -> Self {
        Self {
            preferred_quality: PreferredQuality::Lossless,
            sink_buffer_ms: 200,
            enable_normalization: true,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.initial_volume) {
            return Err("initial_volume must be between 0.0 and 1.0".to_string());
        }
        if self.normalization_target_lufs > 0.0 {
            return Err("normalization_target_lufs must be negative".to_string());
        }
        if self.sink_buffer_ms == 0 {
            return Err("sink_buffer_ms must be > 0".to_string());
        }
        if self.state_publish_interval_ms == 0 {
            return Err("state_publish_interval_ms must be > 0".to_string());
        }
        if self.cache.hot_track_size == 0 || self.cache.context_cache_size == 0 || self.cache.aux_cache_size == 0 {
            return Err("cache sizes must be > 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cache.hot_track_size, 10_000);
        assert!(config.event_reporting.report_spotify_tracks);
        assert!(!config.event_reporting.report_http_streams);
    }

    #[test]
    fn low_latency_trims_buffers() {
        let config = EngineConfig::low_latency();
        assert!(config.validate().is_ok());
        assert!(config.sink_buffer_ms < EngineConfig::default().sink_buffer_ms);
    }

    #[test]
    fn high_quality_prefers_lossless() {
        let config = EngineConfig::high_quality();
        assert!(config.validate().is_ok());
        assert_eq!(config.preferred_quality, PreferredQuality::Lossless);
    }

    #[test]
    fn out_of_range_volume_is_rejected() {
        let mut config = EngineConfig::default();
        config.initial_volume = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn positive_lufs_target_is_rejected() {
        let mut config = EngineConfig::default();
        config.normalization_target_lufs = 3.0;
        assert!(config.validate().is_err());
    }
}
