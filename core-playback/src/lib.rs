//! # Core Playback
//!
//! The playback engine sitting at the center of the client: resolves a
//! context into an ordered track queue, drives the
//! `TrackSource -> Decoder -> ProcessorChain -> AudioSink` pipeline one track
//! at a time, and publishes a reactive [`state::PlaybackState`] snapshot plus
//! an error channel to whatever UI/remote layer is observing.
//!
//! ## Modules
//!
//! - [`engine`] - [`engine::PlaybackEngine`], the command processor and
//!   per-track playback loop
//! - [`command`] - the command vocabulary the engine accepts
//! - [`config`] - [`config::EngineConfig`] and its presets
//! - [`state`] - the published [`state::PlaybackState`] snapshot and shuffle/
//!   repeat option bits
//! - [`error`] - [`error::PlaybackError`] and the broadcastable
//!   [`error::ErrorEvent`]
//! - [`reporting`] - session/playback identity and transition-metrics events
//! - [`uri`] - URI shape validation and scheme classification
//! - [`snapshot`] - header-snapshot replay for non-seekable decoder probing
//!
//! Concrete `TrackSource`/`Decoder`/`ProcessorChain`/`AudioSink`
//! implementations are host-provided; only their contracts
//! ([`bridge_traits::pipeline`]) are referenced here.

pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod reporting;
pub mod snapshot;
pub mod state;
pub mod uri;

pub use command::{Command, PlayRequest};
pub use config::EngineConfig;
pub use engine::{DecoderFactory, PlaybackEngine, ProcessorChainFactory};
pub use error::{ErrorEvent, PlaybackError, Result};
pub use reporting::{NullReportingSink, ReportingEvent, ReportingSink};
pub use state::{PlaybackOptions, PlaybackState};
