//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the playback core and platform-specific
//! implementations. Each trait represents a capability the core requires but that
//! must be implemented differently per platform (desktop, iOS, Android, web): track
//! sources, codecs, and output devices are never linked directly into the core.
//!
//! ## Traits
//!
//! ### Pipeline
//! - [`TrackSource`](pipeline::TrackSource) - Locates and opens a track by URI
//! - [`Decoder`](pipeline::Decoder) - Decodes an opened stream into PCM buffers
//! - [`ProcessorChain`](pipeline::ProcessorChain) - Per-track PCM transforms
//! - [`AudioSink`](pipeline::AudioSink) - Drives the platform output device
//!
//! ### Networking & Storage
//! - [`HttpClient`](http::HttpClient) - Async HTTP operations with retry
//! - [`DurableStore`](store::DurableStore) - Cold tier backing the metadata cache
//! - [`CommandReplySender`](store::CommandReplySender) - Acknowledges queued commands
//!
//! ### Utilities
//! - [`Clock`](clock::Clock) - Time source for deterministic testing
//!
//! ## Platform Requirements
//!
//! Each supported platform must ship concrete adapters for every required bridge trait:
//!
//! | Platform | Implementation Crate | Status |
//! |----------|---------------------|--------|
//! | Desktop  | TBD                 | 📋 Planned |
//! | iOS      | TBD                 | 📋 Planned |
//! | Android  | TBD                 | 📋 Planned |
//!
//! ## Fail-Fast Strategy
//!
//! The core should fail fast with descriptive errors when a required capability is missing:
//!
//! ```ignore
//! use core_runtime::error::Error;
//!
//! pub fn build(self) -> Result<RuntimeConfig> {
//!     let cold_store = self.cold_store
//!         .ok_or_else(|| Error::CapabilityMissing {
//!             capability: "DurableStore".to_string(),
//!             message: "No DurableStore implementation provided.".to_string()
//!         })?;
//!     // ...
//! }
//! ```
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type for consistent
//! error handling. Platform implementations should:
//!
//! - Convert platform-specific errors to `BridgeError`
//! - Provide actionable error messages
//! - Include error context (e.g., URIs, network status)
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds (`Send` only for the stateful
//! `Decoder`) to support safe concurrent usage across async tasks.

pub mod clock;
pub mod error;
pub mod http;
pub mod pipeline;
pub mod platform;
pub mod store;

pub use error::BridgeError;

pub use clock::{Clock, SystemClock};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use pipeline::{
    AudioCodec, AudioFormat, AudioSink, Decoder, PcmBuffer, ProbeResult, ProcessorChain,
    SinkStatus, TrackSource, TrackStream, TrackStreamMetadata,
};
pub use platform::{DynAsyncRead, DynAsyncWrite, PlatformSend, PlatformSendSync};
pub use store::{CommandOutcome, CommandReplySender, DurableStore};
