//! # Runtime Configuration Module
//!
//! Assembles the host-provided bridges that sit outside the playback
//! pipeline proper: durable cold storage for the metadata cache, a clock for
//! deterministic timestamps, and an optional reply sender for a queued
//! command transport.
//!
//! ## Overview
//!
//! [`RuntimeConfig`] is built with [`RuntimeConfigBuilder`], which enforces
//! fail-fast validation so a host can't forget a required bridge and only
//! find out once playback starts failing.
//!
//! ## Required Dependencies
//!
//! - [`DurableStore`] - backs the cold tier of `core-cache`'s metadata cache
//! - `cache_dir` - where the host keeps any on-disk cache artifacts
//!
//! ## Optional Dependencies (with defaults)
//!
//! - [`Clock`] - defaults to [`SystemClock`]
//! - [`CommandReplySender`] - only needed when commands arrive over a queued
//!   transport rather than direct method calls
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::RuntimeConfig;
//! use std::sync::Arc;
//!
//! let config = RuntimeConfig::builder()
//!     .cache_dir("/var/cache/music")
//!     .cold_store(Arc::new(MyDurableStore))
//!     .build()
//!     .expect("failed to build runtime config");
//! ```

use crate::error::{Error, Result};
use bridge_traits::{Clock, CommandReplySender, DurableStore, SystemClock};
use std::path::PathBuf;
use std::sync::Arc;

/// Host bridges and settings needed to stand up the playback core outside of
/// the pipeline collaborators (`TrackSource`/`Decoder`/`ProcessorChain`/
/// `AudioSink`), which are wired directly into `PlaybackEngine::new`.
#[derive(Clone)]
pub struct RuntimeConfig {
    /// Directory the host reserves for on-disk cache artifacts.
    pub cache_dir: PathBuf,

    /// Cold tier backing `core-cache`'s two-tier metadata cache (required).
    pub cold_store: Arc<dyn DurableStore>,

    /// Time source for deterministic timestamps (defaults to the system
    /// clock).
    pub clock: Arc<dyn Clock>,

    /// Acknowledges commands dequeued from a host-owned transport. Only
    /// required when `features.enable_command_queue` is set.
    pub command_reply_sender: Option<Arc<dyn CommandReplySender>>,

    pub features: FeatureFlags,
}

impl std::fmt::Debug for RuntimeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeConfig")
            .field("cache_dir", &self.cache_dir)
            .field("cold_store", &"DurableStore { ... }")
            .field("clock", &"Clock { ... }")
            .field(
                "command_reply_sender",
                &self
                    .command_reply_sender
                    .as_ref()
                    .map(|_| "CommandReplySender { ... }"),
            )
            .field("features", &self.features)
            .finish()
    }
}

/// Feature flags controlling optional runtime behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeatureFlags {
    /// Commands arrive over a queued transport rather than direct calls into
    /// `PlaybackEngine`; requires a `CommandReplySender`.
    pub enable_command_queue: bool,

    /// Forward reporting events (track transitions, session ids) to a
    /// remote sink rather than discarding them.
    pub enable_remote_reporting: bool,
}

impl RuntimeConfig {
    /// Creates a new builder for constructing a `RuntimeConfig`.
    pub fn builder() -> RuntimeConfigBuilder {
        RuntimeConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.cache_dir.as_os_str().is_empty() {
            return Err(Error::Config("Cache directory cannot be empty".to_string()));
        }

        if self.features.enable_command_queue && self.command_reply_sender.is_none() {
            return Err(Error::Config(
                "Command queue enabled but no CommandReplySender provided. \
                 Disable the feature or inject a CommandReplySender implementation."
                    .to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for constructing [`RuntimeConfig`] instances.
#[derive(Default)]
pub struct RuntimeConfigBuilder {
    cache_dir: Option<PathBuf>,
    cold_store: Option<Arc<dyn DurableStore>>,
    clock: Option<Arc<dyn Clock>>,
    command_reply_sender: Option<Arc<dyn CommandReplySender>>,
    features: FeatureFlags,
}

impl RuntimeConfigBuilder {
    /// Sets the on-disk cache directory.
    pub fn cache_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.cache_dir = Some(path.into());
        self
    }

    /// Sets the cold-tier durable store (required).
    pub fn cold_store(mut self, store: Arc<dyn DurableStore>) -> Self {
        self.cold_store = Some(store);
        self
    }

    /// Sets the clock implementation (optional, defaults to `SystemClock`).
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Sets the command reply sender (optional).
    pub fn command_reply_sender(mut self, sender: Arc<dyn CommandReplySender>) -> Self {
        self.command_reply_sender = Some(sender);
        self
    }

    /// Enables or disables the queued command transport.
    ///
    /// Requires a `CommandReplySender` to be provided.
    pub fn enable_command_queue(mut self, enabled: bool) -> Self {
        self.features.enable_command_queue = enabled;
        self
    }

    /// Enables or disables forwarding reporting events remotely.
    pub fn enable_remote_reporting(mut self, enabled: bool) -> Self {
        self.features.enable_remote_reporting = enabled;
        self
    }

    /// Sets all feature flags at once.
    pub fn features(mut self, features: FeatureFlags) -> Self {
        self.features = features;
        self
    }

    /// Builds the final `RuntimeConfig` instance.
    ///
    /// # Errors
    ///
    /// Returns an error if `cache_dir` or `cold_store` were never set, or if
    /// the resulting configuration fails validation.
    pub fn build(self) -> Result<RuntimeConfig> {
        let cache_dir = self.cache_dir.ok_or_else(|| {
            Error::Config("Cache directory is required. Use .cache_dir() to set it.".to_string())
        })?;

        let cold_store = self.cold_store.ok_or_else(|| Error::CapabilityMissing {
            capability: "DurableStore".to_string(),
            message: "A DurableStore implementation is required to back the cold tier of the \
                      metadata cache. Inject a platform-appropriate durable key-value store."
                .to_string(),
        })?;

        let config = RuntimeConfig {
            cache_dir,
            cold_store,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            command_reply_sender: self.command_reply_sender,
            features: self.features,
        };

        config.validate()?;

        Ok(config)
    }
}
