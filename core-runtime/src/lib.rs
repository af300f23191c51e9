//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the playback core:
//! - Logging and tracing infrastructure
//! - Configuration management (host bridges, feature flags)
//! - Event bus system
//!
//! ## Overview
//!
//! This crate contains the runtime utilities the other playback-core crates
//! depend on. It establishes the logging conventions and event broadcasting
//! mechanism used to observe `PlaybackEngine` activity from a single place.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
