//! Two-tier metadata cache sitting on the playback fast path.
//!
//! A bounded in-memory LRU (`hot`) fronts a durable key-value store
//! (`cold`, provided by the host via [`bridge_traits::store::DurableStore`]).
//! Small bounded maps hold audio keys, CDN URLs, and head bytes separately
//! from the rest of a track's metadata so a CDN refresh doesn't require
//! touching the whole entry.

mod aux;
pub mod config;
pub mod entry;
pub mod error;
pub mod manager;
pub mod stats;

pub use config::CacheConfig;
pub use entry::{CdnEntry, TrackCacheEntry};
pub use error::{CacheError, Result};
pub use manager::MetadataCache;
pub use stats::CacheStatistics;
