//! Resolves context URIs (playlists, albums, stations, single tracks) into
//! ordered, enriched track lists, paging transparently against a remote
//! context service and tolerating partial metadata failures.

pub mod error;
pub mod resolver;
pub mod source;
pub mod types;

pub use error::{ContextError, Result};
pub use resolver::ContextResolver;
pub use source::{ContextPage, ContextPageSource, MetadataBatchSource, RemoteTrackMetadata};
pub use types::{is_infinite_context, ContextHandle, ContextLoadResult, TrackDescriptor};
