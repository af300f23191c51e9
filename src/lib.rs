//! Workspace root crate.
//!
//! Re-exports the playback core so a host application can depend on a single
//! crate instead of wiring `core-cache`, `core-context`, `core-queue`,
//! `core-playback`, and `core-runtime` individually.

pub use core_cache as cache;
pub use core_context as context;
pub use core_playback as playback;
pub use core_queue as queue;
pub use core_runtime as runtime;
