//! Async runtime primitives shared across the playback core.
//!
//! All `core-*` crates depend on this crate rather than reaching for `tokio`
//! directly, so the runtime surface used by the playback path is collected in
//! one place.
//!
//! # Modules
//!
//! - `task`: task spawning and joining
//! - `time`: sleep, timeout, interval
//! - `sync`: channels and locks (re-exported from `tokio::sync`)
//! - `io` / `fs`: async I/O re-exports
//!
//! # Examples
//!
//! ```rust
//! use core_async::task;
//! use core_async::time::{sleep, Duration};
//!
//! async fn example() {
//!     let handle = task::spawn(async {
//!         sleep(Duration::from_secs(1)).await;
//!         42
//!     });
//!     let _ = handle.await;
//! }
//! ```

pub mod fs;
pub mod io;
pub mod runtime;
pub mod sync;
pub mod task;
pub mod time;

pub use task::spawn;
pub use time::{sleep, Duration, Instant};
