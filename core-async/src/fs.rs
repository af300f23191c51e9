//! Async filesystem helpers, re-exported from `tokio::fs`.
//!
//! Used by cold-tier store implementations and TrackSource adapters that
//! read local files.

pub use tokio::fs::{
    self, copy, create_dir, create_dir_all, hard_link, metadata, read, read_dir, read_link,
    read_to_string, remove_dir, remove_dir_all, remove_file, rename, set_permissions,
    symlink_metadata, write, DirBuilder, DirEntry, File, OpenOptions,
};
