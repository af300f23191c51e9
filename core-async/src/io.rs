//! Async I/O traits, re-exported from `tokio::io`.
//!
//! Used by `TrackSource`/`Decoder` implementations to move encrypted CDN
//! bytes and decoded PCM without a direct `tokio` dependency.

pub use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt, AsyncWrite,
    AsyncWriteExt, BufReader, BufWriter, ReadBuf,
};
