//! Wraps a non-seekable track stream so the decoder registry can probe it
//! with more than one candidate decoder. Bytes consumed while probing are
//! buffered and replayed; once a decoder is chosen the buffer is frozen and
//! reads fall straight through to the underlying stream.

use bridge_traits::platform::DynAsyncRead;
use core_async::io::{AsyncRead, ReadBuf};
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

pub struct HeaderSnapshotReader {
    inner: Box<DynAsyncRead>,
    buffered: Vec<u8>,
    replay_pos: usize,
    recording: bool,
}

impl HeaderSnapshotReader {
    pub fn new(inner: Box<DynAsyncRead>) -> Self {
        Self {
            inner,
            buffered: Vec::new(),
            replay_pos: 0,
            recording: true,
        }
    }

    /// Resets replay to the start of whatever has been captured so far, so
    /// the next decoder probe sees the same header bytes as the last one.
    pub fn rewind_for_replay(&mut self) {
        self.replay_pos = 0;
    }

    /// Stops growing the capture buffer once a decoder has been selected.
    /// Bytes already captured are still replayed before live reads resume.
    pub fn freeze(&mut self) {
        self.recording = false;
    }
}

impl AsyncRead for HeaderSnapshotReader {
    fn poll_read(mut self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        if self.replay_pos < self.buffered.len() {
            let remaining = &self.buffered[self.replay_pos..];
            let n = remaining.len().min(buf.remaining());
            buf.put_slice(&remaining[..n]);
            self.replay_pos += n;
            return Poll::Ready(Ok(()));
        }

        let before = buf.filled().len();
        let inner = Pin::new(&mut *self.inner);
        let poll = inner.poll_read(cx, buf);
        if let Poll::Ready(Ok(())) = &poll {
            if self.recording {
                let after = buf.filled().len();
                let captured = buf.filled()[before..after].to_vec();
                self.buffered.extend_from_slice(&captured);
                self.replay_pos = self.buffered.len();
            }
        }
        poll
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_async::io::AsyncReadExt;
    use std::io::Cursor;

    #[tokio::test]
    async fn replays_captured_header_then_resumes_live_reads() {
        let data = b"RIFF1234WAVEfmt more-data-after-header".to_vec();
        let inner: Box<DynAsyncRead> = Box::new(Cursor::new(data.clone()));
        let mut reader = HeaderSnapshotReader::new(inner);

        let mut first = [0u8; 4];
        reader.read_exact(&mut first).await.unwrap();
        assert_eq!(&first, b"RIFF");

        reader.rewind_for_replay();
        let mut replayed = [0u8; 4];
        reader.read_exact(&mut replayed).await.unwrap();
        assert_eq!(&replayed, b"RIFF");

        reader.rewind_for_replay();
        reader.freeze();
        let mut rest = Vec::new();
        reader.read_to_end(&mut rest).await.unwrap();
        assert_eq!(rest, data);
    }
}
