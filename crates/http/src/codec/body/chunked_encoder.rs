use crate::codec::Sink;
use std::io::{self, Write};
use tracing::trace;

const TERMINATOR: &[u8] = b"0\r\n\r\n";

/// Frames every write as one chunk on the wrapped sink.
///
/// A write of `n > 0` bytes emits `{n:x}\r\n`, the bytes and `\r\n`, then flushes. Empty
/// writes emit nothing so they can never be taken for the terminating chunk.
#[derive(Debug)]
pub struct ChunkedEncoder<S: Sink> {
    inner: S,
    eof: bool,
    closed: bool,
}

impl<S: Sink> ChunkedEncoder<S> {
    pub fn new(inner: S) -> Self {
        Self { inner, eof: false, closed: false }
    }

    /// Writes the terminating chunk, leaving the wrapped sink open.
    pub fn finish(&mut self) -> io::Result<()> {
        if self.eof {
            return Ok(());
        }
        self.eof = true;
        trace!("write chunked terminator");
        self.inner.write_all(TERMINATOR)?;
        self.inner.flush()
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: Sink> Write for ChunkedEncoder<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.eof {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "chunked stream already terminated"));
        }

        let mut frame = Vec::with_capacity(buf.len() + 12);
        write!(frame, "{:x}\r\n", buf.len())?;
        frame.extend_from_slice(buf);
        frame.extend_from_slice(b"\r\n");

        self.inner.write_all(&frame)?;
        self.inner.flush()?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<S: Sink> Sink for ChunkedEncoder<S> {
    fn close(&mut self) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.finish()?;
        self.closed = true;
        self.inner.close()
    }
}
