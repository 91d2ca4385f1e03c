use crate::protocol::{BodyReader, StreamError};
use std::fmt;
use std::io::{self, Read};

/// A live, single use byte source.
///
/// The first consumption hands the source out and marks the body used. The source is
/// dropped, closing it, as soon as a reader reaches its end.
pub(crate) struct StreamBody {
    source: Option<BodyReader>,
    used: bool,
}

impl StreamBody {
    pub(crate) fn new(source: BodyReader) -> Self {
        Self { source: Some(source), used: false }
    }

    pub(crate) fn is_used(&self) -> bool {
        self.used
    }

    pub(crate) fn take(&mut self) -> Result<ClosingReader, StreamError> {
        if self.used {
            return Err(StreamError::BodyUsed);
        }
        self.used = true;
        self.source.take().map(ClosingReader::new).ok_or(StreamError::BodyUsed)
    }

    /// Releases the source without reading it.
    pub(crate) fn close(&mut self) {
        self.used = true;
        self.source = None;
    }
}

impl fmt::Debug for StreamBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamBody").field("used", &self.used).finish_non_exhaustive()
    }
}

/// Drops the wrapped reader at end of stream.
pub(crate) struct ClosingReader {
    inner: Option<BodyReader>,
}

impl ClosingReader {
    fn new(inner: BodyReader) -> Self {
        Self { inner: Some(inner) }
    }
}

impl Read for ClosingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let Some(inner) = self.inner.as_mut() else {
            return Ok(0);
        };

        let read = inner.read(buf)?;
        if read == 0 && !buf.is_empty() {
            self.inner = None;
        }
        Ok(read)
    }
}
