//! Blocking decoder for HTTP chunked transfer encoding.
//!
//! See [RFC 7230 Section 4.1](https://tools.ietf.org/html/rfc7230#section-4.1). Each chunk is
//! a hexadecimal size line, optionally followed by `;` extensions, then the chunk data and
//! a CRLF. A zero sized chunk ends the body.

use crate::protocol::ProtocolError;
use std::io::{self, ErrorKind, Read};
use tracing::trace;
use ChunkedState::{Finished, Remaining, Size};

/// Longest size line we accept, extensions included.
const MAX_SIZE_LINE: usize = 1024;

/// Exposes the decoded payload of a chunked stream through [`Read`].
///
/// The first size line is only read on the first call to `read`, so building the decoder
/// never touches the source. Once the terminating chunk has been seen every read returns
/// `Ok(0)` without further I/O.
#[derive(Debug)]
pub struct ChunkedDecoder<R> {
    inner: R,
    state: ChunkedState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkedState {
    /// Next bytes are a size line
    Size,
    /// Bytes left in the current chunk
    Remaining(u64),
    /// Terminating chunk seen
    Finished,
}

impl<R: Read> ChunkedDecoder<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, state: Size }
    }

    pub fn is_finished(&self) -> bool {
        self.state == Finished
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    fn read_size_line(&mut self) -> io::Result<u64> {
        let mut line = Vec::with_capacity(16);
        let mut byte = [0u8; 1];

        while !line.ends_with(b"\r\n") {
            if line.len() >= MAX_SIZE_LINE {
                return Err(ProtocolError::invalid_chunk("chunk size line too long").into());
            }
            if self.inner.read(&mut byte)? == 0 {
                return Err(io::Error::new(ErrorKind::UnexpectedEof, "stream closed inside chunk size line"));
            }
            line.push(byte[0]);
        }

        let line = &line[..line.len() - 2];
        let size = match line.iter().position(|&b| b == b';') {
            Some(index) => &line[..index],
            None => line,
        };
        let size = std::str::from_utf8(size)
            .map_err(|_utf8| ProtocolError::invalid_chunk("chunk size is not ascii"))?
            .trim();

        u64::from_str_radix(size, 16)
            .map_err(|_parse| ProtocolError::invalid_chunk(format!("invalid chunk size {size:?}")).into())
    }

    fn read_chunk_end(&mut self) -> io::Result<()> {
        let mut crlf = [0u8; 2];
        self.inner.read_exact(&mut crlf)?;
        if &crlf == b"\r\n" {
            Ok(())
        } else {
            Err(ProtocolError::invalid_chunk("chunk data is not followed by CRLF").into())
        }
    }
}

impl<R: Read> Read for ChunkedDecoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            match self.state {
                Finished => return Ok(0),
                Size => {
                    let size = self.read_size_line()?;
                    trace!(size, "read chunk size");
                    self.state = if size == 0 { Finished } else { Remaining(size) };
                }
                Remaining(remaining) => {
                    if buf.is_empty() {
                        return Ok(0);
                    }

                    let max = usize::try_from(remaining).unwrap_or(usize::MAX).min(buf.len());
                    let read = self.inner.read(&mut buf[..max])?;
                    if read == 0 {
                        return Err(io::Error::new(ErrorKind::UnexpectedEof, "stream closed inside chunk data"));
                    }

                    let remaining = remaining - read as u64;
                    if remaining == 0 {
                        self.read_chunk_end()?;
                        self.state = Size;
                    } else {
                        self.state = Remaining(remaining);
                    }
                    return Ok(read);
                }
            }
        }
    }
}
