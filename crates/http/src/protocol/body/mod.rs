//! Message bodies.
//!
//! A [`Body`] is either empty, an owned buffer, or a live stream. Buffered and empty
//! bodies can be read any number of times. A stream body is single use: the first
//! consumption succeeds and every later one fails with [`StreamError::BodyUsed`].
//!
//! The [`Payload`] trait is the shared read contract. Requests and responses implement it
//! too by forwarding to the body they carry.

mod stream_body;

pub(crate) use stream_body::StreamBody;

use crate::codec::{Sink, decode_chain};
use crate::protocol::{ProtocolError, StreamError};
use bytes::Bytes;
use std::io::{self, Read};

/// Boxed reader handed out by [`Payload::open_stream`].
pub type BodyReader = Box<dyn Read + Send>;

/// Bytes moved per write when piping a body into a sink.
pub const PIPE_CHUNK_SIZE: usize = 8 * 1024;

#[derive(Debug)]
pub struct Body {
    kind: Kind,
}

#[derive(Debug)]
enum Kind {
    Empty,
    Buffer(Bytes),
    Stream(StreamBody),
}

impl Body {
    pub fn empty() -> Self {
        Self { kind: Kind::Empty }
    }

    /// Wraps a live source as a single use stream body.
    pub fn from_reader<R: Read + Send + 'static>(reader: R) -> Self {
        Self { kind: Kind::Stream(StreamBody::new(Box::new(reader))) }
    }

    /// Wraps a live source behind the decoders listed in `codings`.
    pub(crate) fn decoded(reader: BodyReader, codings: Option<&str>) -> Result<Self, ProtocolError> {
        let reader = decode_chain(reader, codings)?;
        Ok(Self { kind: Kind::Stream(StreamBody::new(reader)) })
    }

    pub fn is_stream(&self) -> bool {
        matches!(self.kind, Kind::Stream(_))
    }

    /// Copies an empty or buffered body; stream bodies can not be duplicated.
    pub fn try_clone(&self) -> Result<Self, StreamError> {
        match &self.kind {
            Kind::Empty => Ok(Self::empty()),
            Kind::Buffer(bytes) => Ok(Self { kind: Kind::Buffer(bytes.clone()) }),
            Kind::Stream(_) => Err(StreamError::NotCloneable),
        }
    }

    /// Releases a stream source without reading it.
    pub fn close(&mut self) {
        if let Kind::Stream(stream) = &mut self.kind {
            stream.close();
        }
    }

    fn read_bytes(&mut self) -> Result<Bytes, StreamError> {
        match &mut self.kind {
            Kind::Empty => Ok(Bytes::new()),
            Kind::Buffer(bytes) => Ok(Bytes::copy_from_slice(bytes)),
            Kind::Stream(stream) => {
                let mut reader = stream.take()?;
                let mut buf = Vec::new();
                reader.read_to_end(&mut buf).map_err(read_error)?;
                Ok(Bytes::from(buf))
            }
        }
    }

    fn reader(&mut self) -> Result<BodyReader, StreamError> {
        match &mut self.kind {
            Kind::Empty => Ok(Box::new(io::empty())),
            Kind::Buffer(bytes) => Ok(Box::new(io::Cursor::new(Bytes::copy_from_slice(bytes)))),
            Kind::Stream(stream) => Ok(Box::new(stream.take()?)),
        }
    }

    fn copy_to(&mut self, sink: &mut dyn Sink) -> Result<u64, StreamError> {
        match &mut self.kind {
            Kind::Empty => Ok(0),
            Kind::Buffer(bytes) => {
                let mut slice: &[u8] = bytes;
                copy_chunks(&mut slice, sink)
            }
            Kind::Stream(stream) => {
                let mut reader = stream.take()?;
                copy_chunks(&mut reader, sink)
            }
        }
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Self { kind: Kind::Buffer(bytes) }
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Bytes::from(bytes).into()
    }
}

impl From<&[u8]> for Body {
    fn from(bytes: &[u8]) -> Self {
        Bytes::copy_from_slice(bytes).into()
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Bytes::from(text).into()
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Bytes::copy_from_slice(text.as_bytes()).into()
    }
}

/// Read access shared by bodies and the messages carrying them.
pub trait Payload {
    /// The concrete body behind this payload, `None` when there is nothing to read.
    fn terminal_body(&mut self) -> Option<&mut Body>;

    fn is_used(&self) -> bool;

    /// An owned copy of the whole payload.
    fn bytes(&mut self) -> Result<Bytes, StreamError> {
        match self.terminal_body() {
            Some(body) => body.read_bytes(),
            None => Ok(Bytes::new()),
        }
    }

    /// The whole payload as text, invalid UTF-8 replaced.
    fn text(&mut self) -> Result<String, StreamError> {
        let bytes = self.bytes()?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn open_stream(&mut self) -> Result<BodyReader, StreamError> {
        match self.terminal_body() {
            Some(body) => body.reader(),
            None => Ok(Box::new(io::empty())),
        }
    }

    /// Copies the payload into `sink` in [`PIPE_CHUNK_SIZE`] pieces, flushing after each.
    ///
    /// With `close_sink` the sink is closed afterwards even if there was no body or the
    /// copy failed. Returns the number of payload bytes written.
    fn pipe_to(&mut self, sink: &mut dyn Sink, close_sink: bool) -> Result<u64, StreamError> {
        let copied = match self.terminal_body() {
            Some(body) => body.copy_to(sink),
            None => Ok(0),
        };

        if close_sink {
            let closed = sink.close().map_err(|e| StreamError::io("close sink", e));
            copied.and_then(|written| closed.map(|()| written))
        } else {
            copied
        }
    }
}

impl Payload for Body {
    fn terminal_body(&mut self) -> Option<&mut Body> {
        if matches!(self.kind, Kind::Empty) { None } else { Some(self) }
    }

    fn is_used(&self) -> bool {
        match &self.kind {
            Kind::Stream(stream) => stream.is_used(),
            Kind::Empty | Kind::Buffer(_) => false,
        }
    }
}

fn copy_chunks(reader: &mut dyn Read, sink: &mut dyn Sink) -> Result<u64, StreamError> {
    let mut buf = vec![0u8; PIPE_CHUNK_SIZE];
    let mut total = 0u64;
    loop {
        let read = match reader.read(&mut buf) {
            Ok(0) => return Ok(total),
            Ok(read) => read,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(read_error(e)),
        };
        sink.write_all(&buf[..read]).map_err(|e| StreamError::io("write body", e))?;
        sink.flush().map_err(|e| StreamError::io("flush body", e))?;
        total += read as u64;
    }
}

fn read_error(e: io::Error) -> StreamError {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        StreamError::UnexpectedEof
    } else {
        StreamError::Read { source: e }
    }
}
