//! Transfer coding decoders and the chain that stacks them.
//!
//! A `Transfer-Encoding` value lists codings in the order they were applied, so the
//! decoders are stacked in reverse: the last listed coding is removed first, directly on
//! top of the raw source.

mod chunked_decoder;
mod chunked_encoder;

pub use chunked_decoder::ChunkedDecoder;
pub use chunked_encoder::ChunkedEncoder;

use crate::protocol::{BodyReader, ProtocolError};
use flate2::read::{DeflateDecoder, GzDecoder};
use std::io::{self, Read};
use std::str::FromStr;

/// A transfer coding this engine knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentCoding {
    Chunked,
    Gzip,
    /// Raw DEFLATE, without zlib framing
    Deflate,
    /// Recognized, but every read fails with [`io::ErrorKind::Unsupported`]
    Compress,
    Identity,
}

impl FromStr for ContentCoding {
    type Err = ProtocolError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let token = token.trim();
        let coding = match token.to_ascii_lowercase().as_str() {
            "chunked" => Self::Chunked,
            "gzip" | "x-gzip" => Self::Gzip,
            "deflate" => Self::Deflate,
            "compress" | "x-compress" => Self::Compress,
            "identity" => Self::Identity,
            _ => return Err(ProtocolError::UnknownCoding(token.to_owned())),
        };
        Ok(coding)
    }
}

impl ContentCoding {
    /// Parses a comma separated coding list, skipping empty tokens.
    pub fn parse_list(list: &str) -> Result<Vec<Self>, ProtocolError> {
        list.split(',').filter(|token| !token.trim().is_empty()).map(str::parse).collect()
    }

    fn decode(self, inner: BodyReader) -> BodyReader {
        match self {
            Self::Chunked => Box::new(ChunkedDecoder::new(inner)),
            Self::Gzip => Box::new(GzDecoder::new(inner)),
            Self::Deflate => Box::new(DeflateDecoder::new(inner)),
            Self::Compress => Box::new(UnsupportedReader { _inner: inner }),
            Self::Identity => inner,
        }
    }
}

/// Stacks decoders for `codings` on top of `source`.
///
/// Every token is validated before any decoder is built, so an unknown coding fails
/// without touching the source.
pub fn decode_chain(source: BodyReader, codings: Option<&str>) -> Result<BodyReader, ProtocolError> {
    let Some(codings) = codings else {
        return Ok(source);
    };

    let codings = ContentCoding::parse_list(codings)?;
    Ok(codings.into_iter().rev().fold(source, |reader, coding| coding.decode(reader)))
}

struct UnsupportedReader {
    _inner: BodyReader,
}

impl Read for UnsupportedReader {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::Unsupported, "compress coding is not supported"))
    }
}
