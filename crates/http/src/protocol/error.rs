use std::io;
use std::net::SocketAddr;
use thiserror::Error;

/// Top level error of the engine, every other error converts into it.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("failed to connect to origin server: {source}")]
    Connect { source: io::Error },

    #[error("invalid url: {reason}")]
    InvalidUrl { reason: String },

    #[error("unsupported url scheme: {0}")]
    UnsupportedScheme(String),

    #[error("protocol error: {source}")]
    Protocol {
        #[from]
        source: ProtocolError,
    },

    #[error("stream error: {source}")]
    Stream {
        #[from]
        source: StreamError,
    },

    #[error("server error: {source}")]
    Server {
        #[from]
        source: ServerError,
    },
}

impl NetworkError {
    pub fn connect<E: Into<io::Error>>(e: E) -> Self {
        Self::Connect { source: e.into() }
    }

    pub fn invalid_url<S: ToString>(str: S) -> Self {
        Self::InvalidUrl { reason: str.to_string() }
    }
}

/// Malformed data on the wire.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("empty message")]
    EmptyMessage,

    #[error("invalid request line: {0:?}")]
    InvalidRequestLine(String),

    #[error("invalid status line: {0:?}")]
    InvalidStatusLine(String),

    #[error("unsupported http version: {0:?}")]
    UnsupportedVersion(String),

    #[error("invalid request path: {0:?}")]
    InvalidPath(String),

    #[error("invalid http method: {0:?}")]
    InvalidMethod(String),

    #[error("invalid status code: {0:?}")]
    InvalidStatus(String),

    #[error("missing or empty host header")]
    MissingHost,

    #[error("invalid header entry: {0:?}")]
    InvalidHeader(String),

    #[error("invalid content-length header: {0:?}")]
    InvalidContentLength(String),

    #[error("unknown transfer coding: {0:?}")]
    UnknownCoding(String),

    #[error("header size too large, current: {current_size} exceed the limit {max_size}")]
    HeaderTooLarge { current_size: usize, max_size: usize },

    #[error("invalid chunk: {reason}")]
    InvalidChunk { reason: String },
}

impl ProtocolError {
    pub fn header_too_large(current_size: usize, max_size: usize) -> Self {
        Self::HeaderTooLarge { current_size, max_size }
    }

    pub fn invalid_chunk<S: ToString>(str: S) -> Self {
        Self::InvalidChunk { reason: str.to_string() }
    }
}

/// Failures while moving body bytes around.
#[derive(Error, Debug)]
pub enum StreamError {
    #[error("body has already been used")]
    BodyUsed,

    #[error("stream backed body can not be cloned")]
    NotCloneable,

    #[error("unexpected end of stream")]
    UnexpectedEof,

    /// The body's own source failed, as opposed to the sink it was copied into.
    #[error("failed to read body: {source}")]
    Read { source: io::Error },

    #[error("{context}: {source}")]
    Io { context: &'static str, source: io::Error },
}

impl StreamError {
    pub fn io<E: Into<io::Error>>(context: &'static str, e: E) -> Self {
        Self::Io { context, source: e.into() }
    }

    /// Returns true if this is the "already consumed" state error
    #[inline]
    pub fn is_body_used(&self) -> bool {
        matches!(self, StreamError::BodyUsed)
    }

    /// The wire level cause when a body failed on malformed framing or coding.
    pub fn protocol_error(&self) -> Option<&ProtocolError> {
        match self {
            StreamError::Read { source } | StreamError::Io { source, .. } => protocol_error_of(source),
            _ => None,
        }
    }
}

/// Failures while bringing a server up.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("failed to bind {address}: {source}")]
    Bind { address: SocketAddr, source: io::Error },

    #[error("invalid server config: {reason}")]
    InvalidConfig { reason: String },

    #[error("failed to spawn thread: {source}")]
    Spawn { source: io::Error },
}

impl ServerError {
    pub fn invalid_config<S: ToString>(str: S) -> Self {
        Self::InvalidConfig { reason: str.to_string() }
    }
}

/// Codec failures travel through `std::io::Read` as `InvalidData` errors carrying a
/// [`ProtocolError`]; this digs it back out.
pub(crate) fn protocol_error_of(e: &io::Error) -> Option<&ProtocolError> {
    e.get_ref().and_then(|inner| inner.downcast_ref::<ProtocolError>())
}

impl From<ProtocolError> for io::Error {
    fn from(e: ProtocolError) -> Self {
        io::Error::new(io::ErrorKind::InvalidData, e)
    }
}
