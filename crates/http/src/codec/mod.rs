//! Wire codecs for HTTP/1.1 messages.
//!
//! - Heads: [`read_head`] pulls a bounded head off a buffered source,
//!   [`parse_request`] / [`parse_response`] turn it into messages, and
//!   [`write_request_head`] / [`write_response_head`] render them back
//! - Bodies: [`decode_chain`] stacks [`ContentCoding`] decoders over a live source,
//!   [`ChunkedEncoder`] frames outgoing payloads
//! - [`Sink`]: the closable byte destination bodies are piped into

mod body;
mod head_reader;
mod message_parser;
mod message_writer;
mod sink;

pub use body::{ChunkedDecoder, ChunkedEncoder, ContentCoding, decode_chain};
pub use head_reader::{DEFAULT_MAX_HEADER_SIZE, read_head};
pub use message_parser::{parse_request, parse_response};
pub use message_writer::{write_request_head, write_response_head};
pub use sink::Sink;
pub(crate) use sink::shutdown_quietly;
