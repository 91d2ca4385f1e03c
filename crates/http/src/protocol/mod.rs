//! Core HTTP protocol types.
//!
//! - **Headers** ([`Header`], [`HeaderSet`]): normalized entries in an ordered, multi valued
//!   container
//! - **Bodies** ([`body`]): empty, buffered and single use stream bodies behind the
//!   [`Payload`] contract
//! - **Messages** ([`HttpRequest`], [`HttpResponse`]): URL or status line data, headers and
//!   an optional body, both readable as a [`Payload`]
//! - **Errors** ([`NetworkError`] and the errors it wraps)
//!
//! Parsing and writing these types on the wire lives in [`crate::codec`].

mod header;
pub use header::Header;

mod headers;
pub use headers::HeaderSet;
pub use headers::HeaderValues;

mod request;
pub use request::HttpRequest;

mod response;
pub use response::HttpResponse;

mod error;
pub use error::NetworkError;
pub use error::ProtocolError;
pub use error::ServerError;
pub use error::StreamError;
#[cfg(test)]
pub(crate) use error::protocol_error_of;

pub mod body;
pub use body::Body;
pub use body::BodyReader;
pub use body::Payload;
