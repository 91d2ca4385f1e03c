//! The blocking client.
//!
//! [`HttpClient`] opens one connection per request over `http`/`https` URLs (the latter
//! needs a TLS capable [`ClientSocketFactory`](crate::connection::ClientSocketFactory))
//! and answers `data:` URLs locally.

mod data_url;
mod http_client;

pub use data_url::DEFAULT_MEDIA_TYPE;
pub use http_client::{ClientBuilder, DEFAULT_CONNECT_TIMEOUT, DEFAULT_SOCKET_TIMEOUT, HttpClient};
