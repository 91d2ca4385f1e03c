//! Connection handling.
//!
//! - [`Transport`] / [`Acceptor`]: the byte streams and listeners the engine talks through,
//!   opened by [`ClientSocketFactory`] and [`ServerSocketFactory`]
//! - [`SocketOptions`]: buffer sizes, timeouts and TCP flags per connection role
//! - [`HttpConnection`]: the single request/response cycle of an accepted connection

mod http_connection;
mod transport;

pub use http_connection::{HttpConnection, SERVER_NAME, internal_error};
pub use transport::{Acceptor, ClientSocketFactory, ServerSocketFactory, SocketOptions, TcpSocketFactory, Transport};
