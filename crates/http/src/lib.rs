//! A minimal blocking HTTP/1.1 engine over TCP sockets
//!
//! This crate provides a small HTTP/1.1 client and a concurrent server sharing one protocol
//! layer. Every connection carries exactly one request/response exchange and every call
//! blocks, bounded by connect and read timeouts.
//!
//! # Features
//!
//! - Request and status line parsing with a bounded header block
//! - Case insensitive, multi valued, sortable headers
//! - Empty, buffered and single use stream bodies
//! - Chunked transfer encoding in both directions
//! - `gzip` and `deflate` content decoding
//! - `data:` URLs answered locally by the client
//! - Pluggable socket factories, executors, handlers and loggers
//!
//! # Example
//!
//! ```no_run
//! use http::StatusCode;
//! use socket_http::handler::{BoxError, make_handler};
//! use socket_http::protocol::{HttpRequest, HttpResponse};
//! use socket_http::server::{HttpServer, ThreadPool};
//! use tracing::{Level, error, info};
//! use tracing_subscriber::FmtSubscriber;
//!
//! fn main() {
//!     let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
//!     tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
//!
//!     let server = HttpServer::builder()
//!         .host("127.0.0.1")
//!         .port(8080)
//!         .handler(make_handler(hello_world))
//!         .executor(ThreadPool::new(4).expect("failed to start workers"))
//!         .build()
//!         .and_then(|server| server.start());
//!
//!     match server {
//!         Ok(handle) => {
//!             info!(address = %handle.local_addr(), "serving");
//!             handle.join();
//!         }
//!         Err(e) => error!(cause = %e, "failed to start server"),
//!     }
//! }
//!
//! fn hello_world(request: HttpRequest) -> Result<Option<HttpResponse>, BoxError> {
//!     info!(path = request.path(), "request path");
//!
//!     let body = "Hello World!\r\n";
//!     let response = HttpResponse::plain_text(StatusCode::OK, body)
//!         .with_reason("OK")
//!         .with_header(http::header::CONTENT_LENGTH, body.len().to_string());
//!     Ok(Some(response))
//! }
//! ```
//!
//! # Architecture
//!
//! - [`protocol`]: headers, bodies, requests, responses and errors
//! - [`codec`]: the wire format, heads and body codings
//! - [`connection`]: transports, socket options and the per connection cycle
//! - [`handler`]: request handlers
//! - [`logger`]: the server event sink
//! - [`server`]: listener, accept loop and executors
//! - [`client`]: the one request per connection client
//!
//! ## Bodies
//!
//! Bodies implement [`protocol::Payload`]. A buffered body can be read any number of times,
//! a stream body exactly once; reading it again fails with
//! [`protocol::StreamError::BodyUsed`]. Response bodies without a `content-length` go out
//! chunked.
//!
//! ## Error Handling
//!
//! - [`protocol::NetworkError`]: top level error every other error converts into
//! - [`protocol::ProtocolError`]: malformed wire data
//! - [`protocol::StreamError`]: body and transport I/O failures
//! - [`protocol::ServerError`]: bind and configuration failures
//!
//! A failing connection is closed on its own; it never stops the accept loop.
//!
//! # Limitations
//!
//! - HTTP/1.1 only, no keep-alive and no pipelining
//! - No TLS transport is bundled, plug one in through the socket factories
//! - Trailers after the last chunk are not read

pub mod client;
pub mod codec;
pub mod connection;
pub mod handler;
pub mod logger;
pub mod protocol;
pub mod server;

mod utils;
pub(crate) use utils::ensure;
