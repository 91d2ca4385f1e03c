//! The blocking server.
//!
//! [`HttpServer`] binds a listener, polls it from a dedicated accept thread and hands each
//! accepted connection to an [`Executor`]. Every connection carries exactly one request.
//!
//! ```no_run
//! use socket_http::handler::NotFoundHandler;
//! use socket_http::server::{HttpServer, ThreadPool};
//!
//! let handle = HttpServer::builder()
//!     .host("127.0.0.1")
//!     .port(8080)
//!     .handler(NotFoundHandler)
//!     .executor(ThreadPool::new(4)?)
//!     .build()?
//!     .start()?;
//! handle.join();
//! # Ok::<(), socket_http::protocol::ServerError>(())
//! ```

mod executor;
mod http_server;

pub use executor::{Executor, InlineExecutor, Task, ThreadPerTask, ThreadPool};
pub use http_server::{
    DEFAULT_BACKLOG, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_SOCKET_TIMEOUT, HttpServer, ServerBuilder, ServerHandle,
    ServerState,
};
