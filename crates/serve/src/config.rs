//! Command line and environment configuration of the launcher.
//!
//! Every flag can also be given through a `SOCKET_HTTP_*` environment variable:
//!
//! ```bash
//! SOCKET_HTTP_PORT=9000 SOCKET_HTTP_THREADS=0 socket-http --host 127.0.0.1
//! ```

use clap::Parser;
use socket_http::protocol::ServerError;
use socket_http::server::{HttpServer, InlineExecutor, ServerBuilder, ThreadPool};
use std::time::Duration;

#[derive(Debug, Clone, Parser)]
#[command(name = "socket-http", version, about = "A minimal blocking HTTP/1.1 server")]
pub struct Config {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0", env = "SOCKET_HTTP_HOST")]
    pub host: String,

    /// Port to listen on, 0 picks a free one
    #[arg(short, long, default_value_t = 8080, env = "SOCKET_HTTP_PORT")]
    pub port: u16,

    /// Worker threads, 0 serves every connection on the accept thread
    #[arg(
        short,
        long,
        default_value_t = 4,
        env = "SOCKET_HTTP_THREADS",
        value_parser = clap::value_parser!(u16).range(0..=1024)
    )]
    pub threads: u16,

    /// Listen backlog
    #[arg(long, default_value_t = 255, env = "SOCKET_HTTP_BACKLOG")]
    pub backlog: u32,

    /// Read timeout of accepted connections in milliseconds, 0 disables it
    #[arg(long = "socket-timeout-ms", default_value_t = 10_000, env = "SOCKET_HTTP_SOCKET_TIMEOUT_MS")]
    pub socket_timeout_ms: u64,

    /// Largest accepted request head in bytes
    #[arg(long, default_value_t = 65_536, env = "SOCKET_HTTP_MAX_HEADER_SIZE")]
    pub max_header_size: usize,
}

impl Config {
    /// A server builder carrying everything but the handler.
    pub fn server_builder(&self) -> Result<ServerBuilder, ServerError> {
        let builder = HttpServer::builder()
            .host(self.host.as_str())
            .port(self.port)
            .backlog(self.backlog)
            .socket_timeout(Duration::from_millis(self.socket_timeout_ms))
            .max_header_size(self.max_header_size);

        Ok(match self.threads {
            0 => builder.executor(InlineExecutor),
            threads => builder.executor(ThreadPool::new(usize::from(threads))?),
        })
    }
}
