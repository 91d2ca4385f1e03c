//! The log sink the server reports connection level events to.

use std::fmt;
use tracing::{error, info, warn};

/// Receives server events: accept failures, handler failures and broken connections.
pub trait HttpLogger: Send + Sync {
    fn log(&self, args: fmt::Arguments<'_>);

    fn warn(&self, args: fmt::Arguments<'_>);

    fn error(&self, args: fmt::Arguments<'_>);
}

/// Forwards every event to `tracing` under the `socket_http` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl HttpLogger for TracingLogger {
    fn log(&self, args: fmt::Arguments<'_>) {
        info!(target: "socket_http", "{args}");
    }

    fn warn(&self, args: fmt::Arguments<'_>) {
        warn!(target: "socket_http", "{args}");
    }

    fn error(&self, args: fmt::Arguments<'_>) {
        error!(target: "socket_http", "{args}");
    }
}
