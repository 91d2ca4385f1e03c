use crate::codec::DEFAULT_MAX_HEADER_SIZE;
use crate::connection::{Acceptor, HttpConnection, ServerSocketFactory, SocketOptions, TcpSocketFactory, Transport};
use crate::handler::{Handler, NotFoundHandler};
use crate::logger::{HttpLogger, TracingLogger};
use crate::protocol::ServerError;
use crate::server::{Executor, InlineExecutor};
use std::fmt;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{error, info};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_BACKLOG: u32 = 255;
pub const DEFAULT_SOCKET_TIMEOUT: Duration = Duration::from_secs(10);

/// Pause of the accept loop whenever no connection is pending.
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(30);

/// Lifecycle of a server: stopped, bound, accepting, and stopped again once closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Stopped,
    Bound,
    Accepting,
}

pub struct ServerBuilder {
    host: String,
    port: u16,
    backlog: u32,
    socket_timeout: Duration,
    max_header_size: usize,
    handler: Arc<dyn Handler>,
    logger: Arc<dyn HttpLogger>,
    executor: Arc<dyn Executor>,
    socket_factory: Arc<dyn ServerSocketFactory>,
    listener_options: SocketOptions,
    connection_options: SocketOptions,
}

impl ServerBuilder {
    fn new() -> Self {
        Self {
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT,
            backlog: DEFAULT_BACKLOG,
            socket_timeout: DEFAULT_SOCKET_TIMEOUT,
            max_header_size: DEFAULT_MAX_HEADER_SIZE,
            handler: Arc::new(NotFoundHandler),
            logger: Arc::new(TracingLogger),
            executor: Arc::new(InlineExecutor),
            socket_factory: Arc::new(TcpSocketFactory),
            listener_options: SocketOptions::server_listener(),
            connection_options: SocketOptions::server_connection(),
        }
    }

    #[must_use]
    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.host = host.into();
        self
    }

    /// `0` lets the system pick a free port, see [`ServerHandle::local_addr`].
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn backlog(mut self, backlog: u32) -> Self {
        self.backlog = backlog;
        self
    }

    /// Read timeout of accepted connections, [`Duration::ZERO`] disables it.
    #[must_use]
    pub fn socket_timeout(mut self, socket_timeout: Duration) -> Self {
        self.socket_timeout = socket_timeout;
        self
    }

    #[must_use]
    pub fn max_header_size(mut self, max_header_size: usize) -> Self {
        self.max_header_size = max_header_size;
        self
    }

    #[must_use]
    pub fn handler<H: Handler + 'static>(mut self, handler: H) -> Self {
        self.handler = Arc::new(handler);
        self
    }

    #[must_use]
    pub fn logger<L: HttpLogger + 'static>(mut self, logger: L) -> Self {
        self.logger = Arc::new(logger);
        self
    }

    #[must_use]
    pub fn executor<E: Executor + 'static>(mut self, executor: E) -> Self {
        self.executor = Arc::new(executor);
        self
    }

    #[must_use]
    pub fn socket_factory<F: ServerSocketFactory + 'static>(mut self, socket_factory: F) -> Self {
        self.socket_factory = Arc::new(socket_factory);
        self
    }

    /// Options for accepted connections; the read timeout is taken from
    /// [`ServerBuilder::socket_timeout`].
    #[must_use]
    pub fn connection_options(mut self, options: SocketOptions) -> Self {
        self.connection_options = options;
        self
    }

    pub fn build(self) -> Result<HttpServer, ServerError> {
        if self.max_header_size == 0 {
            return Err(ServerError::invalid_config("max header size must be positive"));
        }

        let address = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| ServerError::invalid_config(format!("can't resolve {}:{}: {e}", self.host, self.port)))?
            .next()
            .ok_or_else(|| ServerError::invalid_config(format!("no address for {}:{}", self.host, self.port)))?;

        let read_timeout = (!self.socket_timeout.is_zero()).then_some(self.socket_timeout);

        Ok(HttpServer {
            address,
            backlog: self.backlog,
            max_header_size: self.max_header_size,
            handler: self.handler,
            logger: self.logger,
            executor: self.executor,
            socket_factory: self.socket_factory,
            listener_options: self.listener_options,
            connection_options: self.connection_options.with_read_timeout(read_timeout),
        })
    }
}

impl fmt::Debug for ServerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerBuilder")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("backlog", &self.backlog)
            .field("socket_timeout", &self.socket_timeout)
            .field("max_header_size", &self.max_header_size)
            .finish_non_exhaustive()
    }
}

/// A configured server that has not been started yet.
pub struct HttpServer {
    address: SocketAddr,
    backlog: u32,
    max_header_size: usize,
    handler: Arc<dyn Handler>,
    logger: Arc<dyn HttpLogger>,
    executor: Arc<dyn Executor>,
    socket_factory: Arc<dyn ServerSocketFactory>,
    listener_options: SocketOptions,
    connection_options: SocketOptions,
}

impl HttpServer {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    pub fn address(&self) -> SocketAddr {
        self.address
    }

    /// Binds the listener and runs the accept loop on its own thread.
    pub fn start(self) -> Result<ServerHandle, ServerError> {
        let address = self.address;
        let bind_error = |source: io::Error| ServerError::Bind { address, source };

        let acceptor = self.socket_factory.bind(address, self.backlog, &self.listener_options).map_err(bind_error)?;
        acceptor.set_nonblocking(true).map_err(bind_error)?;
        let local_addr = acceptor.local_addr().map_err(bind_error)?;

        let shared = Arc::new(Shared { closed: AtomicBool::new(false), state: Mutex::new(ServerState::Bound) });

        info!(address = %local_addr, "start listening");
        self.logger.log(format_args!("listening on {local_addr}"));

        let accept_shared = Arc::clone(&shared);
        let thread = thread::Builder::new()
            .name("socket-http-acceptor".into())
            .spawn(move || self.accept_loop(&*acceptor, &accept_shared))
            .map_err(|source| ServerError::Spawn { source })?;

        Ok(ServerHandle { local_addr, shared, thread: Some(thread) })
    }

    fn accept_loop(self, acceptor: &dyn Acceptor, shared: &Shared) {
        shared.set_state(ServerState::Accepting);

        while !shared.closed.load(Ordering::Acquire) {
            match acceptor.accept() {
                Ok((transport, peer)) => self.dispatch(transport, peer),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => thread::sleep(ACCEPT_POLL_INTERVAL),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    self.logger.error(format_args!("failed to accept connection: {e}"));
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
            }
        }

        shared.set_state(ServerState::Stopped);
        info!(address = %self.address, "stop listening");
    }

    fn dispatch(&self, transport: Box<dyn Transport>, peer: SocketAddr) {
        if let Err(e) = transport.configure(&self.connection_options) {
            self.logger.warn(format_args!("failed to configure connection from {peer}: {e}"));
            return;
        }

        let handler = Arc::clone(&self.handler);
        let logger = Arc::clone(&self.logger);
        let max_header_size = self.max_header_size;

        self.executor.execute(Box::new(move || {
            let connection = HttpConnection::new(transport, peer);
            if let Err(e) = connection.process(&*handler, &*logger, max_header_size) {
                logger.error(format_args!("connection from {peer} failed: {e}"));
            }
        }));
    }
}

impl fmt::Debug for HttpServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpServer")
            .field("address", &self.address)
            .field("backlog", &self.backlog)
            .field("max_header_size", &self.max_header_size)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
struct Shared {
    closed: AtomicBool,
    state: Mutex<ServerState>,
}

impl Shared {
    fn set_state(&self, state: ServerState) {
        match self.state.lock() {
            Ok(mut current) => *current = state,
            Err(e) => error!(cause = %e, "server state lock poisoned"),
        }
    }
}

/// Controls a started server.
///
/// Dropping the handle closes the server like [`ServerHandle::close`] without waiting for
/// the accept loop; the listener is released once the loop notices.
#[derive(Debug)]
#[must_use = "dropping the handle stops the server"]
pub struct ServerHandle {
    local_addr: SocketAddr,
    shared: Arc<Shared>,
    thread: Option<JoinHandle<()>>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn state(&self) -> ServerState {
        self.shared.state.lock().map_or(ServerState::Stopped, |state| *state)
    }

    /// Asks the accept loop to stop. Connections already handed to the executor finish
    /// on their own.
    pub fn close(&self) {
        self.shared.closed.store(true, Ordering::Release);
    }

    /// Waits for the accept loop to exit.
    pub fn join(mut self) {
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            error!("accept loop panicked");
        }
    }

    pub fn stop(self) {
        self.close();
        self.join();
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{BoxError, make_handler};
    use crate::protocol::{HttpRequest, HttpResponse};
    use crate::server::ThreadPool;
    use std::io::{Read, Write};
    use std::net::TcpStream;
    use std::time::Instant;

    fn get(address: SocketAddr, path: &str) -> String {
        let mut stream = TcpStream::connect(address).unwrap();
        write!(stream, "GET {path} HTTP/1.1\r\nHost: localhost\r\n\r\n").unwrap();
        let mut received = String::new();
        stream.read_to_string(&mut received).unwrap();
        received
    }

    fn wait_for(handle: &ServerHandle, state: ServerState) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while handle.state() != state && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(handle.state(), state);
    }

    #[test]
    fn default_handler_answers_404() {
        let handle = HttpServer::builder().host("127.0.0.1").port(0).build().unwrap().start().unwrap();

        let received = get(handle.local_addr(), "/missing");
        assert!(received.starts_with("HTTP/1.1 404\r\n"), "{received}");
        assert!(received.ends_with("404 Not Found\r\n0\r\n\r\n"));

        handle.stop();
    }

    #[test]
    fn state_follows_lifecycle() {
        let handle = HttpServer::builder().host("127.0.0.1").port(0).build().unwrap().start().unwrap();
        wait_for(&handle, ServerState::Accepting);

        handle.close();
        wait_for(&handle, ServerState::Stopped);
        handle.join();
    }

    #[test]
    fn pooled_server_serves_handler() {
        let handler = make_handler(|request: HttpRequest| {
            let response = HttpResponse::new(200).with_header("content-length", "2").with_body(&request.path()[1..3]);
            Ok::<_, BoxError>(Some(response))
        });
        let handle = HttpServer::builder()
            .host("127.0.0.1")
            .port(0)
            .handler(handler)
            .executor(ThreadPool::new(2).unwrap())
            .build()
            .unwrap()
            .start()
            .unwrap();

        let received = get(handle.local_addr(), "/ok");
        assert!(received.ends_with("\r\n\r\nok"), "{received}");

        handle.stop();
    }

    #[test]
    fn bind_conflict_is_reported() {
        let first = HttpServer::builder().host("127.0.0.1").port(0).build().unwrap().start().unwrap();
        let taken = first.local_addr().port();

        let result = HttpServer::builder().host("127.0.0.1").port(taken).build().unwrap().start();
        assert!(matches!(result, Err(ServerError::Bind { .. })));

        first.stop();
    }

    #[test]
    fn dropped_handle_releases_port() {
        let handle = HttpServer::builder().host("127.0.0.1").port(0).build().unwrap().start().unwrap();
        let port = handle.local_addr().port();
        drop(handle);

        let deadline = Instant::now() + Duration::from_secs(5);
        let rebound = loop {
            match HttpServer::builder().host("127.0.0.1").port(port).build().unwrap().start() {
                Ok(handle) => break handle,
                Err(ServerError::Bind { .. }) if Instant::now() < deadline => thread::sleep(Duration::from_millis(10)),
                Err(e) => panic!("port {port} was not released: {e}"),
            }
        };

        assert_eq!(rebound.local_addr().port(), port);
        rebound.stop();
    }

    #[test]
    fn unresolvable_host_is_invalid_config() {
        let result = HttpServer::builder().host("not a host name").port(80).build();
        assert!(matches!(result, Err(ServerError::InvalidConfig { .. })));
    }
}
