//! Byte transports and the factories that open them.
//!
//! The engine never touches `TcpStream` directly past this module: clients connect through
//! a [`ClientSocketFactory`] and servers listen through a [`ServerSocketFactory`], so a TLS
//! transport can be plugged in without changing the protocol code.

use crate::codec::{Sink, shutdown_quietly};
use socket2::{Domain, Protocol, SockRef, Socket, Type};
use std::fmt;
use std::io::{self, Read};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::time::Duration;
use tracing::trace;

/// A connected, bidirectional byte stream.
pub trait Transport: Read + Sink + Send + fmt::Debug {
    /// A second handle to the same connection, used as the independent read half.
    fn try_clone_transport(&self) -> io::Result<Box<dyn Transport>>;

    fn shutdown(&self, how: Shutdown) -> io::Result<()>;

    fn peer_addr(&self) -> io::Result<SocketAddr>;

    /// Puts the transport in blocking mode and applies `options`.
    fn configure(&self, options: &SocketOptions) -> io::Result<()>;
}

impl Transport for TcpStream {
    fn try_clone_transport(&self) -> io::Result<Box<dyn Transport>> {
        Ok(Box::new(self.try_clone()?))
    }

    fn shutdown(&self, how: Shutdown) -> io::Result<()> {
        shutdown_quietly(TcpStream::shutdown(self, how))
    }

    fn peer_addr(&self) -> io::Result<SocketAddr> {
        TcpStream::peer_addr(self)
    }

    fn configure(&self, options: &SocketOptions) -> io::Result<()> {
        self.set_nonblocking(false)?;
        options.apply(&SockRef::from(self))
    }
}

/// A bound listener handing out accepted transports.
pub trait Acceptor: Send + fmt::Debug {
    /// Accepts one connection. In non blocking mode this fails with
    /// [`io::ErrorKind::WouldBlock`] when nothing is pending.
    fn accept(&self) -> io::Result<(Box<dyn Transport>, SocketAddr)>;

    fn local_addr(&self) -> io::Result<SocketAddr>;

    fn set_nonblocking(&self, nonblocking: bool) -> io::Result<()>;
}

impl Acceptor for TcpListener {
    fn accept(&self) -> io::Result<(Box<dyn Transport>, SocketAddr)> {
        let (stream, address) = TcpListener::accept(self)?;
        Ok((Box::new(stream), address))
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        TcpListener::local_addr(self)
    }

    fn set_nonblocking(&self, nonblocking: bool) -> io::Result<()> {
        TcpListener::set_nonblocking(self, nonblocking)
    }
}

/// Socket level settings applied to connected or listening sockets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SocketOptions {
    pub keep_alive: bool,
    pub no_delay: bool,
    pub reuse_address: bool,
    pub send_buffer_size: Option<usize>,
    pub recv_buffer_size: Option<usize>,
    /// `None` blocks forever
    pub read_timeout: Option<Duration>,
}

impl SocketOptions {
    /// Outgoing client connections: Nagle stays enabled, 64 KiB buffers, 15 s read timeout.
    pub fn client() -> Self {
        Self {
            keep_alive: false,
            no_delay: false,
            reuse_address: true,
            send_buffer_size: Some(64 * 1024),
            recv_buffer_size: Some(64 * 1024),
            read_timeout: Some(Duration::from_secs(15)),
        }
    }

    /// Accepted server connections: `TCP_NODELAY`, 64 KiB send and 8 KiB receive buffers.
    pub fn server_connection() -> Self {
        Self {
            keep_alive: false,
            no_delay: true,
            reuse_address: true,
            send_buffer_size: Some(64 * 1024),
            recv_buffer_size: Some(8 * 1024),
            read_timeout: Some(Duration::from_secs(10)),
        }
    }

    /// The listening socket itself.
    pub fn server_listener() -> Self {
        Self {
            keep_alive: false,
            no_delay: false,
            reuse_address: true,
            send_buffer_size: None,
            recv_buffer_size: Some(8 * 1024),
            read_timeout: None,
        }
    }

    #[must_use]
    pub fn with_read_timeout(mut self, read_timeout: Option<Duration>) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    fn apply(&self, socket: &Socket) -> io::Result<()> {
        socket.set_keepalive(self.keep_alive)?;
        socket.set_nodelay(self.no_delay)?;
        self.apply_listener(socket)?;
        if let Some(size) = self.send_buffer_size {
            socket.set_send_buffer_size(size)?;
        }
        socket.set_read_timeout(self.read_timeout)
    }

    fn apply_listener(&self, socket: &Socket) -> io::Result<()> {
        socket.set_reuse_address(self.reuse_address)?;
        if let Some(size) = self.recv_buffer_size {
            socket.set_recv_buffer_size(size)?;
        }
        Ok(())
    }
}

impl Default for SocketOptions {
    fn default() -> Self {
        Self::client()
    }
}

/// Opens client connections.
pub trait ClientSocketFactory: Send + Sync + fmt::Debug {
    fn connect(
        &self,
        host: &str,
        port: u16,
        connect_timeout: Duration,
        options: &SocketOptions,
    ) -> io::Result<Box<dyn Transport>>;
}

/// Opens server listeners.
pub trait ServerSocketFactory: Send + Sync + fmt::Debug {
    fn bind(&self, address: SocketAddr, backlog: u32, options: &SocketOptions) -> io::Result<Box<dyn Acceptor>>;
}

/// Plain TCP, for both sides.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpSocketFactory;

impl ClientSocketFactory for TcpSocketFactory {
    fn connect(
        &self,
        host: &str,
        port: u16,
        connect_timeout: Duration,
        options: &SocketOptions,
    ) -> io::Result<Box<dyn Transport>> {
        let mut last_error = None;

        for address in (host, port).to_socket_addrs()? {
            let socket = Socket::new(Domain::for_address(address), Type::STREAM, Some(Protocol::TCP))?;
            options.apply(&socket)?;

            match socket.connect_timeout(&address.into(), connect_timeout) {
                Ok(()) => {
                    trace!(%address, "connected");
                    return Ok(Box::new(TcpStream::from(socket)));
                }
                Err(e) => last_error = Some(e),
            }
        }

        Err(last_error
            .unwrap_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("no address found for {host}:{port}"))))
    }
}

impl ServerSocketFactory for TcpSocketFactory {
    fn bind(&self, address: SocketAddr, backlog: u32, options: &SocketOptions) -> io::Result<Box<dyn Acceptor>> {
        let socket = Socket::new(Domain::for_address(address), Type::STREAM, Some(Protocol::TCP))?;
        options.apply_listener(&socket)?;
        socket.bind(&address.into())?;
        socket.listen(i32::try_from(backlog).unwrap_or(i32::MAX))?;
        Ok(Box::new(TcpListener::from(socket)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn presets_follow_connection_roles() {
        assert!(!SocketOptions::client().no_delay);
        assert!(SocketOptions::server_connection().no_delay);
        assert_eq!(SocketOptions::server_connection().recv_buffer_size, Some(8 * 1024));
        assert_eq!(SocketOptions::client().with_read_timeout(None).read_timeout, None);
    }

    #[test]
    fn factory_connects_and_accepts() {
        let factory = TcpSocketFactory;
        let listener = factory
            .bind("127.0.0.1:0".parse().unwrap(), 16, &SocketOptions::server_listener())
            .unwrap();
        let address = listener.local_addr().unwrap();

        let mut client = factory
            .connect("127.0.0.1", address.port(), Duration::from_secs(5), &SocketOptions::client())
            .unwrap();
        client.write_all(b"ping").unwrap();
        client.close().unwrap();

        let (mut accepted, _peer) = listener.accept().unwrap();
        accepted.configure(&SocketOptions::server_connection()).unwrap();
        let mut received = String::new();
        accepted.read_to_string(&mut received).unwrap();
        assert_eq!(received, "ping");
    }

    #[test]
    fn connect_to_closed_port_fails() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let result = TcpSocketFactory.connect("127.0.0.1", port, Duration::from_secs(1), &SocketOptions::client());
        assert!(result.is_err());
    }
}
