use std::io::{self, Write};
use std::net::{Shutdown, TcpStream};

/// A byte destination that can be closed explicitly.
///
/// `Write` alone has no notion of end of stream. Chunked framing needs one to emit its
/// terminator and sockets need one to release the connection.
pub trait Sink: Write {
    fn close(&mut self) -> io::Result<()>;
}

impl Sink for Vec<u8> {
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Sink for TcpStream {
    fn close(&mut self) -> io::Result<()> {
        self.flush()?;
        shutdown_quietly(self.shutdown(Shutdown::Both))
    }
}

impl<S: Sink + ?Sized> Sink for &mut S {
    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

/// The peer may already be gone when we close, that is not worth an error.
pub(crate) fn shutdown_quietly(result: io::Result<()>) -> io::Result<()> {
    match result {
        Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
        other => other,
    }
}
