use crate::codec::{ChunkedEncoder, Sink, parse_request, read_head, write_response_head};
use crate::connection::Transport;
use crate::handler::Handler;
use crate::logger::HttpLogger;
use crate::protocol::{HttpResponse, NetworkError, Payload, StreamError};
use crate::utils::http_date;
use bytes::BytesMut;
use http::{Method, header};
use std::io::{BufReader, Write};
use std::net::{Shutdown, SocketAddr};
use tracing::{error, trace};

/// Value of the `server` header on every response.
pub const SERVER_NAME: &str = concat!("socket-http/", env!("CARGO_PKG_VERSION"));

const READ_BUFFER_SIZE: usize = 8 * 1024;

/// One accepted connection serving exactly one request.
///
/// The cycle is: read and parse the head, run the handler, half close the read side,
/// then write the response and close the transport. There is no keep-alive.
#[derive(Debug)]
pub struct HttpConnection {
    transport: Box<dyn Transport>,
    peer: SocketAddr,
}

impl HttpConnection {
    pub fn new(transport: Box<dyn Transport>, peer: SocketAddr) -> Self {
        Self { transport, peer }
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn process(
        mut self,
        handler: &dyn Handler,
        logger: &dyn HttpLogger,
        max_header_size: usize,
    ) -> Result<(), NetworkError> {
        let reader = self.transport.try_clone_transport().map_err(|e| StreamError::io("clone connection", e))?;
        let mut reader = BufReader::with_capacity(READ_BUFFER_SIZE, reader);

        let head = match read_head(&mut reader, max_header_size) {
            Ok(head) => head,
            Err(e) => {
                self.abort();
                return Err(e);
            }
        };

        let request = match parse_request(&String::from_utf8_lossy(&head), Box::new(reader)) {
            Ok(request) => request,
            Err(e) => {
                self.abort();
                return Err(e.into());
            }
        };

        let method = request.method().clone();
        trace!(peer = %self.peer, %method, url = request.url(), "received request");

        let response = match handler.handle(request) {
            Ok(Some(response)) => response,
            Ok(None) => {
                logger.warn(format_args!("handler returned no response for {} {method}, answering 500", self.peer));
                internal_error()
            }
            Err(e) => {
                logger.error(format_args!("handler failed for {} {method}: {e}", self.peer));
                internal_error()
            }
        };

        if let Err(e) = self.transport.shutdown(Shutdown::Read) {
            trace!(cause = %e, "failed to shutdown read side");
        }

        self.send_response(response, &method)
    }

    fn send_response(&mut self, mut response: HttpResponse, method: &Method) -> Result<(), NetworkError> {
        let has_body = response.body().is_some() && *method != Method::HEAD;
        let chunked = has_body && !response.headers().has(header::CONTENT_LENGTH);

        let status = response.status();
        let reason = response.reason().to_owned();
        let headers = response.headers_mut();
        if chunked {
            headers.set(header::TRANSFER_ENCODING, "chunked");
        }
        headers.set(header::DATE, http_date());
        headers.set(header::SERVER, SERVER_NAME);

        let mut head = BytesMut::new();
        write_response_head(&mut head, status, &reason, headers)
            .map_err(|e| StreamError::io("encode response head", e))?;
        if let Err(e) = self.transport.write_all(&head) {
            self.abort();
            return Err(StreamError::io("write response head", e).into());
        }

        if !has_body {
            self.transport.close().map_err(|e| StreamError::io("close connection", e))?;
            return Ok(());
        }

        let written = if chunked {
            let mut encoder = ChunkedEncoder::new(&mut self.transport);
            response.pipe_to(&mut encoder, true)
        } else {
            response.pipe_to(&mut self.transport, true)
        };

        match written {
            Ok(written) => {
                trace!(peer = %self.peer, status, written, chunked, "sent response");
                Ok(())
            }
            Err(e) => {
                self.abort();
                Err(e.into())
            }
        }
    }

    fn abort(&mut self) {
        if let Err(e) = self.transport.shutdown(Shutdown::Both) {
            error!(cause = %e, "failed to close connection");
        }
    }
}

/// The fixed answer substituted when a handler fails or returns nothing.
pub fn internal_error() -> HttpResponse {
    HttpResponse::new(500)
        .with_header(header::CONNECTION, "close")
        .with_header(header::CONTENT_TYPE, mime::TEXT_PLAIN.as_ref())
        .with_body("500 Internal Server Error")
}
