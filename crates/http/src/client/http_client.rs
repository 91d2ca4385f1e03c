use crate::client::data_url::fetch_data_url;
use crate::codec::{ChunkedEncoder, DEFAULT_MAX_HEADER_SIZE, parse_response, read_head, write_request_head};
use crate::connection::{ClientSocketFactory, SocketOptions, TcpSocketFactory, Transport};
use crate::protocol::{HttpRequest, HttpResponse, NetworkError, Payload, StreamError};
use bytes::BytesMut;
use http::header;
use std::io::{BufReader, Write};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};
use url::{Host, Url};

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_SOCKET_TIMEOUT: Duration = Duration::from_secs(15);

const READ_BUFFER_SIZE: usize = 8 * 1024;

#[derive(Debug, Clone)]
pub struct ClientBuilder {
    connect_timeout: Duration,
    socket_timeout: Duration,
    max_header_size: usize,
    socket_factory: Arc<dyn ClientSocketFactory>,
    socket_options: SocketOptions,
}

impl ClientBuilder {
    fn new() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            socket_timeout: DEFAULT_SOCKET_TIMEOUT,
            max_header_size: DEFAULT_MAX_HEADER_SIZE,
            socket_factory: Arc::new(TcpSocketFactory),
            socket_options: SocketOptions::client(),
        }
    }

    #[must_use]
    pub fn connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    /// Read timeout once connected, [`Duration::ZERO`] disables it.
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
    pub fn socket_factory<F: ClientSocketFactory + 'static>(mut self, socket_factory: F) -> Self {
        self.socket_factory = Arc::new(socket_factory);
        self
    }

    #[must_use]
    pub fn socket_options(mut self, socket_options: SocketOptions) -> Self {
        self.socket_options = socket_options;
        self
    }

    pub fn build(self) -> HttpClient {
        let read_timeout = (!self.socket_timeout.is_zero()).then_some(self.socket_timeout);
        HttpClient {
            connect_timeout: self.connect_timeout,
            max_header_size: self.max_header_size,
            socket_factory: self.socket_factory,
            socket_options: self.socket_options.with_read_timeout(read_timeout),
        }
    }
}

/// A blocking client opening one connection per request.
#[derive(Debug, Clone)]
pub struct HttpClient {
    connect_timeout: Duration,
    max_header_size: usize,
    socket_factory: Arc<dyn ClientSocketFactory>,
    socket_options: SocketOptions,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Like [`HttpClient::fetch`], but any failure turns into `None`.
    pub fn opt(&self, request: &mut HttpRequest) -> Option<HttpResponse> {
        match self.fetch(request) {
            Ok(response) => Some(response),
            Err(e) => {
                debug!(cause = %e, url = request.url(), "fetch failed");
                None
            }
        }
    }

    /// Sends `request` and reads the response head.
    ///
    /// The `host` header is overwritten, and a body without `content-length` is sent
    /// chunked. The response body is read eagerly when its length is known, otherwise it
    /// streams from the open connection.
    pub fn fetch(&self, request: &mut HttpRequest) -> Result<HttpResponse, NetworkError> {
        let url = Url::parse(request.url()).map_err(|e| NetworkError::invalid_url(format!("{}: {e}", request.url())))?;

        let port = match url.scheme() {
            "data" => return fetch_data_url(&url),
            "http" => url.port().unwrap_or(80),
            "https" => url.port().unwrap_or(443),
            scheme => return Err(NetworkError::UnsupportedScheme(scheme.to_owned())),
        };

        let (host, host_header) = match url.host() {
            Some(Host::Domain(domain)) => (domain.to_owned(), domain.to_owned()),
            Some(Host::Ipv4(address)) => (address.to_string(), address.to_string()),
            Some(Host::Ipv6(address)) => (address.to_string(), format!("[{address}]")),
            None => return Err(NetworkError::invalid_url(format!("{url}: missing host"))),
        };

        let mut transport = self
            .socket_factory
            .connect(&host, port, self.connect_timeout, &self.socket_options)
            .map_err(NetworkError::connect)?;
        trace!(%url, "connected to origin");

        self.send_request(&mut transport, request, &url, host_header, port)?;

        let mut reader = BufReader::with_capacity(READ_BUFFER_SIZE, transport);
        let head = read_head(&mut reader, self.max_header_size).map_err(transport_failure)?;
        parse_response(&String::from_utf8_lossy(&head), Box::new(reader)).map_err(transport_failure)
    }

    fn send_request(
        &self,
        transport: &mut Box<dyn Transport>,
        request: &mut HttpRequest,
        url: &Url,
        host_header: String,
        port: u16,
    ) -> Result<(), NetworkError> {
        let has_body = request.body().is_some();
        let chunked = has_body && !request.headers().has(header::CONTENT_LENGTH);

        let method = request.method().clone();
        let headers = request.headers_mut();
        if port == 80 || port == 443 {
            headers.set(header::HOST, host_header);
        } else {
            headers.set(header::HOST, format!("{host_header}:{port}"));
        }
        if chunked {
            headers.set(header::TRANSFER_ENCODING, "chunked");
        }

        let mut head = BytesMut::new();
        write_request_head(&mut head, &method, &request_target(url), headers).map_err(NetworkError::connect)?;
        transport.write_all(&head).map_err(NetworkError::connect)?;
        transport.flush().map_err(NetworkError::connect)?;

        if !has_body {
            return Ok(());
        }

        if chunked {
            let mut encoder = ChunkedEncoder::new(&mut *transport);
            request.pipe_to(&mut encoder, false).map_err(stream_failure)?;
            encoder.finish().map_err(NetworkError::connect)?;
        } else {
            request.pipe_to(transport, false).map_err(stream_failure)?;
        }
        Ok(())
    }
}

/// `path[?query][#fragment]`, as it goes on the request line.
fn request_target(url: &Url) -> String {
    let mut target = match url.path() {
        "" => "/".to_owned(),
        path => path.to_owned(),
    };
    if let Some(query) = url.query() {
        target.push('?');
        target.push_str(query);
    }
    if let Some(fragment) = url.fragment() {
        target.push('#');
        target.push_str(fragment);
    }
    target
}

/// Socket side failures are `Connect`; a failing upload source stays a [`StreamError::Read`].
fn stream_failure(e: StreamError) -> NetworkError {
    match e {
        StreamError::Io { source, .. } => NetworkError::connect(source),
        other => other.into(),
    }
}

fn transport_failure(e: NetworkError) -> NetworkError {
    match e {
        NetworkError::Stream { source } => stream_failure(source),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Body;
    use http::Method;
    use std::io::{BufRead, Read};
    use std::net::TcpListener;
    use std::thread;

    /// Serves one canned `response` and returns the raw request the client sent.
    fn origin(response: &'static str, read_body: usize) -> (u16, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = std::io::BufReader::new(stream.try_clone().unwrap());
            let mut received = String::new();
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                received.push_str(&line);
                if line == "\r\n" {
                    break;
                }
            }
            let mut body = vec![0; read_body];
            reader.read_exact(&mut body).unwrap();
            received.push_str(&String::from_utf8_lossy(&body));

            (&stream).write_all(response.as_bytes()).unwrap();
            received
        });

        (port, server)
    }

    #[test]
    fn builds_request_line_and_host() {
        let (port, server) = origin("HTTP/1.1 204 No Content\r\ncontent-length: 0\r\n\r\n", 0);

        let mut request = HttpRequest::new(format!("http://127.0.0.1:{port}/a%20b?x=1#top"));
        let response = HttpClient::new().fetch(&mut request).unwrap();
        assert_eq!(response.status(), 204);
        assert_eq!(response.reason(), "No Content");

        let received = server.join().unwrap();
        assert_eq!(received, format!("GET /a%20b?x=1#top HTTP/1.1\r\nhost: 127.0.0.1:{port}\r\n\r\n"));
    }

    #[test]
    fn streams_body_without_length_as_chunks() {
        let expected = concat!(
            "POST / HTTP/1.1\r\nhost: 127.0.0.1:PORT\r\ntransfer-encoding: chunked\r\n\r\n",
            "4\r\nping\r\n0\r\n\r\n",
        );
        let (port, server) = origin("HTTP/1.1 200 OK\r\ncontent-length: 4\r\n\r\npong", 14);

        let mut request = HttpRequest::new(format!("http://127.0.0.1:{port}/"))
            .with_method(Method::POST)
            .with_body(Body::from_reader(&b"ping"[..]));
        let mut response = HttpClient::new().fetch(&mut request).unwrap();
        assert_eq!(response.text().unwrap(), "pong");

        assert_eq!(server.join().unwrap(), expected.replace("PORT", &port.to_string()));
    }

    #[test]
    fn sends_body_with_length_as_is() {
        let (port, server) = origin("HTTP/1.1 200 OK\r\ncontent-length: 0\r\n\r\n", 4);

        let mut request = HttpRequest::new(format!("http://127.0.0.1:{port}/"))
            .with_method(Method::PUT)
            .with_header("content-length", "4")
            .with_body("data");
        HttpClient::new().fetch(&mut request).unwrap();

        let received = server.join().unwrap();
        assert!(!received.contains("transfer-encoding"));
        assert!(received.ends_with("\r\n\r\ndata"));
    }

    #[test]
    fn failing_upload_source_is_stream_error() {
        struct Failing;
        impl Read for Failing {
            fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("disk gone"))
            }
        }

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut received = Vec::new();
            let _ = stream.read_to_end(&mut received);
        });

        let mut request = HttpRequest::new(format!("http://127.0.0.1:{port}/"))
            .with_method(Method::POST)
            .with_body(Body::from_reader(Failing));
        let error = HttpClient::new().fetch(&mut request).unwrap_err();
        assert!(matches!(error, NetworkError::Stream { source: StreamError::Read { .. } }), "{error:?}");
        assert_eq!(error.to_string(), "stream error: failed to read body: disk gone");

        server.join().unwrap();
    }

    #[test]
    fn sink_failures_are_connect_errors() {
        let broken = std::io::Error::from(std::io::ErrorKind::BrokenPipe);
        assert!(matches!(
            stream_failure(StreamError::io("write body", broken)),
            NetworkError::Connect { .. }
        ));
        assert!(matches!(stream_failure(StreamError::UnexpectedEof), NetworkError::Stream { .. }));
    }

    #[test]
    fn unsupported_scheme_is_rejected() {
        let mut request = HttpRequest::new("ftp://localhost/file");
        let result = HttpClient::new().fetch(&mut request);
        assert!(matches!(result, Err(NetworkError::UnsupportedScheme(scheme)) if scheme == "ftp"));
    }

    #[test]
    fn invalid_url_is_rejected() {
        let mut request = HttpRequest::new("not a url");
        assert!(matches!(HttpClient::new().fetch(&mut request), Err(NetworkError::InvalidUrl { .. })));
    }

    #[test]
    fn refused_connection_is_connect_error() {
        let port = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
        let mut request = HttpRequest::new(format!("http://127.0.0.1:{port}/"));

        assert!(matches!(HttpClient::new().fetch(&mut request), Err(NetworkError::Connect { .. })));
        assert!(HttpClient::new().opt(&mut request).is_none());
    }

    #[test]
    fn data_url_needs_no_network() {
        let mut request = HttpRequest::new("data:,hello");
        let mut response = HttpClient::new().fetch(&mut request).unwrap();
        assert_eq!(response.text().unwrap(), "hello");
    }

    #[test]
    fn default_ports_are_left_out_of_host() {
        let url = Url::parse("http://example.com/").unwrap();
        assert_eq!(url.port(), None);
        assert_eq!(request_target(&url), "/");
    }
}
