//! Turns a raw message head plus the live source behind it into a request or response.
//!
//! The parser is tolerant where real peers are sloppy: lines may end in CRLF or bare LF,
//! a request path may contain spaces and a status line may carry no reason phrase.

use crate::ensure;
use crate::protocol::{Body, BodyReader, HeaderSet, HttpRequest, HttpResponse, NetworkError, ProtocolError, StreamError};
use http::{Method, header};
use std::io::Read;
use tracing::trace;

const HTTP_11: &str = "HTTP/1.1";
const HTTP_10: &str = "HTTP/1.0";

/// Parses a request head. The body is `source`, decoded per `Transfer-Encoding` and bounded
/// by `Content-Length` when one is present. With neither header the body is empty and
/// `source` is never read.
pub fn parse_request(head: &str, source: BodyReader) -> Result<HttpRequest, ProtocolError> {
    let (start_line, headers) = split_head(head)?;

    let invalid_line = || ProtocolError::InvalidRequestLine(start_line.to_owned());
    let (method, rest) = start_line.split_once(' ').ok_or_else(invalid_line)?;
    let (path, version) = rest.rsplit_once(' ').ok_or_else(invalid_line)?;
    let path = path.trim();

    ensure!(version == HTTP_11, ProtocolError::UnsupportedVersion(version.to_owned()));
    ensure!(path.starts_with('/'), ProtocolError::InvalidPath(path.to_owned()));
    let method =
        Method::from_bytes(method.as_bytes()).map_err(|_invalid| ProtocolError::InvalidMethod(method.to_owned()))?;

    let host = headers.get(header::HOST).filter(|host| !host.is_empty()).ok_or(ProtocolError::MissingHost)?;
    let url = format!("http://{host}{path}");

    // neither length nor coding: no body
    let codings = headers.get(header::TRANSFER_ENCODING);
    let body = match (content_length(&headers)?, codings) {
        (None, None) => Body::empty(),
        (Some(length), codings) => Body::decoded(Box::new(source.take(length)), codings)?,
        (None, codings) => Body::decoded(source, codings)?,
    };

    trace!(%method, %url, "parsed request head");
    Ok(HttpRequest::from_parts(url, method, headers, Some(body)))
}

/// Parses a response head.
///
/// With `Content-Length` exactly that many bytes are read eagerly, fewer if the peer
/// closes first, and the source is released. Otherwise the live source becomes a stream
/// body decoded per `Transfer-Encoding`.
pub fn parse_response(head: &str, mut source: BodyReader) -> Result<HttpResponse, NetworkError> {
    let (status_line, headers) = split_head(head)?;

    let mut parts = status_line.splitn(3, ' ');
    let protocol = parts.next().unwrap_or_default();
    let status = parts.next().ok_or_else(|| ProtocolError::InvalidStatusLine(status_line.to_owned()))?;
    let reason = parts.next().unwrap_or_default().trim();

    ensure!(
        protocol == HTTP_11 || protocol == HTTP_10,
        ProtocolError::UnsupportedVersion(protocol.to_owned()).into()
    );
    let status = status.parse::<u16>().map_err(|_invalid| ProtocolError::InvalidStatus(status.to_owned()))?;

    let body = match content_length(&headers)? {
        Some(length) => {
            let mut buf = Vec::with_capacity(usize::try_from(length).unwrap_or(0).min(64 * 1024));
            (&mut source)
                .take(length)
                .read_to_end(&mut buf)
                .map_err(|e| StreamError::io("read response body", e))?;
            drop(source);
            Body::from(buf)
        }
        None => Body::decoded(source, headers.get(header::TRANSFER_ENCODING))?,
    };

    trace!(status, "parsed response head");
    Ok(HttpResponse::from_parts(status, reason.to_owned(), headers, Some(body)))
}

fn split_head(head: &str) -> Result<(&str, HeaderSet), ProtocolError> {
    let head = head.trim();
    ensure!(!head.is_empty(), ProtocolError::EmptyMessage);

    let mut lines = head.lines();
    let start_line = lines.next().unwrap_or_default();
    let headers = HeaderSet::from_lines(lines.filter(|line| !line.trim().is_empty()))?;
    Ok((start_line, headers))
}

fn content_length(headers: &HeaderSet) -> Result<Option<u64>, ProtocolError> {
    headers
        .get(header::CONTENT_LENGTH)
        .map(|value| value.parse::<u64>().map_err(|_invalid| ProtocolError::InvalidContentLength(value.to_owned())))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Payload;
    use indoc::indoc;
    use std::io;

    fn source(bytes: &'static [u8]) -> BodyReader {
        Box::new(bytes)
    }

    #[test]
    fn parses_request_line_and_headers() {
        let head = indoc! {r##"
            GET /a/b HTTP/1.1
            Host: 127.0.0.1:8080
            User-Agent: curl/7.79.1
            Accept: */*
        "##};

        let request = parse_request(&head.replace('\n', "\r\n"), source(b"")).unwrap();

        assert_eq!(*request.method(), Method::GET);
        assert_eq!(request.url(), "http://127.0.0.1:8080/a/b");
        assert_eq!(request.path(), "/a/b");
        assert_eq!(request.headers().get("user-agent"), Some("curl/7.79.1"));
        assert_eq!(request.headers().len(), 3);
    }

    #[test]
    fn request_path_may_contain_spaces() {
        let request = parse_request("GET /a b/c HTTP/1.1\nHost: localhost\n\n", source(b"")).unwrap();
        assert_eq!(request.url(), "http://localhost/a b/c");
    }

    #[test]
    fn request_requires_host() {
        let error = parse_request("GET /a/b HTTP/1.1\r\nAccept: */*\r\n\r\n", source(b"")).unwrap_err();
        assert_eq!(error, ProtocolError::MissingHost);

        let error = parse_request("GET / HTTP/1.1\r\nHost: \r\n\r\n", source(b"")).unwrap_err();
        assert_eq!(error, ProtocolError::MissingHost);
    }

    #[test]
    fn request_line_is_validated() {
        let parse = |head: &str| parse_request(head, source(b"")).unwrap_err();

        assert_eq!(parse("   \r\n\r\n"), ProtocolError::EmptyMessage);
        assert_eq!(parse("GET\r\nHost: a\r\n\r\n"), ProtocolError::InvalidRequestLine("GET".into()));
        assert_eq!(parse("GET / HTTP/1.0\r\nHost: a\r\n\r\n"), ProtocolError::UnsupportedVersion("HTTP/1.0".into()));
        assert_eq!(parse("GET a HTTP/1.1\r\nHost: a\r\n\r\n"), ProtocolError::InvalidPath("a".into()));
        assert_eq!(parse("G(T / HTTP/1.1\r\nHost: a\r\n\r\n"), ProtocolError::InvalidMethod("G(T".into()));
        assert_eq!(parse("GET / HTTP/1.1\r\nbroken\r\n\r\n"), ProtocolError::InvalidHeader("broken".into()));
    }

    #[test]
    fn request_body_is_decoded() {
        let head = "POST /upload HTTP/1.1\r\nHost: a\r\nTransfer-Encoding: chunked\r\n\r\n";
        let mut request = parse_request(head, source(b"3\r\nabc\r\n0\r\n\r\n")).unwrap();
        assert_eq!(request.text().unwrap(), "abc");
        assert!(request.is_used());
    }

    #[test]
    fn request_without_length_or_coding_has_empty_body() {
        struct Untouchable;
        impl Read for Untouchable {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::TimedOut, "connection source was read"))
            }
        }

        let head = "GET / HTTP/1.1\r\nHost: localhost\r\n\r\n";
        let mut request = parse_request(head, Box::new(Untouchable)).unwrap();
        assert!(!request.body().unwrap().is_stream());
        assert_eq!(request.text().unwrap(), "");
        assert!(!request.is_used());
    }

    #[test]
    fn request_body_is_bounded_by_content_length() {
        let head = "POST / HTTP/1.1\r\nHost: a\r\nContent-Length: 3\r\n\r\n";
        let mut request = parse_request(head, source(b"abcdef")).unwrap();
        assert_eq!(request.text().unwrap(), "abc");
    }

    #[test]
    fn parses_status_line() {
        let head = "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n";
        let mut response = parse_response(head, source(b"")).unwrap();
        assert_eq!(response.status(), 404);
        assert_eq!(response.reason(), "Not Found");
        assert!(!response.ok());
        assert_eq!(response.text().unwrap(), "");

        let response = parse_response("HTTP/1.0 204\r\n\r\n", source(b"")).unwrap();
        assert_eq!(response.status(), 204);
        assert_eq!(response.reason(), "");
    }

    #[test]
    fn status_line_is_validated() {
        let parse = |head: &str| parse_response(head, source(b"")).unwrap_err();

        let protocol_error = |head: &str| match parse(head) {
            NetworkError::Protocol { source } => source,
            other => panic!("expected a protocol error, got {other}"),
        };

        assert!(matches!(protocol_error("HTTP/2 200 OK\r\n\r\n"), ProtocolError::UnsupportedVersion(_)));
        assert!(matches!(protocol_error("HTTP/1.1 abc\r\n\r\n"), ProtocolError::InvalidStatus(_)));
        assert!(matches!(protocol_error("HTTP/1.1\r\n\r\n"), ProtocolError::InvalidStatusLine(_)));
        assert!(matches!(
            parse("HTTP/1.1 200 OK\r\nContent-Length: x\r\n\r\n"),
            NetworkError::Protocol { source: ProtocolError::InvalidContentLength(_) }
        ));
    }

    #[test]
    fn content_length_body_is_read_eagerly() {
        let head = "HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\n";
        let mut response = parse_response(head, source(b"hello, and more")).unwrap();
        let body = response.body().unwrap();
        assert!(!body.is_stream());
        assert_eq!(response.text().unwrap(), "hello");
        assert_eq!(response.text().unwrap(), "hello");
    }

    #[test]
    fn short_content_length_body_is_kept() {
        let mut response = parse_response("HTTP/1.1 200 OK\r\nContent-Length: 10\r\n\r\n", source(b"abc")).unwrap();
        assert_eq!(response.text().unwrap(), "abc");
    }

    #[test]
    fn streamed_body_without_length() {
        let head = "HTTP/1.1 200 OK\r\ntransfer-encoding: chunked\r\n\r\n";
        let mut response = parse_response(head, source(b"4\r\nWiki\r\n0\r\n\r\n")).unwrap();
        assert!(response.body().unwrap().is_stream());
        assert_eq!(response.text().unwrap(), "Wiki");
        assert!(response.text().unwrap_err().is_body_used());
    }

    #[test]
    fn broken_source_surfaces_as_stream_error() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
            }
        }

        let error = parse_response("HTTP/1.1 200 OK\r\nContent-Length: 3\r\n\r\n", Box::new(Broken)).unwrap_err();
        assert!(matches!(error, NetworkError::Stream { source: StreamError::Io { .. } }));
    }
}
