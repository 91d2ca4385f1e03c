//! Serializes request and response heads.
//!
//! Headers are rendered through [`HeaderSet::write_to`], which sorts the set in place.

use crate::protocol::HeaderSet;
use bytes::{BufMut, BytesMut};
use http::Method;
use std::io::{self, Write};

/// Initial buffer size allocated for a head
pub const INIT_HEAD_SIZE: usize = 4 * 1024;

/// `METHOD <target> HTTP/1.1\r\n`, the headers and the blank line.
pub fn write_request_head(
    dst: &mut BytesMut,
    method: &Method,
    target: &str,
    headers: &mut HeaderSet,
) -> io::Result<()> {
    dst.reserve(INIT_HEAD_SIZE);
    write!(FastWrite(dst), "{method} {target} HTTP/1.1\r\n")?;
    headers.write_to(dst);
    dst.put_slice(b"\r\n");
    Ok(())
}

/// `HTTP/1.1 <status>[ <reason>]\r\n`, the headers and the blank line.
pub fn write_response_head(dst: &mut BytesMut, status: u16, reason: &str, headers: &mut HeaderSet) -> io::Result<()> {
    dst.reserve(INIT_HEAD_SIZE);
    if reason.is_empty() {
        write!(FastWrite(dst), "HTTP/1.1 {status}\r\n")?;
    } else {
        write!(FastWrite(dst), "HTTP/1.1 {status} {reason}\r\n")?;
    }
    headers.write_to(dst);
    dst.put_slice(b"\r\n");
    Ok(())
}

struct FastWrite<'a>(&'a mut BytesMut);

impl Write for FastWrite<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.put_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
