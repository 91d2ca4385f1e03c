//! Reads a message head off a buffered source.
//!
//! Only the bytes up to and including the first `\r\n\r\n` are consumed, whatever the
//! reader buffered beyond that stays in it and becomes the body source.

use crate::protocol::{NetworkError, ProtocolError, StreamError};
use bytes::BytesMut;
use std::io::{self, BufRead};
use tracing::trace;

/// Default upper bound for a message head, in bytes.
pub const DEFAULT_MAX_HEADER_SIZE: usize = 64 * 1024;

/// Reads the head, terminator included, failing once more than `max_size` bytes were
/// seen without a terminator.
pub fn read_head<R: BufRead + ?Sized>(reader: &mut R, max_size: usize) -> Result<BytesMut, NetworkError> {
    let mut head = BytesMut::with_capacity(1024.min(max_size));
    let mut matched = 0usize;

    loop {
        let available = match reader.fill_buf() {
            Ok(available) => available,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(StreamError::io("read message head", e).into()),
        };

        if available.is_empty() {
            return Err(StreamError::UnexpectedEof.into());
        }

        let mut consumed = available.len();
        for (index, &byte) in available.iter().enumerate() {
            matched = match (matched, byte) {
                (0 | 2, b'\r') => matched + 1,
                (1 | 3, b'\n') => matched + 1,
                (_, b'\r') => 1,
                _ => 0,
            };
            if matched == 4 {
                consumed = index + 1;
                break;
            }
        }

        let current_size = head.len() + consumed;
        if current_size > max_size {
            return Err(ProtocolError::header_too_large(current_size, max_size).into());
        }

        head.extend_from_slice(&available[..consumed]);
        reader.consume(consumed);

        if matched == 4 {
            trace!(size = head.len(), "read message head");
            return Ok(head);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use std::io::{BufReader, Read};

    #[test]
    fn stops_at_terminator() {
        let wire = indoc! {r##"
            GET / HTTP/1.1
            Host: localhost

            body bytes"##}
        .replace('\n', "\r\n");
        let mut reader = BufReader::new(wire.as_bytes());

        let head = read_head(&mut reader, DEFAULT_MAX_HEADER_SIZE).unwrap();
        assert_eq!(&head[..], b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n");

        let mut rest = String::new();
        reader.read_to_string(&mut rest).unwrap();
        assert_eq!(rest, "body bytes");
    }

    #[test]
    fn terminator_split_across_reads() {
        let wire = b"HTTP/1.1 200 OK\r\nA: b\r\n\r\nxyz";
        let mut reader = BufReader::with_capacity(3, &wire[..]);

        let head = read_head(&mut reader, DEFAULT_MAX_HEADER_SIZE).unwrap();
        assert!(head.ends_with(b"\r\n\r\n"));
        assert_eq!(head.len(), wire.len() - 3);
    }

    #[test]
    fn oversized_head_fails() {
        let wire = format!("GET / HTTP/1.1\r\nX-Big: {}\r\n\r\n", "a".repeat(200));
        let mut reader = BufReader::new(wire.as_bytes());

        let error = read_head(&mut reader, 64).unwrap_err();
        assert!(matches!(
            error,
            NetworkError::Protocol { source: ProtocolError::HeaderTooLarge { max_size: 64, .. } }
        ));
    }

    #[test]
    fn early_close_fails() {
        let mut reader = BufReader::new(&b"GET / HTTP/1.1\r\nHost"[..]);
        let error = read_head(&mut reader, DEFAULT_MAX_HEADER_SIZE).unwrap_err();
        assert!(matches!(error, NetworkError::Stream { source: StreamError::UnexpectedEof }));
    }
}
