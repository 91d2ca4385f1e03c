//! Utility macros shared by the engine.

/// Early return with an error if a condition is not met.
///
/// Works like `assert!` but returns `Err($error)` instead of panicking, which keeps
/// the wire parsing code free of nested `if` blocks.
///
/// ```ignore
/// ensure!(path.starts_with('/'), ProtocolError::InvalidPath(path.to_owned()));
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;

/// Lower-cases and trims a header key the way every lookup expects it.
pub(crate) fn normalize_key(key: &str) -> String {
    key.trim().to_ascii_lowercase()
}

/// Current time as an RFC 7231 `Date` header value.
pub(crate) fn http_date() -> String {
    let mut buf = faf_http_date::get_date_buff_no_key();
    faf_http_date::get_date_no_key(&mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}
