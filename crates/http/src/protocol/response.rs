use crate::protocol::{Body, HeaderSet, Payload};
use http::{StatusCode, header};

/// An HTTP response: status code, reason phrase, headers and an optional body.
#[derive(Debug)]
pub struct HttpResponse {
    status: u16,
    reason: String,
    headers: HeaderSet,
    body: Option<Body>,
}

impl HttpResponse {
    pub fn new(status: u16) -> Self {
        Self { status, reason: String::new(), headers: HeaderSet::new(), body: None }
    }

    pub(crate) fn from_parts(status: u16, reason: String, headers: HeaderSet, body: Option<Body>) -> Self {
        Self { status, reason, headers, body }
    }

    /// A `text/plain` response whose reason phrase is left empty.
    pub fn plain_text<B: Into<Body>>(status: StatusCode, body: B) -> Self {
        Self::new(status.as_u16())
            .with_header(header::CONTENT_TYPE, mime::TEXT_PLAIN.as_ref())
            .with_body(body)
    }

    #[must_use]
    pub fn with_reason<R: Into<String>>(mut self, reason: R) -> Self {
        self.reason = reason.into();
        self
    }

    #[must_use]
    pub fn with_header<K: AsRef<str>, V: AsRef<str>>(mut self, key: K, value: V) -> Self {
        self.headers.add(key, value);
        self
    }

    #[must_use]
    pub fn with_headers(mut self, headers: HeaderSet) -> Self {
        self.headers = headers;
        self
    }

    #[must_use]
    pub fn with_body<B: Into<Body>>(mut self, body: B) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn set_reason<R: Into<String>>(&mut self, reason: R) {
        self.reason = reason.into();
    }

    /// True for 2xx statuses.
    pub fn ok(&self) -> bool {
        (200..=299).contains(&self.status)
    }

    pub fn headers(&self) -> &HeaderSet {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderSet {
        &mut self.headers
    }

    pub fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    pub fn set_body<B: Into<Body>>(&mut self, body: B) {
        self.body = Some(body.into());
    }

    pub fn take_body(&mut self) -> Option<Body> {
        self.body.take()
    }
}

impl Payload for HttpResponse {
    fn terminal_body(&mut self) -> Option<&mut Body> {
        self.body.as_mut().and_then(Payload::terminal_body)
    }

    fn is_used(&self) -> bool {
        self.body.as_ref().is_some_and(Payload::is_used)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_covers_2xx_only() {
        assert!(HttpResponse::new(200).ok());
        assert!(HttpResponse::new(299).ok());
        assert!(!HttpResponse::new(199).ok());
        assert!(!HttpResponse::new(300).ok());
    }

    #[test]
    fn text_response_sets_content_type() {
        let mut response = HttpResponse::plain_text(StatusCode::NOT_FOUND, "404 Not Found");
        assert_eq!(response.status(), 404);
        assert_eq!(response.reason(), "");
        assert_eq!(response.headers().get("content-type"), Some("text/plain"));
        assert_eq!(response.text().unwrap(), "404 Not Found");
    }
}
