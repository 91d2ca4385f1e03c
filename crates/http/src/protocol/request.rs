use crate::protocol::{Body, HeaderSet, Payload};
use http::Method;

/// An HTTP request: target URL, method, headers and an optional body.
///
/// On the server side the URL is rebuilt as `http://<host><path>` from the request line
/// and the `Host` header.
#[derive(Debug)]
pub struct HttpRequest {
    url: String,
    method: Method,
    headers: HeaderSet,
    body: Option<Body>,
}

impl HttpRequest {
    pub fn new<U: Into<String>>(url: U) -> Self {
        Self { url: url.into(), method: Method::GET, headers: HeaderSet::new(), body: None }
    }

    pub(crate) fn from_parts(url: String, method: Method, headers: HeaderSet, body: Option<Body>) -> Self {
        Self { url, method, headers, body }
    }

    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
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

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn set_url<U: Into<String>>(&mut self, url: U) {
        self.url = url.into();
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn set_method(&mut self, method: Method) {
        self.method = method;
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

    /// Path, query and fragment part of the URL, `/` when there is none.
    pub fn path(&self) -> &str {
        let rest = self.url.split_once("://").map_or(self.url.as_str(), |(_, rest)| rest);
        rest.find('/').map_or("/", |index| &rest[index..])
    }
}

impl Payload for HttpRequest {
    fn terminal_body(&mut self) -> Option<&mut Body> {
        self.body.as_mut().and_then(Payload::terminal_body)
    }

    fn is_used(&self) -> bool {
        self.body.as_ref().is_some_and(Payload::is_used)
    }
}
