//! Request handlers.
//!
//! A [`Handler`] turns one request into one response. Returning `Ok(None)` or an error makes
//! the server answer with a fixed `500` response instead.

use crate::protocol::{HttpRequest, HttpResponse};
use http::StatusCode;
use std::error::Error;

pub type BoxError = Box<dyn Error + Send + Sync>;

#[cfg_attr(test, mockall::automock)]
pub trait Handler: Send + Sync {
    fn handle(&self, request: HttpRequest) -> Result<Option<HttpResponse>, BoxError>;
}

/// Adapts a closure into a [`Handler`], see [`make_handler`].
#[derive(Debug)]
pub struct HandlerFn<F> {
    f: F,
}

impl<F, Err> Handler for HandlerFn<F>
where
    F: Fn(HttpRequest) -> Result<Option<HttpResponse>, Err> + Send + Sync,
    Err: Into<BoxError>,
{
    fn handle(&self, request: HttpRequest) -> Result<Option<HttpResponse>, BoxError> {
        (self.f)(request).map_err(Into::into)
    }
}

pub fn make_handler<F, Err>(f: F) -> HandlerFn<F>
where
    F: Fn(HttpRequest) -> Result<Option<HttpResponse>, Err> + Send + Sync,
    Err: Into<BoxError>,
{
    HandlerFn { f }
}

/// Answers every request with `404 Not Found`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotFoundHandler;

impl Handler for NotFoundHandler {
    fn handle(&self, _request: HttpRequest) -> Result<Option<HttpResponse>, BoxError> {
        Ok(Some(HttpResponse::plain_text(StatusCode::NOT_FOUND, "404 Not Found")))
    }
}
