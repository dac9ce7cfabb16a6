//! Terminal responses.
//!
//! A [`Response`] ends traversal: once a handler produces one, the dispatcher
//! returns it to the HTTP boundary without looking at the remaining path.
use bytes::Bytes;
use http::{HeaderMap, HeaderValue, StatusCode, header};

/// A fully rendered response, independent of the HTTP server in use.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl Response {
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// An empty `200 OK`.
    pub fn ok() -> Self {
        Self::new(StatusCode::OK, Bytes::new())
    }

    /// A `200 OK` served as `text/plain; charset=utf-8`.
    pub fn text(body: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, body.into())
            .with_header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
    }

    /// A `200 OK` served as `text/html; charset=utf-8`.
    pub fn html(body: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, body.into())
            .with_header(header::CONTENT_TYPE, "text/html; charset=utf-8")
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Sets a header. Values that are not valid header text are dropped with a
    /// warning rather than failing the request.
    pub fn with_header(mut self, name: header::HeaderName, value: &str) -> Self {
        match HeaderValue::from_str(value) {
            Ok(value) => {
                self.headers.insert(name, value);
            }
            Err(e) => {
                tracing::warn!("Dropping invalid value for header {}: {}", name, e);
            }
        }
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn into_parts(self) -> (StatusCode, HeaderMap, Bytes) {
        (self.status, self.headers, self.body)
    }
}
