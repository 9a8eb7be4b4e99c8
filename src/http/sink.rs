//! Response sinks — the writable surface handlers produce output through.
//!
//! Handlers never build a [`Response`] directly. They receive a
//! `&mut dyn ResponseSink` and write status, headers, and body through it.
//! The server hands them a [`ResponseWriter`] (the real sink); the cache
//! middleware interposes a [`CaptureSink`](crate::cache::CaptureSink) when
//! it needs a copy of the output.

use std::io;

use bytes::BytesMut;

use super::{Headers, Response, StatusCode};

/// The capability handlers write responses through.
///
/// The contract mirrors an HTTP server's response writer:
///
/// - [`write`](Self::write) appends body bytes and reports how many were
///   accepted, or relays a transport failure.
/// - [`set_status`](Self::set_status) may be called repeatedly; the last
///   call wins.
/// - Before any `set_status` call the status reads as `200 OK`, so a
///   handler that never sets one has produced a success.
pub trait ResponseSink: Send {
    /// Appends `buf` to the response body. Returns the number of bytes accepted.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Records `status` as the response status. Last call wins.
    fn set_status(&mut self, status: StatusCode);

    /// Mutable access to the response headers.
    fn headers_mut(&mut self) -> &mut Headers;
}

/// The real sink: accumulates one request's response in owned buffers.
///
/// Created fresh per request by the server loop and converted into a
/// [`Response`] once the handler returns.
///
/// # Examples
///
/// ```
/// use recache::http::StatusCode;
/// use recache::http::sink::{ResponseSink, ResponseWriter};
///
/// let mut writer = ResponseWriter::new();
/// writer.headers_mut().insert("Content-Type", "application/json");
/// writer.write(b"{}").unwrap();
///
/// let response = writer.into_response();
/// assert_eq!(response.status(), StatusCode::Ok);
/// ```
#[derive(Debug)]
pub struct ResponseWriter {
    status: StatusCode,
    headers: Headers,
    body: BytesMut,
}

impl ResponseWriter {
    /// Creates a writer with status pre-set to `200 OK` and an empty body.
    pub fn new() -> Self {
        Self {
            status: StatusCode::Ok,
            headers: Headers::new(),
            body: BytesMut::new(),
        }
    }

    /// Returns the current status.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the accumulated body bytes.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Finishes the request, converting the accumulated state into a [`Response`].
    pub fn into_response(self) -> Response {
        Response::from_parts(self.status, self.headers, self.body.to_vec())
    }
}

impl Default for ResponseWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseSink for ResponseWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }
}
