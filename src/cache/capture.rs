//! Response capture — records handler output while still delivering it.

use std::io;

use bytes::{Bytes, BytesMut};

use crate::http::sink::ResponseSink;
use crate::http::{Headers, StatusCode};

/// A [`ResponseSink`] decorator that records everything written through it.
///
/// Owned exclusively by one cache-middleware invocation. Every `write` is
/// appended to an internal buffer and then forwarded unmodified to the real
/// sink, so the captured body is byte-for-byte what the client received.
/// The status starts at `200 OK` and tracks the last `set_status` call; a
/// handler that never sets one therefore reads as a success and its output
/// is eligible for storage.
pub struct CaptureSink<'a> {
    inner: &'a mut dyn ResponseSink,
    body: BytesMut,
    status: StatusCode,
}

impl<'a> CaptureSink<'a> {
    /// Wraps the real sink with status pre-set to `200 OK` and an empty buffer.
    pub fn new(inner: &'a mut dyn ResponseSink) -> Self {
        Self {
            inner,
            body: BytesMut::new(),
            status: StatusCode::Ok,
        }
    }

    /// The last status set through this sink.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Consumes the sink, yielding the captured body.
    pub fn into_body(self) -> Bytes {
        self.body.freeze()
    }
}

impl ResponseSink for CaptureSink<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.body.extend_from_slice(buf);
        self.inner.write(buf)
    }

    fn set_status(&mut self, status: StatusCode) {
        self.status = status;
        self.inner.set_status(status);
    }

    fn headers_mut(&mut self) -> &mut Headers {
        self.inner.headers_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::sink::ResponseWriter;

    #[test]
    fn captures_writes_in_order() {
        let mut writer = ResponseWriter::new();
        let mut capture = CaptureSink::new(&mut writer);
        capture.write(b"one ").unwrap();
        capture.write(b"two ").unwrap();
        capture.write(b"three").unwrap();

        assert_eq!(&capture.into_body()[..], b"one two three");
        // the real sink saw the identical bytes
        assert_eq!(writer.body(), b"one two three");
    }

    #[test]
    fn status_defaults_to_ok() {
        let mut writer = ResponseWriter::new();
        let capture = CaptureSink::new(&mut writer);
        assert_eq!(capture.status(), StatusCode::Ok);
    }

    #[test]
    fn last_status_wins_and_forwards() {
        let mut writer = ResponseWriter::new();
        let mut capture = CaptureSink::new(&mut writer);
        capture.set_status(StatusCode::InternalServerError);
        capture.set_status(StatusCode::NotFound);

        assert_eq!(capture.status(), StatusCode::NotFound);
        assert_eq!(writer.status(), StatusCode::NotFound);
    }

    #[test]
    fn headers_go_to_the_real_sink() {
        let mut writer = ResponseWriter::new();
        let mut capture = CaptureSink::new(&mut writer);
        capture.headers_mut().insert("Content-Type", "application/json");

        let response = writer.into_response();
        let wire = String::from_utf8(response.into_bytes().to_vec()).unwrap();
        assert!(wire.contains("Content-Type: application/json\r\n"));
    }

    #[test]
    fn write_reports_inner_count() {
        let mut writer = ResponseWriter::new();
        let mut capture = CaptureSink::new(&mut writer);
        assert_eq!(capture.write(b"abcde").unwrap(), 5);
    }
}
