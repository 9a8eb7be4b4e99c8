//! The read-through cache middleware.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::cache::{CacheStore, CaptureSink};
use crate::http::sink::ResponseSink;
use crate::http::{Request, StatusCode};
use crate::metrics::Metrics;
use crate::router::Handler;

/// Namespace prefix for every key this middleware writes.
const KEY_PREFIX: &str = "rust-cache:";

/// Wraps a handler with read-through caching of its response bodies.
///
/// On each request the middleware derives a key from the request path,
/// looks it up in the store, and either replays the stored body as
/// `application/json` or invokes the inner handler through a
/// [`CaptureSink`] and stores what it wrote — but only when the final
/// status is `200 OK`. Hit, miss, latency, and per-request counters are
/// recorded against the injected [`Metrics`].
///
/// The key is derived from the path alone. Method, headers, and the query
/// string are excluded, so `/texto?x=1` and `/texto?x=2` share one slot.
/// That is acceptable while every cached route is a parameter-less GET;
/// widening the key is a prerequisite for caching anything else.
///
/// A store lookup failure is treated as a miss for control flow but logged
/// at `warn`, and a store write failure never reaches the client — by the
/// time the store is written, the body has already been forwarded.
pub struct CacheMiddleware {
    inner: Arc<dyn Handler>,
    store: Arc<dyn CacheStore>,
    metrics: Arc<Metrics>,
    ttl: Duration,
}

impl CacheMiddleware {
    /// Builds the middleware around `inner`. All collaborators are injected;
    /// there are no process-wide globals.
    pub fn new(
        inner: Arc<dyn Handler>,
        store: Arc<dyn CacheStore>,
        metrics: Arc<Metrics>,
        ttl: Duration,
    ) -> Self {
        Self {
            inner,
            store,
            metrics,
            ttl,
        }
    }

    fn cache_key(path: &str) -> String {
        format!("{KEY_PREFIX}{path}")
    }
}

#[async_trait]
impl Handler for CacheMiddleware {
    async fn handle(&self, request: &Request, sink: &mut dyn ResponseSink) -> io::Result<()> {
        let start = Instant::now();
        let key = Self::cache_key(request.path());

        match self.store.get(&key).await {
            Ok(Some(body)) => {
                sink.headers_mut().set("Content-Type", "application/json");
                sink.write(&body)?;

                self.metrics.cache_hit();
                self.metrics.record_request(
                    request.method().as_str(),
                    request.path(),
                    StatusCode::Ok,
                    start.elapsed().as_secs_f64(),
                );

                debug!(path = %request.path(), "cache hit");
                return Ok(());
            }
            Ok(None) => {}
            // Backend failure reads as a miss, but stays visible in the logs.
            Err(e) => warn!(path = %request.path(), error = %e, "cache lookup failed"),
        }

        self.metrics.cache_miss();

        let mut capture = CaptureSink::new(sink);
        self.inner.handle(request, &mut capture).await?;

        let status = capture.status();
        let body = capture.into_body();

        if status == StatusCode::Ok {
            match self.store.set(&key, &body, self.ttl).await {
                Ok(()) => {
                    debug!(path = %request.path(), ttl = ?self.ttl, "cache miss — stored")
                }
                // The response is already on its way; only the next request pays.
                Err(e) => warn!(path = %request.path(), error = %e, "cache store failed"),
            }
        }

        self.metrics.record_request(
            request.method().as_str(),
            request.path(),
            status,
            start.elapsed().as_secs_f64(),
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::cache::MemoryStore;
    use crate::http::sink::ResponseWriter;

    /// Test double that counts invocations and writes a fixed payload.
    struct CountingHandler {
        calls: AtomicUsize,
        body: &'static [u8],
        status: Option<StatusCode>,
    }

    impl CountingHandler {
        fn ok(body: &'static [u8]) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                body,
                status: None,
            }
        }

        fn with_status(body: &'static [u8], status: StatusCode) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                body,
                status: Some(status),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Handler for CountingHandler {
        async fn handle(&self, _request: &Request, sink: &mut dyn ResponseSink) -> io::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(status) = self.status {
                sink.set_status(status);
            }
            sink.write(self.body)?;
            Ok(())
        }
    }

    fn request(target: &str) -> Request {
        let raw = format!("GET {target} HTTP/1.1\r\nHost: localhost\r\n\r\n");
        let (req, _) = Request::parse(raw.as_bytes()).unwrap();
        req
    }

    fn middleware(
        handler: Arc<CountingHandler>,
        store: Arc<MemoryStore>,
        metrics: Arc<Metrics>,
        ttl: Duration,
    ) -> CacheMiddleware {
        CacheMiddleware::new(handler, store, metrics, ttl)
    }

    #[tokio::test]
    async fn second_request_is_a_hit_and_skips_the_handler() {
        let handler = Arc::new(CountingHandler::ok(b"{\"message\":\"oi\"}"));
        let store = Arc::new(MemoryStore::new());
        let metrics = Arc::new(Metrics::new().unwrap());
        let mw = middleware(
            Arc::clone(&handler),
            store,
            Arc::clone(&metrics),
            Duration::from_secs(10),
        );

        let mut first = ResponseWriter::new();
        mw.handle(&request("/texto"), &mut first).await.unwrap();

        let mut second = ResponseWriter::new();
        mw.handle(&request("/texto"), &mut second).await.unwrap();

        assert_eq!(first.body(), second.body());
        assert_eq!(handler.calls(), 1);
        assert_eq!(metrics.cache_misses.get() as u64, 1);
        assert_eq!(metrics.cache_hits.get() as u64, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn entry_expires_after_ttl() {
        let handler = Arc::new(CountingHandler::ok(b"body"));
        let store = Arc::new(MemoryStore::new());
        let metrics = Arc::new(Metrics::new().unwrap());
        let mw = middleware(
            Arc::clone(&handler),
            store,
            Arc::clone(&metrics),
            Duration::from_secs(10),
        );

        let mut first = ResponseWriter::new();
        mw.handle(&request("/texto"), &mut first).await.unwrap();

        tokio::time::advance(Duration::from_secs(11)).await;

        let mut second = ResponseWriter::new();
        mw.handle(&request("/texto"), &mut second).await.unwrap();

        assert_eq!(handler.calls(), 2);
        assert_eq!(metrics.cache_misses.get() as u64, 2);
        assert_eq!(metrics.cache_hits.get() as u64, 0);
    }

    #[tokio::test]
    async fn default_status_is_stored() {
        // The handler never calls set_status; the response still caches.
        let handler = Arc::new(CountingHandler::ok(b"implicit 200"));
        let store = Arc::new(MemoryStore::new());
        let metrics = Arc::new(Metrics::new().unwrap());
        let mw = middleware(
            Arc::clone(&handler),
            Arc::clone(&store),
            metrics,
            Duration::from_secs(10),
        );

        let mut sink = ResponseWriter::new();
        mw.handle(&request("/texto"), &mut sink).await.unwrap();

        let stored = store.get("rust-cache:/texto").await.unwrap();
        assert_eq!(stored.as_deref(), Some(&b"implicit 200"[..]));
    }

    #[tokio::test]
    async fn non_success_status_is_never_stored() {
        let handler = Arc::new(CountingHandler::with_status(
            b"boom",
            StatusCode::InternalServerError,
        ));
        let store = Arc::new(MemoryStore::new());
        let metrics = Arc::new(Metrics::new().unwrap());
        let mw = middleware(
            Arc::clone(&handler),
            Arc::clone(&store),
            metrics,
            Duration::from_secs(10),
        );

        let mut first = ResponseWriter::new();
        mw.handle(&request("/erro"), &mut first).await.unwrap();
        let mut second = ResponseWriter::new();
        mw.handle(&request("/erro"), &mut second).await.unwrap();

        assert!(store.get("rust-cache:/erro").await.unwrap().is_none());
        assert_eq!(handler.calls(), 2);
        // the client still got the body both times
        assert_eq!(first.body(), b"boom");
        assert_eq!(first.status(), StatusCode::InternalServerError);
    }

    #[tokio::test]
    async fn non_success_miss_is_labeled_with_its_true_status() {
        let handler = Arc::new(CountingHandler::with_status(
            b"nope",
            StatusCode::InternalServerError,
        ));
        let store = Arc::new(MemoryStore::new());
        let metrics = Arc::new(Metrics::new().unwrap());
        let mw = middleware(handler, store, Arc::clone(&metrics), Duration::from_secs(10));

        let mut sink = ResponseWriter::new();
        mw.handle(&request("/erro"), &mut sink).await.unwrap();

        let labeled = metrics
            .requests_total
            .with_label_values(&["GET", "/erro", "500"])
            .get();
        assert_eq!(labeled as u64, 1);
    }

    #[tokio::test]
    async fn query_strings_share_one_cache_slot() {
        let handler = Arc::new(CountingHandler::ok(b"same for everyone"));
        let store = Arc::new(MemoryStore::new());
        let metrics = Arc::new(Metrics::new().unwrap());
        let mw = middleware(
            Arc::clone(&handler),
            store,
            metrics,
            Duration::from_secs(10),
        );

        let mut first = ResponseWriter::new();
        mw.handle(&request("/texto?x=1"), &mut first).await.unwrap();
        let mut second = ResponseWriter::new();
        mw.handle(&request("/texto?x=2"), &mut second)
            .await
            .unwrap();

        assert_eq!(first.body(), second.body());
        assert_eq!(handler.calls(), 1);
    }

    #[tokio::test]
    async fn hit_replays_with_json_content_type() {
        let handler = Arc::new(CountingHandler::ok(b"{}"));
        let store = Arc::new(MemoryStore::new());
        let metrics = Arc::new(Metrics::new().unwrap());
        let mw = middleware(handler, store, metrics, Duration::from_secs(10));

        let mut first = ResponseWriter::new();
        mw.handle(&request("/texto"), &mut first).await.unwrap();

        let mut second = ResponseWriter::new();
        mw.handle(&request("/texto"), &mut second).await.unwrap();
        let wire = String::from_utf8(second.into_response().into_bytes().to_vec()).unwrap();
        assert!(wire.contains("Content-Type: application/json\r\n"));
    }
}
