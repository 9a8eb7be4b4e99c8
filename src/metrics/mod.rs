//! Prometheus instruments and text exposition.
//!
//! The metric names and labels are in Portuguese, matching the dashboards
//! that scrape this service: `app_requisicoes_total`,
//! `app_latencia_requisicoes_segundos`, `app_cache_hits_total`, and
//! `app_cache_misses_total`.

use prometheus::{
    Counter, CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};

use crate::http::StatusCode;

/// The service's metric instruments, registered against a private registry.
///
/// Constructed once at startup and shared behind an `Arc`; the prometheus
/// collectors are internally atomic, so no further locking is needed. The
/// registry is private rather than the process-wide default so tests can
/// build isolated instances with independent counts.
pub struct Metrics {
    registry: Registry,

    /// Per-request counter — labels: `metodo`, `endpoint`, `status`.
    pub requests_total: CounterVec,

    /// Request latency histogram in seconds — label: `endpoint`.
    pub request_latency_seconds: HistogramVec,

    /// Responses served from the cache.
    pub cache_hits: Counter,

    /// Requests that fell through to the inner handler.
    pub cache_misses: Counter,
}

impl Metrics {
    /// Creates and registers all instruments.
    ///
    /// # Errors
    ///
    /// Returns [`prometheus::Error`] if an instrument cannot be built or
    /// registered — only possible with malformed names, so in practice
    /// this fails never or always.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests_total = CounterVec::new(
            Opts::new("app_requisicoes_total", "Total de requisições"),
            &["metodo", "endpoint", "status"],
        )?;
        registry.register(Box::new(requests_total.clone()))?;

        let request_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "app_latencia_requisicoes_segundos",
                "Latência das requisições em segundos",
            ),
            &["endpoint"],
        )?;
        registry.register(Box::new(request_latency_seconds.clone()))?;

        let cache_hits = Counter::new("app_cache_hits_total", "Total de cache hits")?;
        registry.register(Box::new(cache_hits.clone()))?;

        let cache_misses = Counter::new("app_cache_misses_total", "Total de cache misses")?;
        registry.register(Box::new(cache_misses.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            request_latency_seconds,
            cache_hits,
            cache_misses,
        })
    }

    /// Records one completed request: latency observation plus the labeled
    /// request counter. The status label reflects the response that was
    /// actually produced.
    pub fn record_request(
        &self,
        method: &str,
        endpoint: &str,
        status: StatusCode,
        elapsed_secs: f64,
    ) {
        self.request_latency_seconds
            .with_label_values(&[endpoint])
            .observe(elapsed_secs);
        self.requests_total
            .with_label_values(&[method, endpoint, &status.as_u16().to_string()])
            .inc();
    }

    /// Increments the cache-hit counter.
    pub fn cache_hit(&self) {
        self.cache_hits.inc();
    }

    /// Increments the cache-miss counter.
    pub fn cache_miss(&self) {
        self.cache_misses.inc();
    }

    /// Renders all registered metrics in the Prometheus text format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buf = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buf)?;
        Ok(String::from_utf8(buf).unwrap_or_default())
    }

    /// The content type of [`render`](Self::render)'s output.
    pub fn content_type() -> &'static str {
        "text/plain; version=0.0.4"
    }
}
