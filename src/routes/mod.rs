//! The service's HTTP handlers.
//!
//! Four routes: `/texto` and `/hora` (JSON, cached upstream by the
//! middleware), `/health` (JSON, uncached), and `/metricas` (Prometheus
//! text exposition, uncached).

use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Local;
use serde::Serialize;

use crate::http::sink::ResponseSink;
use crate::http::Request;
use crate::metrics::Metrics;
use crate::router::Handler;

/// The fixed welcome message served by `/texto`.
pub const WELCOME_MESSAGE: &str = "Bem vindo ao desafio técnico DevOps Globo!";

/// Standard JSON envelope for route payloads.
///
/// Absent fields are omitted from the serialized output, so a plain
/// message renders as `{"message":"..."}`.
#[derive(Debug, Default, Serialize)]
pub struct Envelope {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Envelope {
    /// An envelope carrying only a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::default()
        }
    }
}

fn write_json<T: Serialize>(sink: &mut dyn ResponseSink, value: &T) -> io::Result<()> {
    let body = serde_json::to_vec(value).map_err(io::Error::other)?;
    sink.headers_mut().set("Content-Type", "application/json");
    sink.write(&body)?;
    Ok(())
}

/// `GET /texto` — the fixed welcome message.
pub struct TextoHandler;

#[async_trait]
impl Handler for TextoHandler {
    async fn handle(&self, _request: &Request, sink: &mut dyn ResponseSink) -> io::Result<()> {
        write_json(sink, &Envelope::message(WELCOME_MESSAGE))
    }
}

/// `GET /hora` — the current server time, `DD/MM/YYYY HH:MM:SS`.
///
/// The timestamp is computed per invocation; freshness within the cache
/// TTL is the middleware's business, not this handler's.
pub struct HoraHandler;

#[async_trait]
impl Handler for HoraHandler {
    async fn handle(&self, _request: &Request, sink: &mut dyn ResponseSink) -> io::Result<()> {
        let now = Local::now().format("%d/%m/%Y %H:%M:%S");
        write_json(sink, &Envelope::message(format!("Hora do servidor: {now}")))
    }
}

/// `GET /health` — liveness probe, always `{"status":"healthy"}`.
pub struct HealthHandler;

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
}

#[async_trait]
impl Handler for HealthHandler {
    async fn handle(&self, _request: &Request, sink: &mut dyn ResponseSink) -> io::Result<()> {
        write_json(sink, &HealthBody { status: "healthy" })
    }
}

/// `GET /metricas` — Prometheus text exposition of the injected registry.
pub struct MetricsHandler {
    metrics: Arc<Metrics>,
}

impl MetricsHandler {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self { metrics }
    }
}

#[async_trait]
impl Handler for MetricsHandler {
    async fn handle(&self, _request: &Request, sink: &mut dyn ResponseSink) -> io::Result<()> {
        let text = self.metrics.render().map_err(io::Error::other)?;
        sink.headers_mut().set("Content-Type", Metrics::content_type());
        sink.write(text.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::sink::ResponseWriter;
    use crate::http::StatusCode;

    fn get(target: &str) -> Request {
        let raw = format!("GET {target} HTTP/1.1\r\nHost: localhost\r\n\r\n");
        let (req, _) = Request::parse(raw.as_bytes()).unwrap();
        req
    }

    #[test]
    fn envelope_omits_absent_fields() {
        let json = serde_json::to_string(&Envelope::message("oi")).unwrap();
        assert_eq!(json, r#"{"message":"oi"}"#);
    }

    #[tokio::test]
    async fn texto_returns_the_exact_welcome_body() {
        let mut sink = ResponseWriter::new();
        TextoHandler.handle(&get("/texto"), &mut sink).await.unwrap();

        assert_eq!(sink.status(), StatusCode::Ok);
        assert_eq!(
            sink.body(),
            r#"{"message":"Bem vindo ao desafio técnico DevOps Globo!"}"#.as_bytes()
        );
    }

    #[tokio::test]
    async fn hora_formats_a_parseable_timestamp() {
        let mut sink = ResponseWriter::new();
        HoraHandler.handle(&get("/hora"), &mut sink).await.unwrap();

        let body: serde_json::Value = serde_json::from_slice(sink.body()).unwrap();
        let message = body["message"].as_str().unwrap();
        let stamp = message.strip_prefix("Hora do servidor: ").unwrap();
        chrono::NaiveDateTime::parse_from_str(stamp, "%d/%m/%Y %H:%M:%S").unwrap();
    }

    #[tokio::test]
    async fn health_reports_healthy() {
        let mut sink = ResponseWriter::new();
        HealthHandler
            .handle(&get("/health"), &mut sink)
            .await
            .unwrap();
        assert_eq!(sink.body(), br#"{"status":"healthy"}"#);
    }

    #[tokio::test]
    async fn metricas_renders_the_exposition() {
        let metrics = Arc::new(Metrics::new().unwrap());
        metrics.cache_hit();

        let handler = MetricsHandler::new(Arc::clone(&metrics));
        let mut sink = ResponseWriter::new();
        handler.handle(&get("/metricas"), &mut sink).await.unwrap();

        let text = String::from_utf8(sink.body().to_vec()).unwrap();
        assert!(text.contains("app_cache_hits_total 1"));

        let response = sink.into_response();
        let wire = String::from_utf8(response.into_bytes().to_vec()).unwrap();
        assert!(wire.contains("Content-Type: text/plain; version=0.0.4\r\n"));
    }
}
