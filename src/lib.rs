//! # recache
//!
//! A small async HTTP/1.1 service that serves a handful of JSON endpoints
//! behind a read-through response cache, with Prometheus metrics exposed
//! for scraping.
//!
//! The interesting piece is [`cache::CacheMiddleware`]: it wraps any
//! [`router::Handler`], serves previously captured responses from a
//! [`cache::CacheStore`], and records fresh responses by interposing a
//! [`cache::CaptureSink`] between the handler and the real output.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use recache::cache::{CacheMiddleware, MemoryStore};
//! use recache::metrics::Metrics;
//! use recache::router::Router;
//! use recache::routes::{HealthHandler, TextoHandler};
//! use recache::server::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(MemoryStore::new());
//!     let metrics = Arc::new(Metrics::new()?);
//!
//!     let mut router = Router::new();
//!     router.get("/health", Arc::new(HealthHandler));
//!     router.get(
//!         "/texto",
//!         Arc::new(CacheMiddleware::new(
//!             Arc::new(TextoHandler),
//!             store,
//!             Arc::clone(&metrics),
//!             Duration::from_secs(10),
//!         )),
//!     );
//!
//!     let server = Server::bind("127.0.0.1:8001").await?;
//!     server.run(Arc::new(router)).await?;
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod http;
pub mod metrics;
pub mod router;
pub mod routes;
pub mod server;

// ── Convenience re-exports ────────────────────────────────────────────────────
pub use http::sink::{ResponseSink, ResponseWriter};
pub use http::{Headers, Method, Request, Response, StatusCode};
pub use server::{Server, ServerError};
