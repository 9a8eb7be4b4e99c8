//! Request routing — map HTTP method and path to a handler.
//!
//! Every route this service exposes is an exact, parameter-less path, so
//! the router does plain string matching: routes are tested in
//! registration order and the first method + path match wins. Trailing
//! slashes are normalized on both sides, so `/texto/` and `/texto` are
//! equivalent. When nothing matches, the router answers `404 Not Found`.

use std::io;
use std::sync::Arc;

use async_trait::async_trait;

use crate::http::sink::ResponseSink;
use crate::http::{Method, Request, StatusCode};

/// An opaque request-handling function.
///
/// Handlers receive the parsed request and a sink to write the response
/// through. They are shared across tokio tasks, hence `Send + Sync`.
/// Errors propagate to the server loop, which answers `500`.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, request: &Request, sink: &mut dyn ResponseSink) -> io::Result<()>;
}

struct Route {
    method: Method,
    path: String,
    handler: Arc<dyn Handler>,
}

/// Dispatches requests to registered handlers by exact method + path match.
///
/// # Examples
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use recache::router::Router;
/// use recache::routes::HealthHandler;
///
/// let mut router = Router::new();
/// router.get("/health", Arc::new(HealthHandler));
/// ```
pub struct Router {
    routes: Vec<Route>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

// Strip a trailing slash, except on the root path.
fn normalize(path: &str) -> &str {
    if path != "/" && path.ends_with('/') {
        &path[..path.len() - 1]
    } else {
        path
    }
}

impl Router {
    /// Creates an empty router.
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Registers a handler for `GET` requests to the exact path.
    pub fn get(&mut self, path: &str, handler: Arc<dyn Handler>) {
        self.route(Method::Get, path, handler);
    }

    /// Registers a handler for the given method and exact path.
    pub fn route(&mut self, method: Method, path: &str, handler: Arc<dyn Handler>) {
        self.routes.push(Route {
            method,
            path: normalize(path).to_owned(),
            handler,
        });
    }

    /// Dispatches `request` to the first matching route.
    ///
    /// When no route matches, sets `404 Not Found` on the sink.
    pub async fn dispatch(
        &self,
        request: &Request,
        sink: &mut dyn ResponseSink,
    ) -> io::Result<()> {
        let path = normalize(request.path());

        for route in &self.routes {
            if &route.method == request.method() && route.path == path {
                return route.handler.handle(request, sink).await;
            }
        }

        sink.set_status(StatusCode::NotFound);
        sink.write(b"Not Found")?;
        Ok(())
    }
}
