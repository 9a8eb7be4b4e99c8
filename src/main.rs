//! Process bootstrap: tracing, config, Redis, routes, serve.

use std::process;
use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use recache::cache::{CacheMiddleware, CacheStore, RedisStore};
use recache::config::AppConfig;
use recache::metrics::Metrics;
use recache::router::Router;
use recache::routes::{HealthHandler, HoraHandler, MetricsHandler, TextoHandler};
use recache::server::Server;

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            process::exit(1);
        }
    };

    // Caching is a hard dependency: no Redis, no service.
    let store: Arc<dyn CacheStore> = match RedisStore::connect(&config.redis_url).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!(url = %config.redis_url, error = %e, "failed to connect to redis");
            process::exit(1);
        }
    };

    let metrics = match Metrics::new() {
        Ok(metrics) => Arc::new(metrics),
        Err(e) => {
            error!(error = %e, "failed to register metrics");
            process::exit(1);
        }
    };

    let ttl = config.cache_ttl();
    let mut router = Router::new();

    // Uncached routes
    router.get("/health", Arc::new(HealthHandler));
    router.get("/metricas", Arc::new(MetricsHandler::new(Arc::clone(&metrics))));

    // Cached routes
    router.get(
        "/texto",
        Arc::new(CacheMiddleware::new(
            Arc::new(TextoHandler),
            Arc::clone(&store),
            Arc::clone(&metrics),
            ttl,
        )),
    );
    router.get(
        "/hora",
        Arc::new(CacheMiddleware::new(
            Arc::new(HoraHandler),
            store,
            Arc::clone(&metrics),
            ttl,
        )),
    );

    let server = match Server::bind(&config.bind_addr).await {
        Ok(server) => server,
        Err(e) => {
            error!(address = %config.bind_addr, error = %e, "failed to bind");
            process::exit(1);
        }
    };

    info!(address = %config.bind_addr, ttl = ?ttl, "starting recache");

    if let Err(e) = server.run(Arc::new(router)).await {
        error!(error = %e, "server terminated");
        process::exit(1);
    }
}
