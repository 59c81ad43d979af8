//! Social Wiki HTTP service.
//!
//! Environment:
//! - `DATABASE_URL`: PostgreSQL connection string (required)
//! - `WIKI_ADDR`: listen address (default: `0.0.0.0:8080`)
//! - `RUST_LOG`: log filter (default: info)
//! - `LOG_FORMAT`: `json` or `pretty` (default: json)
//! - `WIKI_MAX_ANCESTRY_DEPTH`, `WIKI_SESSION_TTL_SECS`: see [`social_wiki::WikiConfig`]
//!
//! ```bash
//! DATABASE_URL=postgresql://... cargo run --bin social_wiki_service --features service
//! ```

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use axum::{extract::Request, middleware::Next, response::Response};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, info_span, Instrument};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use social_wiki::service::{create_router, ServiceState};
use social_wiki::PostgresWikiStore;

const DEFAULT_ADDR: &str = "0.0.0.0:8080";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "social_wiki=info,tower_http=info,sqlx=warn".into());
    let registry = tracing_subscriber::registry().with(filter);

    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("pretty") => registry.with(tracing_subscriber::fmt::layer()).init(),
        _ => registry
            .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
            .init(),
    }
}

/// Run each request inside a span carrying its `X-Request-Id`, so store and
/// session logs can be joined to the request metric.
async fn request_span(request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get("X-Request-Id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let span = info_span!("request", request_id = %request_id, path = %request.uri().path());

    next.run(request).instrument(span).await
}

async fn connect_store() -> Result<PostgresWikiStore, Box<dyn std::error::Error>> {
    let started = Instant::now();
    let store = tokio::time::timeout(CONNECT_TIMEOUT, PostgresWikiStore::from_env())
        .await
        .map_err(|_| format!("PostgreSQL connection timed out after {:?}", CONNECT_TIMEOUT))??;
    store.migrate().await?;

    info!(latency_ms = started.elapsed().as_millis() as u64, "Wiki schema ready");
    Ok(store)
}

async fn shutdown_signal() {
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = terminate => {}
    }
    info!("Shutting down");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let addr: SocketAddr = std::env::var("WIKI_ADDR")
        .unwrap_or_else(|_| DEFAULT_ADDR.to_string())
        .parse()?;

    let store = match connect_store().await {
        Ok(store) => store,
        Err(e) => {
            tracing::error!(error = %e, "Could not open the wiki store");
            return Err(e);
        }
    };

    let app = create_router(ServiceState::from_env(store))
        .layer(axum::middleware::from_fn(request_span))
        .layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(addr).await?;
    info!(address = %addr, version = env!("CARGO_PKG_VERSION"), "Social Wiki listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
