//! Quill Server
//!
//! Serves the user, auth and blog APIs over the configured primary store.
//!
//! ## Configuration
//!
//! Read from `config.toml` (or the file named by `QUILL_CONFIG`) with
//! `QUILL_*` environment overrides:
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `QUILL_HTTP_PORT` | `8080` | HTTP API port |
//! | `QUILL_STORE_PRIMARY` | `relational` | `relational`, `wide_column` or `memory` |
//! | `QUILL_STORE_REPLICATE` | `false` | Copy writes to the wide-column store |
//! | `QUILL_DATABASE_URL` | - | Relational connection URL |
//! | `QUILL_WIDE_COLUMN_NODES` | `127.0.0.1:9042` | Comma-separated contact points |
//! | `QUILL_JWT_SECRET` | - | HS256 signing secret |
//! | `RUST_LOG` | `info` | Log level |

use anyhow::{Context, Result};
use axum::{http::HeaderValue, routing::get, Router};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tokio::{net::TcpListener, signal};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use ql_config::{AppConfig, ConfigLoader};
use ql_platform::{platform_router, Platform, Stores};

#[tokio::main]
async fn main() -> Result<()> {
    ql_common::init_logging("ql-server");

    info!("Starting Quill Server");

    let config = ConfigLoader::new()
        .load()
        .context("Failed to load configuration")?;

    let metrics = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install metrics recorder")?;
    metrics::gauge!("quill_up").set(1.0);

    let stores = Stores::connect(&config).await?;
    let platform = Platform::new(&config, stores)?;

    let app = Router::new()
        .merge(platform_router(&platform))
        .route(
            "/internal/metrics",
            get(move || {
                let handle: PrometheusHandle = metrics.clone();
                async move { handle.render() }
            }),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config));

    let addr = format!("{}:{}", config.http.host, config.http.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("API server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("API server failed")?;

    info!("Quill Server shutdown complete");
    Ok(())
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if config.http.cors_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .http
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(origins)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
