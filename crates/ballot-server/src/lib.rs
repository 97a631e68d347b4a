//! HTTP surface for the ballot vote-tally service.
//!
//! Routes:
//! - `GET /random_image[?exclude=1,2]` -> `{"image_id": n}`
//! - `POST /save_vote` with `{"image_id": n}` -> `{"message": "Vote processed!"}`
//! - `GET /get_results` -> `[{"image_id": n, "votes": k}, ...]`
//! - `GET /hall_of_fame[?limit=N]` -> top items by votes
//! - `GET /health` -> `OK`
//!
//! Every response carries no-cache headers so browsers never reuse a stale
//! random pick or tally.

use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use ballot_core::config::ServerConfig;
use tokio::net::TcpListener;
use tokio::signal::ctrl_c;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub mod error;
pub mod refresh;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

use refresh::spawn_catalog_refresher;

/// Build the application router.
#[must_use]
pub fn router(state: AppState, config: &ServerConfig) -> Router {
    let app = Router::new()
        .route("/random_image", get(routes::random_image))
        .route("/save_vote", post(routes::save_vote))
        .route("/get_results", get(routes::get_results))
        .route("/hall_of_fame", get(routes::hall_of_fame))
        .route("/health", get(routes::health))
        .with_state(state)
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache, no-store, must-revalidate"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::PRAGMA,
            HeaderValue::from_static("no-cache"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::EXPIRES,
            HeaderValue::from_static("0"),
        ))
        .layer(TraceLayer::new_for_http());

    if config.cors_allow_any {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
            .max_age(Duration::from_secs(60 * 60));
        app.layer(cors)
    } else {
        app
    }
}

/// Bind `config.bind` and serve until Ctrl+C or SIGTERM.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(state: AppState, config: &ServerConfig) -> Result<()> {
    let listener = TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    serve_on(listener, state, config, shutdown_signal()).await
}

/// Serve on an already bound listener until `shutdown` resolves.
///
/// In-flight requests finish before this returns. The catalog refresher is
/// stopped afterwards.
///
/// # Errors
///
/// Returns an error if the server fails.
pub async fn serve_on(
    listener: TcpListener,
    state: AppState,
    config: &ServerConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let refresher = config
        .catalog_refresh_interval()
        .map(|every| spawn_catalog_refresher(state.service.clone(), every));

    let address = listener.local_addr().context("Failed to read bound address")?;
    info!(
        %address,
        items = state.service.catalog().len(),
        backend = state.service.store().backend(),
        "ballot server listening"
    );

    let app = router(state, config);
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server failed");

    if let Some(handle) = refresher {
        handle.abort();
    }
    info!("ballot server stopped");
    served
}

/// Resolves on Ctrl+C or, on unix, SIGTERM.
pub async fn shutdown_signal() {
    let interrupt = async {
        if let Err(err) = ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        info!("received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("received terminate signal, shutting down");
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = interrupt => {},
        () = terminate => {},
    }
}
