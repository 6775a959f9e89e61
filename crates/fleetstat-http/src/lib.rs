pub mod handlers;
pub mod response;

use axum::routing::get;
use axum::{Extension, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

pub use handlers::AppState;

/// Builds the application router with all routes.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/v1/status", get(handlers::all_statuses))
        .route("/v1/status/{device_id}", get(handlers::latest_status))
        .route(
            "/v1/status/{device_id}/history",
            get(handlers::status_history),
        )
        .route("/v1/status/group/report", get(handlers::group_report))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any))
        .layer(Extension(state))
}

/// Serves the router until the cancellation token fires.
pub async fn serve(
    router: Router,
    host: &str,
    port: u16,
    token: CancellationToken,
) -> Result<(), anyhow::Error> {
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    let listener = TcpListener::bind(addr).await?;

    info!(addr = %addr, "HTTP server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { token.cancelled().await })
        .await?;

    Ok(())
}
