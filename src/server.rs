use anyhow::Result;
use axum::{routing::get, Router};
use tracing::info;

/// Minimal liveness responder for external uptime probes. Runs as its own
/// task for the process lifetime and shares nothing with the scrape loop.
pub async fn serve(port: u16) -> Result<()> {
    let app = Router::new().route("/", get(|| async { "bouco_watch alive" }));
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("Liveness endpoint listening on port {}", port);
    axum::serve(listener, app).await?;
    Ok(())
}
