mod handlers;
mod routes;

use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::RemoteCredentials;
use crate::store::DocumentStore;

#[derive(Clone)]
pub struct AppState {
    pub docs: Arc<dyn DocumentStore>,
    /// `None` when the `REMOTE_*` variables are not set.
    pub credentials: Option<RemoteCredentials>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "Backend is running" }))
        .merge(routes::api_routes())
        .with_state(state)
}

pub async fn run_server(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    if state.credentials.is_none() {
        tracing::warn!(
            "REMOTE_API_KEY is not set; /api/config will fail and document routes are closed"
        );
    }
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
