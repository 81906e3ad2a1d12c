use axum::{routing::get, Router};

use crate::backend::{handlers, AppState};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/config", get(handlers::config_handler))
        .route("/api/budgets/{owner}/items", get(handlers::list_items))
        .route(
            "/api/budgets/{owner}/items/{key}",
            axum::routing::put(handlers::put_item).delete(handlers::delete_item),
        )
        .route(
            "/api/budgets/{owner}/config",
            get(handlers::get_config)
                .put(handlers::replace_config)
                .patch(handlers::merge_config),
        )
        .route("/api/budgets/{owner}/watch/items", get(handlers::watch_items))
        .route("/api/budgets/{owner}/watch/config", get(handlers::watch_config))
}
