//! Route registration — module routes plus system endpoints.

use axum::Router;
use axum::response::IntoResponse;
use axum::routing::get;

use subhub_crm::api::AppState;

/// Build the complete router.
pub fn build_router(state: AppState) -> Router {
    let system_routes = Router::new()
        .route("/health", get(health))
        .route("/version", get(version));

    subhub_crm::api::router(state).merge(system_routes)
}

async fn health() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "status": "ok",
    }))
}

async fn version() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": "subhubd",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
