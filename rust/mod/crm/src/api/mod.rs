pub mod alerts;
pub mod contacts;
pub mod customers;
pub mod dashboard;
pub mod payments;
pub mod plans;
pub mod registrations;
pub mod subscriptions;

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use subhub_core::ServiceError;

use crate::service::CrmService;

/// Shared application state.
pub type AppState = Arc<CrmService>;

/// Build the CRM API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/crm/v1", api_routes())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(customers::routes())
        .merge(subscriptions::routes())
        .merge(registrations::routes())
        .merge(payments::routes())
        .merge(plans::routes())
        .merge(contacts::routes())
        .merge(alerts::routes())
        .merge(dashboard::routes())
}

/// Wrap a Result<T, ServiceError> into an API response.
pub(crate) fn ok_json<T: Serialize>(
    result: Result<T, ServiceError>,
) -> Result<Json<T>, ServiceError> {
    result.map(Json)
}

// ── Legacy `ok` envelope ──
//
// The note-update and renewal endpoints predate the error-code body
// and answer `{"ok": bool, ...}`; their callers still match on it.

/// `{"ok": true, "<key>": value}`.
pub(crate) fn ok_envelope<T: Serialize>(key: &str, value: &T) -> Response {
    let body = serde_json::json!({ "ok": true, key: value });
    Json(body).into_response()
}

/// `{"ok": false, "error": message}` with the status the error maps to.
pub(crate) fn err_envelope(err: &ServiceError) -> Response {
    let status = match err {
        ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let body = serde_json::json!({ "ok": false, "error": err.to_string() });
    (status, Json(body)).into_response()
}
