use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
};
use serde::Deserialize;

use subhub_core::{ListResult, ServiceError};

use crate::service::customer::{
    CreateCustomer, CustomerDetail, CustomerListQuery, CustomerListRow, CustomerMatch,
    CustomerUpdate,
};
use super::{AppState, err_envelope, ok_envelope, ok_json};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/customers", get(list_customers).post(create_customer))
        .route("/customers/search", get(search_customers))
        .route(
            "/customers/{id}",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
        .route("/customers/{id}/note", put(update_note))
}

#[derive(Deserialize)]
struct SearchQuery {
    #[serde(default)]
    q: String,
}

async fn list_customers(
    State(svc): State<AppState>,
    Query(query): Query<CustomerListQuery>,
) -> Result<Json<ListResult<CustomerListRow>>, ServiceError> {
    ok_json(svc.list_customers(&query))
}

async fn search_customers(
    State(svc): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<CustomerMatch>>, ServiceError> {
    ok_json(svc.search_customers(&query.q))
}

async fn get_customer(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CustomerDetail>, ServiceError> {
    ok_json(svc.get_customer(&id))
}

async fn create_customer(
    State(svc): State<AppState>,
    Json(input): Json<CreateCustomer>,
) -> Result<impl IntoResponse, ServiceError> {
    let id = svc.create_customer(input)?;
    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}

async fn update_customer(
    State(svc): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<CustomerUpdate>,
) -> Result<Json<crate::model::Customer>, ServiceError> {
    ok_json(svc.update_customer(&id, input))
}

async fn delete_customer(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServiceError> {
    svc.delete_customer(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Default, Deserialize)]
struct NoteBody {
    #[serde(default)]
    note: Option<String>,
}

/// Inline note editor endpoint. Answers the legacy `ok` envelope:
/// `{"ok": true, "customer": {...}}` or `{"ok": false, "error": "..."}`.
async fn update_note(
    State(svc): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<NoteBody>>,
) -> Response {
    let note = body.map(|Json(b)| b.note).unwrap_or_default();
    match svc.update_customer_note(&id, note) {
        Ok(customer) => ok_envelope("customer", &customer),
        Err(err) => {
            tracing::error!("failed to save note for customer {}: {}", id, err);
            err_envelope(&err)
        }
    }
}
