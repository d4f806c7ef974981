use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
};
use serde::Deserialize;

use subhub_core::{ListResult, ServiceError};

use crate::model::Payment;
use crate::service::payment::{PaymentInput, PaymentListQuery, PaymentListRow};
use super::{AppState, ok_json};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/payments", get(list))
        .route("/payments/{id}", put(update).delete(delete))
        .route(
            "/customers/{id}/payments",
            get(list_for_customer).post(create),
        )
}

async fn list(
    State(svc): State<AppState>,
    Query(query): Query<PaymentListQuery>,
) -> Result<Json<ListResult<PaymentListRow>>, ServiceError> {
    ok_json(svc.list_payments(&query))
}

#[derive(Deserialize)]
struct RecentQuery {
    #[serde(default = "default_recent_limit")]
    limit: usize,
}

fn default_recent_limit() -> usize {
    5
}

async fn list_for_customer(
    State(svc): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<Payment>>, ServiceError> {
    ok_json(svc.payments_for_customer(&id, query.limit))
}

async fn create(
    State(svc): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<PaymentInput>,
) -> Result<(StatusCode, Json<Payment>), ServiceError> {
    let payment = svc.create_payment(&id, input)?;
    Ok((StatusCode::CREATED, Json(payment)))
}

async fn update(
    State(svc): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<PaymentInput>,
) -> Result<Json<Payment>, ServiceError> {
    ok_json(svc.update_payment(&id, input))
}

async fn delete(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServiceError> {
    svc.delete_payment(&id)?;
    Ok(StatusCode::NO_CONTENT)
}
