use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::Response,
    routing::{get, post, put},
};

use subhub_core::ServiceError;

use crate::model::Subscription;
use crate::service::subscription::{RenewInput, SubscriptionInput, SubscriptionView};
use super::{AppState, err_envelope, ok_envelope, ok_json};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/customers/{id}/subscriptions",
            get(list_for_customer).post(create),
        )
        .route("/subscriptions/{id}", put(update).delete(delete))
        .route("/subscriptions/{id}/renew", put(renew))
        .route("/subscriptions/{id}/billing-month", post(add_billing_month))
}

async fn list_for_customer(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<SubscriptionView>>, ServiceError> {
    ok_json(svc.subscriptions_for_customer(&id))
}

async fn create(
    State(svc): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<SubscriptionInput>,
) -> Result<(StatusCode, Json<Subscription>), ServiceError> {
    let sub = svc.create_subscription(&id, input)?;
    Ok((StatusCode::CREATED, Json(sub)))
}

async fn update(
    State(svc): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<SubscriptionInput>,
) -> Result<Json<Subscription>, ServiceError> {
    ok_json(svc.update_subscription(&id, input))
}

async fn delete(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServiceError> {
    svc.delete_subscription(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Renewal endpoint. Answers the legacy `ok` envelope; a missing body
/// renews one month with activation, like the quick-renew button sends.
async fn renew(
    State(svc): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<RenewInput>>,
) -> Response {
    let input = body.map(|Json(b)| b).unwrap_or_default();
    match svc.renew_subscription(&id, input) {
        Ok(subscription) => ok_envelope("subscription", &subscription),
        Err(err) => {
            tracing::error!("failed to renew subscription {}: {}", id, err);
            err_envelope(&err)
        }
    }
}

/// Alerts-screen quick action: one more month of billing.
async fn add_billing_month(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Subscription>, ServiceError> {
    ok_json(svc.add_billing_month(&id))
}
