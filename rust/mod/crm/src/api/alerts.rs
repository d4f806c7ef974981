use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::Deserialize;

use subhub_core::ServiceError;

use crate::service::alerts::{AppAlert, BillingAlert};
use super::{AppState, ok_json};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/alerts/billing", get(billing))
        .route("/alerts/apps", get(apps))
}

#[derive(Deserialize)]
struct BillingQuery {
    #[serde(default = "default_billing_days")]
    days: u32,
}

fn default_billing_days() -> u32 {
    5
}

#[derive(Deserialize)]
struct AppQuery {
    #[serde(default = "default_app_days")]
    days: u32,
}

fn default_app_days() -> u32 {
    7
}

async fn billing(
    State(svc): State<AppState>,
    Query(query): Query<BillingQuery>,
) -> Result<Json<Vec<BillingAlert>>, ServiceError> {
    ok_json(svc.billing_alerts(query.days))
}

async fn apps(
    State(svc): State<AppState>,
    Query(query): Query<AppQuery>,
) -> Result<Json<Vec<AppAlert>>, ServiceError> {
    ok_json(svc.app_alerts(query.days))
}
