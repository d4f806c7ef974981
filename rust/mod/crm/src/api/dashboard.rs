use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::Deserialize;

use subhub_core::ServiceError;

use crate::service::dashboard::{
    DashboardMetrics, MethodPayments, MonthlyPayments, PackageStats, PlanStats,
    UpcomingRenewal,
};
use super::{AppState, ok_json};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard/metrics", get(metrics))
        .route("/dashboard/payments-by-month", get(payments_by_month))
        .route("/dashboard/payments-by-method", get(payments_by_method))
        .route("/dashboard/packages", get(package_stats))
        .route("/dashboard/plans", get(plan_stats))
        .route("/dashboard/upcoming", get(upcoming))
}

async fn metrics(State(svc): State<AppState>) -> Result<Json<DashboardMetrics>, ServiceError> {
    ok_json(svc.dashboard_metrics())
}

#[derive(Deserialize)]
struct MonthsQuery {
    #[serde(default = "default_months")]
    months: u32,
}

fn default_months() -> u32 {
    6
}

async fn payments_by_month(
    State(svc): State<AppState>,
    Query(query): Query<MonthsQuery>,
) -> Result<Json<Vec<MonthlyPayments>>, ServiceError> {
    ok_json(svc.payments_by_month(query.months))
}

#[derive(Deserialize)]
struct MethodDaysQuery {
    #[serde(default = "default_method_days")]
    days: u32,
}

fn default_method_days() -> u32 {
    30
}

async fn payments_by_method(
    State(svc): State<AppState>,
    Query(query): Query<MethodDaysQuery>,
) -> Result<Json<Vec<MethodPayments>>, ServiceError> {
    ok_json(svc.payments_by_method(query.days))
}

async fn package_stats(State(svc): State<AppState>) -> Result<Json<Vec<PackageStats>>, ServiceError> {
    ok_json(svc.package_stats())
}

async fn plan_stats(State(svc): State<AppState>) -> Result<Json<Vec<PlanStats>>, ServiceError> {
    ok_json(svc.plan_stats())
}

#[derive(Deserialize)]
struct UpcomingQuery {
    #[serde(default = "default_upcoming_days")]
    days: u32,
}

fn default_upcoming_days() -> u32 {
    7
}

async fn upcoming(
    State(svc): State<AppState>,
    Query(query): Query<UpcomingQuery>,
) -> Result<Json<Vec<UpcomingRenewal>>, ServiceError> {
    ok_json(svc.upcoming_renewals(query.days))
}
