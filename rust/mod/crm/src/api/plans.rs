use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};

use subhub_core::ServiceError;

use crate::model::{Package, Plan};
use crate::service::plan::PlanInput;
use super::{AppState, ok_json};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/plans", get(list).post(create))
        .route("/plans/{id}", get(get_plan).put(update).delete(delete))
        .route("/packages", get(list_packages))
}

async fn list(State(svc): State<AppState>) -> Result<Json<Vec<Plan>>, ServiceError> {
    ok_json(svc.list_plans())
}

async fn get_plan(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Plan>, ServiceError> {
    ok_json(svc.get_plan(&id))
}

async fn create(
    State(svc): State<AppState>,
    Json(input): Json<PlanInput>,
) -> Result<(StatusCode, Json<Plan>), ServiceError> {
    let plan = svc.create_plan(input)?;
    Ok((StatusCode::CREATED, Json(plan)))
}

async fn update(
    State(svc): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<PlanInput>,
) -> Result<Json<Plan>, ServiceError> {
    ok_json(svc.update_plan(&id, input))
}

async fn delete(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServiceError> {
    svc.delete_plan(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_packages(State(svc): State<AppState>) -> Result<Json<Vec<Package>>, ServiceError> {
    ok_json(svc.list_packages())
}
