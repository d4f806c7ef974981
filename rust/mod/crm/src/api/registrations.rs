use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
};
use serde::Deserialize;

use subhub_core::ServiceError;

use crate::model::{AppCatalogEntry, AppRegistration};
use crate::service::registration::{MacSearchRow, RegistrationInput, RegistrationView};
use super::{AppState, ok_json};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/customers/{id}/registrations",
            get(list_for_customer).post(create),
        )
        .route("/registrations/search", get(search_by_mac))
        .route("/registrations/{id}", put(update).delete(delete))
        .route("/apps", get(list_apps))
}

async fn list_for_customer(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<RegistrationView>>, ServiceError> {
    ok_json(svc.registrations_for_customer(&id))
}

#[derive(Deserialize)]
struct MacQuery {
    #[serde(default)]
    mac: String,
}

async fn search_by_mac(
    State(svc): State<AppState>,
    Query(query): Query<MacQuery>,
) -> Result<Json<Vec<MacSearchRow>>, ServiceError> {
    ok_json(svc.search_by_mac(&query.mac))
}

async fn create(
    State(svc): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<RegistrationInput>,
) -> Result<(StatusCode, Json<AppRegistration>), ServiceError> {
    let reg = svc.create_registration(&id, input)?;
    Ok((StatusCode::CREATED, Json(reg)))
}

async fn update(
    State(svc): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<RegistrationInput>,
) -> Result<Json<AppRegistration>, ServiceError> {
    ok_json(svc.update_registration(&id, input))
}

async fn delete(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServiceError> {
    svc.delete_registration(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_apps(
    State(svc): State<AppState>,
) -> Result<Json<Vec<AppCatalogEntry>>, ServiceError> {
    ok_json(svc.list_apps())
}
