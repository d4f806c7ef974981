use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
};

use subhub_core::ServiceError;

use crate::model::Contact;
use crate::service::contact::ContactInput;
use super::{AppState, ok_json};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/customers/{id}/contacts",
            get(list_for_customer).post(create),
        )
        .route("/contacts/{id}", put(update).delete(delete))
}

async fn list_for_customer(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Contact>>, ServiceError> {
    ok_json(svc.contacts_for_customer(&id))
}

async fn create(
    State(svc): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<ContactInput>,
) -> Result<(StatusCode, Json<Contact>), ServiceError> {
    let contact = svc.add_contact(&id, input)?;
    Ok((StatusCode::CREATED, Json(contact)))
}

async fn update(
    State(svc): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<ContactInput>,
) -> Result<Json<Contact>, ServiceError> {
    ok_json(svc.update_contact(&id, input))
}

async fn delete(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServiceError> {
    svc.delete_contact(&id)?;
    Ok(StatusCode::NO_CONTENT)
}
