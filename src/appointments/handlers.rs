use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    appointments::{
        dto::{CreateAppointmentRequest, UpdateAppointmentRequest},
        repo::Appointment,
    },
    auth::Identity,
    error::ApiError,
    state::AppState,
};

pub fn appointment_routes() -> Router<AppState> {
    Router::new()
        .route("/appointment", post(create_appointment))
        .route(
            "/appointment/:id",
            get(get_appointment)
                .put(update_appointment)
                .delete(delete_appointment),
        )
        .route("/appointments", get(list_appointments))
}

/// Booking starts at PENDING; the creator has no say in the status field.
/// Identical payloads create distinct appointments (no idempotency key).
#[instrument(skip(state, identity, payload))]
pub async fn create_appointment(
    State(state): State<AppState>,
    identity: Identity,
    Json(payload): Json<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<Appointment>), ApiError> {
    identity.require_self_or_admin(payload.user_id)?;

    if payload.description.trim().is_empty() {
        return Err(ApiError::Validation("Description is required".into()));
    }

    let appt = Appointment::create(
        &state.db,
        payload.user_id,
        &payload.description,
        payload.scheduled_at,
        &payload.kind,
        &payload.provider,
    )
    .await?;

    info!(appointment_id = %appt.id, user_id = %appt.user_id, "appointment created");
    Ok((StatusCode::CREATED, Json(appt)))
}

/// Status changes are an admin operation; any status may be written.
#[instrument(skip(state, identity, payload))]
pub async fn update_appointment(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAppointmentRequest>,
) -> Result<Json<Appointment>, ApiError> {
    identity.require_admin()?;

    let appt = Appointment::update(&state.db, id, payload.status, payload.scheduled_at)
        .await?
        .ok_or_else(|| ApiError::not_found("Appointment"))?;

    info!(appointment_id = %appt.id, status = ?appt.status, "appointment updated");
    Ok(Json(appt))
}

#[instrument(skip(state, identity))]
pub async fn delete_appointment(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let appt = Appointment::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Appointment"))?;
    identity.require_self_or_admin(appt.user_id)?;

    Appointment::delete(&state.db, id).await?;
    info!(appointment_id = %id, "appointment deleted");
    Ok(Json(json!({ "message": "Appointment deleted successfully" })))
}

/// Any authenticated caller may fetch an appointment by id; there is no
/// ownership check on this read path.
#[instrument(skip(state, _identity))]
pub async fn get_appointment(
    State(state): State<AppState>,
    _identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<Appointment>, ApiError> {
    let appt = Appointment::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Appointment"))?;
    Ok(Json(appt))
}

#[instrument(skip(state, identity))]
pub async fn list_appointments(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Vec<Appointment>>, ApiError> {
    identity.require_admin()?;
    Ok(Json(Appointment::list_all(&state.db).await?))
}
