use serde::Deserialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::appointments::repo::AppointmentStatus;

/// Request body for booking an appointment. Status is not accepted here:
/// every booking starts at PENDING.
#[derive(Debug, Deserialize)]
pub struct CreateAppointmentRequest {
    pub user_id: Uuid,
    pub description: String,
    pub scheduled_at: OffsetDateTime,
    pub kind: String,
    pub provider: String,
}

/// Admin overwrite of status and/or time; absent fields stay put.
#[derive(Debug, Deserialize)]
pub struct UpdateAppointmentRequest {
    pub status: Option<AppointmentStatus>,
    pub scheduled_at: Option<OffsetDateTime>,
}
