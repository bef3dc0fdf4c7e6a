use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Labeled status, not an enforced state machine: the workflow moves
/// PENDING -> {CONFIRMED, CANCELED} and CONFIRMED -> COMPLETED, but an
/// admin overwrite may set any status at any time. Creation always
/// starts at PENDING regardless of what the creator sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Canceled,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Appointment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub description: String,
    pub scheduled_at: OffsetDateTime,
    pub kind: String,
    pub provider: String,
    pub status: AppointmentStatus,
    pub created_at: OffsetDateTime,
}

const COLUMNS: &str = "id, user_id, description, scheduled_at, kind, provider, status, created_at";

impl Appointment {
    pub async fn create(
        db: &PgPool,
        user_id: Uuid,
        description: &str,
        scheduled_at: OffsetDateTime,
        kind: &str,
        provider: &str,
    ) -> anyhow::Result<Appointment> {
        let appt = sqlx::query_as::<_, Appointment>(&format!(
            "INSERT INTO appointments (user_id, description, scheduled_at, kind, provider, status)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        ))
        .bind(user_id)
        .bind(description)
        .bind(scheduled_at)
        .bind(kind)
        .bind(provider)
        .bind(AppointmentStatus::Pending)
        .fetch_one(db)
        .await?;
        Ok(appt)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Appointment>> {
        let appt = sqlx::query_as::<_, Appointment>(&format!(
            "SELECT {COLUMNS} FROM appointments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(appt)
    }

    /// Status/time overwrite; NULL binds keep the current value.
    pub async fn update(
        db: &PgPool,
        id: Uuid,
        status: Option<AppointmentStatus>,
        scheduled_at: Option<OffsetDateTime>,
    ) -> anyhow::Result<Option<Appointment>> {
        let appt = sqlx::query_as::<_, Appointment>(&format!(
            "UPDATE appointments
             SET status = COALESCE($2, status),
                 scheduled_at = COALESCE($3, scheduled_at)
             WHERE id = $1
             RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(status)
        .bind(scheduled_at)
        .fetch_optional(db)
        .await?;
        Ok(appt)
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
        let deleted = sqlx::query("DELETE FROM appointments WHERE id = $1 RETURNING id")
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(deleted.is_some())
    }

    pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Appointment>> {
        let appts = sqlx::query_as::<_, Appointment>(&format!(
            "SELECT {COLUMNS} FROM appointments WHERE user_id = $1 ORDER BY scheduled_at"
        ))
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(appts)
    }

    pub async fn list_all(db: &PgPool) -> anyhow::Result<Vec<Appointment>> {
        let appts = sqlx::query_as::<_, Appointment>(&format!(
            "SELECT {COLUMNS} FROM appointments ORDER BY scheduled_at"
        ))
        .fetch_all(db)
        .await?;
        Ok(appts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&AppointmentStatus::Pending).unwrap(),
            "\"PENDING\""
        );
        assert_eq!(
            serde_json::to_string(&AppointmentStatus::Canceled).unwrap(),
            "\"CANCELED\""
        );
    }

    #[test]
    fn status_parses_uppercase_only() {
        let s: AppointmentStatus = serde_json::from_str("\"CONFIRMED\"").unwrap();
        assert_eq!(s, AppointmentStatus::Confirmed);
        assert!(serde_json::from_str::<AppointmentStatus>("\"confirmed\"").is_err());
        assert!(serde_json::from_str::<AppointmentStatus>("\"DONE\"").is_err());
    }
}
