use serde::Deserialize;
use uuid::Uuid;

/// Request body for recording a mood.
#[derive(Debug, Deserialize)]
pub struct CreateMoodRequest {
    pub user_id: Uuid,
    pub score: i32,
    pub notes: Option<String>,
}
