use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::Identity,
    error::ApiError,
    moods::{
        dto::CreateMoodRequest,
        repo::{Mood, MoodWithUser},
    },
    state::AppState,
};

pub fn mood_routes() -> Router<AppState> {
    Router::new()
        .route("/mood", post(create_mood))
        .route("/moods", get(get_all_moods))
}

#[instrument(skip(state, identity, payload))]
pub async fn create_mood(
    State(state): State<AppState>,
    identity: Identity,
    Json(payload): Json<CreateMoodRequest>,
) -> Result<(StatusCode, Json<Mood>), ApiError> {
    // An admin may record a mood on behalf of another user.
    identity.require_self_or_admin(payload.user_id)?;

    let mood = Mood::create(
        &state.db,
        payload.user_id,
        payload.score,
        payload.notes.as_deref(),
    )
    .await?;

    info!(mood_id = %mood.id, user_id = %mood.user_id, "mood recorded");
    Ok((StatusCode::CREATED, Json(mood)))
}

/// Aggregate mood view across all users, admin only.
#[instrument(skip(state, identity))]
pub async fn get_all_moods(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Vec<MoodWithUser>>, ApiError> {
    identity.require_admin()?;
    Ok(Json(Mood::list_all(&state.db).await?))
}
