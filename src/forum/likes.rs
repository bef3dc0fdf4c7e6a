use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::Identity,
    error::ApiError,
    forum::repo::{ForumLike, LikeWithUser},
    state::AppState,
};

pub fn like_routes() -> Router<AppState> {
    Router::new()
        .route("/like", post(create_like).delete(remove_like))
        .route("/post/:id/likes", get(get_post_likes))
}

#[derive(Debug, Deserialize)]
pub struct LikeRequest {
    pub post_id: Uuid,
}

/// Insert-if-absent in a single statement: two racing likes for the same
/// (user, post) pair leave exactly one row, and the loser gets the
/// already-liked error instead of a duplicate.
#[instrument(skip(state, identity, payload))]
pub async fn create_like(
    State(state): State<AppState>,
    identity: Identity,
    Json(payload): Json<LikeRequest>,
) -> Result<(StatusCode, Json<ForumLike>), ApiError> {
    let like = ForumLike::insert_if_absent(&state.db, identity.id, payload.post_id)
        .await?
        .ok_or_else(|| ApiError::Validation("User has already liked this post".into()))?;

    info!(like_id = %like.id, post_id = %like.post_id, "like created");
    Ok((StatusCode::CREATED, Json(like)))
}

/// Delete-if-present, scoped to the caller's own like.
#[instrument(skip(state, identity, payload))]
pub async fn remove_like(
    State(state): State<AppState>,
    identity: Identity,
    Json(payload): Json<LikeRequest>,
) -> Result<Json<Value>, ApiError> {
    if !ForumLike::remove(&state.db, identity.id, payload.post_id).await? {
        return Err(ApiError::not_found("Like"));
    }
    info!(post_id = %payload.post_id, user_id = %identity.id, "like removed");
    Ok(Json(json!({ "message": "Like removed successfully" })))
}

#[instrument(skip(state))]
pub async fn get_post_likes(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
) -> Result<Json<Vec<LikeWithUser>>, ApiError> {
    Ok(Json(ForumLike::list_by_post(&state.db, post_id).await?))
}
