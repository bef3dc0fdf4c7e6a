use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::Identity,
    error::ApiError,
    forum::repo::{CommentWithUser, ForumComment},
    state::AppState,
};

pub fn comment_routes() -> Router<AppState> {
    Router::new()
        .route("/comment", post(create_comment))
        .route("/comment/:id", delete(remove_comment))
        .route("/post/:id/comments", get(get_post_comments))
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub post_id: Uuid,
    pub text: String,
}

/// The comment's owner is the authenticated caller, not a body field.
#[instrument(skip(state, identity, payload))]
pub async fn create_comment(
    State(state): State<AppState>,
    identity: Identity,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<ForumComment>), ApiError> {
    if payload.text.trim().is_empty() {
        return Err(ApiError::Validation("Comment text is required".into()));
    }

    let comment = ForumComment::create(&state.db, identity.id, payload.post_id, &payload.text)
        .await?;

    info!(comment_id = %comment.id, post_id = %comment.post_id, "comment created");
    Ok((StatusCode::CREATED, Json(comment)))
}

/// Owner-only: admins get no override on other people's comments.
#[instrument(skip(state, identity))]
pub async fn remove_comment(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let comment = ForumComment::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Comment"))?;
    identity.require_owner(comment.user_id)?;

    ForumComment::delete(&state.db, id).await?;
    info!(comment_id = %id, user_id = %identity.id, "comment removed");
    Ok(Json(json!({ "message": "Comment removed successfully" })))
}

#[instrument(skip(state))]
pub async fn get_post_comments(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
) -> Result<Json<Vec<CommentWithUser>>, ApiError> {
    Ok(Json(ForumComment::list_by_post(&state.db, post_id).await?))
}
