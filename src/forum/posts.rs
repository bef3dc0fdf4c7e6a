use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use bytes::Bytes;
use serde_json::{json, Value};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::Identity,
    error::ApiError,
    files::{attachment_key, is_allowed_attachment, MAX_ATTACHMENT_BYTES},
    forum::repo::{ForumPost, PostCategory},
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/forum/posts", get(list_posts))
        .route("/forum/post/:id", get(get_post))
        .route("/forum/post/:id/file", get(download_attachment))
        .route("/forum/resources", get(list_resources))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/forum/post", post(create_post))
        .route("/forum/post/:id", delete(delete_post))
        // Attachment ceiling plus multipart framing overhead.
        .layer(DefaultBodyLimit::max(MAX_ATTACHMENT_BYTES + 1024 * 1024))
}

struct Upload {
    original_name: String,
    content_type: String,
    body: Bytes,
}

/// Multipart fields: title, category (TEXT|IMAGE|ZIP), text, and for
/// IMAGE/ZIP posts a `file` part.
#[instrument(skip(state, identity, mp))]
pub async fn create_post(
    State(state): State<AppState>,
    identity: Identity,
    mut mp: Multipart,
) -> Result<(StatusCode, Json<ForumPost>), ApiError> {
    let mut title: Option<String> = None;
    let mut category: Option<PostCategory> = None;
    let mut text: Option<String> = None;
    let mut upload: Option<Upload> = None;

    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("malformed multipart body: {e}")))?
    {
        let name = field.name().map(|s| s.to_string());
        match name.as_deref() {
            Some("title") => title = Some(read_text(field).await?),
            Some("category") => {
                let raw = read_text(field).await?;
                category = Some(
                    raw.parse()
                        .map_err(|_| ApiError::Validation(format!("Unknown category: {raw}")))?,
                );
            }
            Some("text") => text = Some(read_text(field).await?),
            Some("file") => {
                let original_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let body = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::Validation(format!("failed to read file: {e}")))?;
                upload = Some(Upload {
                    original_name,
                    content_type,
                    body,
                });
            }
            _ => {}
        }
    }

    let title = title.ok_or_else(|| ApiError::Validation("Title is required".into()))?;
    let category = category.ok_or_else(|| ApiError::Validation("Category is required".into()))?;

    let stored = match category {
        PostCategory::Text => {
            if upload.is_some() {
                return Err(ApiError::Validation(
                    "Text posts cannot carry a file".into(),
                ));
            }
            None
        }
        PostCategory::Image | PostCategory::Zip => {
            let upload = upload.ok_or_else(|| ApiError::Validation("No file uploaded".into()))?;
            if !is_allowed_attachment(&upload.content_type, &upload.original_name) {
                warn!(content_type = %upload.content_type, "attachment type rejected");
                return Err(ApiError::Validation(
                    "Invalid file type. Allowed types are: image, pdf, zip".into(),
                ));
            }
            if upload.body.len() > MAX_ATTACHMENT_BYTES {
                return Err(ApiError::Validation("File exceeds the 10 MB limit".into()));
            }

            let key = attachment_key(&upload.original_name);
            state.files.put(&key, upload.body).await?;
            Some((key, upload.content_type))
        }
    };

    let (file_name, file_mime) = match &stored {
        Some((k, m)) => (Some(k.as_str()), Some(m.as_str())),
        None => (None, None),
    };

    let post = ForumPost::create(
        &state.db,
        identity.id,
        &title,
        category,
        text.as_deref(),
        file_name,
        file_mime,
    )
    .await?;

    info!(post_id = %post.id, user_id = %identity.id, ?category, "forum post created");
    Ok((StatusCode::CREATED, Json(post)))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::Validation(format!("malformed multipart field: {e}")))
}

#[instrument(skip(state))]
pub async fn list_posts(State(state): State<AppState>) -> Result<Json<Vec<ForumPost>>, ApiError> {
    Ok(Json(ForumPost::list(&state.db).await?))
}

#[instrument(skip(state))]
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ForumPost>, ApiError> {
    let post = ForumPost::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Forum post"))?;
    Ok(Json(post))
}

#[instrument(skip(state))]
pub async fn list_resources(
    State(state): State<AppState>,
) -> Result<Json<Vec<ForumPost>>, ApiError> {
    Ok(Json(ForumPost::list_resources(&state.db).await?))
}

#[instrument(skip(state))]
pub async fn download_attachment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let post = ForumPost::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Forum post"))?;

    let key = post
        .file_name
        .ok_or_else(|| ApiError::not_found("Attachment"))?;
    let mime = post
        .file_mime
        .unwrap_or_else(|| "application/octet-stream".into());
    let body = state.files.get(&key).await.map_err(|e| {
        warn!(error = %e, %key, "attachment missing from store");
        ApiError::not_found("Attachment")
    })?;

    Ok(([(header::CONTENT_TYPE, mime)], body))
}

#[instrument(skip(state, identity))]
pub async fn delete_post(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    identity.require_admin()?;

    let post = ForumPost::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Resource"))?;

    ForumPost::delete(&state.db, id).await?;
    if let Some(key) = post.file_name {
        // Row is gone either way; a stray file only wastes disk.
        if let Err(e) = state.files.delete(&key).await {
            warn!(error = %e, %key, "failed to remove attachment");
        }
    }

    info!(post_id = %id, deleted_by = %identity.id, "forum post deleted");
    Ok(Json(json!({ "message": "Post deleted successfully" })))
}
