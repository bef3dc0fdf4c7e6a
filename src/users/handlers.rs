use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    appointments::repo::Appointment,
    auth::{services, Identity},
    error::ApiError,
    forum::repo::{ForumComment, ForumLike, ForumPost},
    moods::repo::Mood,
    state::AppState,
    users::{
        dto::{PublicUser, SignupRequest, UpdateUserRequest},
        repo::User,
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/user", post(signup))
        .route("/users", get(list_users))
        .route("/user/:id", get(get_user).put(update_user).delete(delete_user))
        .route("/user/:id/moods", get(get_user_moods))
        .route("/user/:id/posts", get(get_user_posts))
        .route("/user/:id/appointments", get(get_user_appointments))
        .route("/user/:id/likes", get(get_user_likes))
        .route("/user/:id/comments", get(get_user_comments))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Json(mut payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<PublicUser>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if !services::is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::Validation("Invalid email".into()));
    }
    if payload.password.len() < 8 {
        warn!("password too short");
        return Err(ApiError::Validation("Password too short".into()));
    }

    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::Validation(
            "User with this email already exists".into(),
        ));
    }

    let hash = services::hash_password(&payload.password)?;
    let user = User::create(&state.db, &payload.name, &payload.email, payload.role, &hash).await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, identity))]
pub async fn list_users(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Vec<PublicUser>>, ApiError> {
    identity.require_admin()?;
    let users = User::list(&state.db).await?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

#[instrument(skip(state, identity))]
pub async fn get_user(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<PublicUser>, ApiError> {
    identity.require_self_or_admin(id)?;
    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, identity, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<PublicUser>, ApiError> {
    identity.require_self_or_admin(id)?;
    // Role is set at creation; only an admin may change it afterwards.
    if payload.role.is_some() {
        identity.require_admin()?;
    }

    let email = match payload.email {
        Some(e) => {
            let e = e.trim().to_lowercase();
            if !services::is_valid_email(&e) {
                return Err(ApiError::Validation("Invalid email".into()));
            }
            Some(e)
        }
        None => None,
    };

    let password_hash = match payload.password.as_deref() {
        Some(p) if p.len() < 8 => {
            return Err(ApiError::Validation("Password too short".into()))
        }
        Some(p) => Some(services::hash_password(p)?),
        None => None,
    };

    let user = User::update(
        &state.db,
        id,
        payload.name.as_deref(),
        email.as_deref(),
        payload.role,
        password_hash.as_deref(),
    )
    .await?
    .ok_or_else(|| ApiError::not_found("User"))?;

    info!(user_id = %user.id, "user updated");
    Ok(Json(user.into()))
}

#[instrument(skip(state, identity))]
pub async fn delete_user(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    identity.require_admin()?;
    if !User::delete(&state.db, id).await? {
        return Err(ApiError::not_found("User"));
    }
    info!(user_id = %id, deleted_by = %identity.id, "user deleted");
    Ok(Json(json!({ "message": "User deleted successfully" })))
}

#[instrument(skip(state, identity))]
pub async fn get_user_moods(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Mood>>, ApiError> {
    identity.require_self_or_admin(id)?;
    Ok(Json(Mood::list_by_user(&state.db, id).await?))
}

#[instrument(skip(state, identity))]
pub async fn get_user_posts(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ForumPost>>, ApiError> {
    identity.require_self_or_admin(id)?;
    Ok(Json(ForumPost::list_by_user(&state.db, id).await?))
}

#[instrument(skip(state, identity))]
pub async fn get_user_appointments(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Appointment>>, ApiError> {
    identity.require_self_or_admin(id)?;
    Ok(Json(Appointment::list_by_user(&state.db, id).await?))
}

#[instrument(skip(state, identity))]
pub async fn get_user_likes(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ForumLike>>, ApiError> {
    identity.require_self_or_admin(id)?;
    Ok(Json(ForumLike::list_by_user(&state.db, id).await?))
}

#[instrument(skip(state, identity))]
pub async fn get_user_comments(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ForumComment>>, ApiError> {
    identity.require_self_or_admin(id)?;
    Ok(Json(ForumComment::list_by_user(&state.db, id).await?))
}
