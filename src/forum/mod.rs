use crate::state::AppState;
use axum::Router;

pub mod comments;
pub mod likes;
pub mod posts;
pub mod repo;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(posts::read_routes())
        .merge(posts::write_routes())
        .merge(comments::comment_routes())
        .merge(likes::like_routes())
}
