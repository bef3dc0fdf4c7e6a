use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod handlers;
pub mod policy;
pub mod services;

pub use dto::Role;
pub use policy::Identity;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
