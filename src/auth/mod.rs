use crate::state::AppState;
use axum::Router;

mod claims;
pub mod dto;
pub(crate) mod extractors;
pub mod handlers;
pub mod password;
pub mod services;
pub mod session;
pub mod validation;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
