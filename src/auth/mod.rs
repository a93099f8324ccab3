use crate::state::AppState;
use axum::Router;

mod claims;
mod dto;
pub mod extractors;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod services;

pub use extractors::AuthUser;
pub use jwt::JwtKeys;
pub use repo::{PgUserRepo, UserRepo};
pub use services::AuthService;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
