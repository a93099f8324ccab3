use crate::state::AppState;
use axum::Router;

mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod services;

pub use repo::{PgProjectRepo, ProjectRepo};
pub use services::ProjectService;

pub fn router() -> Router<AppState> {
    handlers::project_routes()
}
