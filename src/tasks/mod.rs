use crate::state::AppState;
use axum::Router;

mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod services;

pub use repo::{PgTaskRepo, TaskRepo};
pub use services::TaskService;

/// Task creation lives under `/projects/:id/tasks` in the projects router.
pub fn router() -> Router<AppState> {
    handlers::task_routes()
}
