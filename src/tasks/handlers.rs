use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{CreateTaskRequest, ListTasksQuery, UpdateTaskRequest},
    repo_types::{Task, TaskFilter},
};
use crate::{
    auth::AuthUser,
    error::{AppError, AppResult},
    extract::{parse_bool, parse_id, parse_limit, ApiJson, ApiQuery},
    pagination,
    response::{Data, PageBody},
    state::AppState,
};

pub fn task_routes() -> Router<AppState> {
    Router::new().route("/tasks", get(list_tasks)).route(
        "/tasks/:id",
        get(get_task).patch(update_task).delete(delete_task),
    )
}

/// Mounted as `POST /projects/:id/tasks`.
#[instrument(skip(state, body))]
pub async fn create_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(project_id): Path<String>,
    ApiJson(body): ApiJson<CreateTaskRequest>,
) -> AppResult<(StatusCode, Json<Data<Task>>)> {
    let project_id = parse_id(&project_id, "project not found")?;
    let task = state.tasks.create(user_id, project_id, &body.title).await?;
    Ok((StatusCode::CREATED, Json(Data::new(task))))
}

fn parse_project_id(raw: Option<&str>) -> AppResult<Uuid> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Err(AppError::field("projectId", "is required")),
        Some(v) => Uuid::parse_str(v).map_err(|_| AppError::field("projectId", "must be a valid id")),
    }
}

#[instrument(skip(state))]
pub async fn list_tasks(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiQuery(q): ApiQuery<ListTasksQuery>,
) -> AppResult<Json<PageBody<Task>>> {
    let filter = TaskFilter {
        project_id: parse_project_id(q.project_id.as_deref())?,
        completed: parse_bool("completed", q.completed.as_deref())?,
    };
    let limit = parse_limit(q.limit.as_deref())?;
    let cursor = pagination::decode(q.cursor_created_at.as_deref(), q.cursor_id.as_deref())?;
    let page = state.tasks.list(user_id, filter, limit, cursor).await?;
    Ok(Json(page.into()))
}

#[instrument(skip(state))]
pub async fn get_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<Data<Task>>> {
    let id = parse_id(&id, "task not found")?;
    let task = state.tasks.get(user_id, id).await?;
    Ok(Json(Data::new(task)))
}

#[instrument(skip(state, body))]
pub async fn update_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateTaskRequest>,
) -> AppResult<Json<Data<Task>>> {
    let id = parse_id(&id, "task not found")?;
    let task = state
        .tasks
        .update(user_id, id, body.title.as_deref(), body.completed)
        .await?;
    Ok(Json(Data::new(task)))
}

#[instrument(skip(state))]
pub async fn delete_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let id = parse_id(&id, "task not found")?;
    state.tasks.delete(user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
