use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{CreateProjectRequest, ListProjectsQuery, UpdateProjectRequest},
    repo_types::Project,
};
use crate::{
    auth::AuthUser,
    error::AppResult,
    extract::{parse_id, parse_limit, ApiJson, ApiQuery},
    pagination,
    response::{Data, PageBody},
    state::AppState,
    tasks,
};

pub fn project_routes() -> Router<AppState> {
    Router::new()
        .route("/projects", post(create_project).get(list_projects))
        .route(
            "/projects/:id",
            get(get_project).patch(update_project).delete(delete_project),
        )
        .route("/projects/:id/tasks", post(tasks::handlers::create_task))
}

#[instrument(skip(state, body))]
pub async fn create_project(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(body): ApiJson<CreateProjectRequest>,
) -> AppResult<(StatusCode, Json<Data<Project>>)> {
    let project = state.projects.create(user_id, &body.name).await?;
    Ok((StatusCode::CREATED, Json(Data::new(project))))
}

#[instrument(skip(state))]
pub async fn list_projects(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiQuery(q): ApiQuery<ListProjectsQuery>,
) -> AppResult<Json<PageBody<Project>>> {
    let limit = parse_limit(q.limit.as_deref())?;
    let cursor = pagination::decode(q.cursor_created_at.as_deref(), q.cursor_id.as_deref())?;
    let page = state.projects.list(user_id, limit, cursor).await?;
    Ok(Json(page.into()))
}

#[instrument(skip(state))]
pub async fn get_project(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<Data<Project>>> {
    let id = parse_id(&id, "project not found")?;
    let project = state.projects.get(user_id, id).await?;
    Ok(Json(Data::new(project)))
}

#[instrument(skip(state, body))]
pub async fn update_project(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateProjectRequest>,
) -> AppResult<Json<Data<Project>>> {
    let id = parse_id(&id, "project not found")?;
    let project = state
        .projects
        .update(user_id, id, body.name.as_deref())
        .await?;
    Ok(Json(Data::new(project)))
}

#[instrument(skip(state))]
pub async fn delete_project(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let id = parse_id(&id, "project not found")?;
    state.projects.delete(user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
