use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    repo::TaskRepo,
    repo_types::{Task, TaskFilter, TaskPatch},
};
use crate::{
    error::{AppError, AppResult},
    pagination::{clamp_limit, Cursor, Page},
};

const NOT_FOUND: &str = "task not found";
const PROJECT_NOT_FOUND: &str = "project not found";

fn clean_title(raw: &str) -> AppResult<String> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(AppError::field("title", "is required"));
    }
    Ok(title.to_owned())
}

#[derive(Clone)]
pub struct TaskService {
    repo: Arc<dyn TaskRepo>,
}

impl TaskService {
    pub fn new(repo: Arc<dyn TaskRepo>) -> Self {
        Self { repo }
    }

    /// Fails with "project not found" when the project is missing or owned by
    /// someone else.
    #[instrument(skip(self))]
    pub async fn create(&self, actor: Uuid, project_id: Uuid, title: &str) -> AppResult<Task> {
        let title = clean_title(title)?;
        let task = self
            .repo
            .create(actor, project_id, &title)
            .await
            .map_err(|e| AppError::from_store(e, PROJECT_NOT_FOUND))?;
        info!(task_id = %task.id, project_id = %project_id, "task created");
        Ok(task)
    }

    /// Listing a project the actor does not own yields an empty page.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        actor: Uuid,
        filter: TaskFilter,
        limit: i64,
        cursor: Option<Cursor>,
    ) -> AppResult<Page<Task>> {
        Ok(self
            .repo
            .list(actor, filter, clamp_limit(limit), cursor)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, actor: Uuid, id: Uuid) -> AppResult<Task> {
        self.repo
            .get(actor, id)
            .await
            .map_err(|e| AppError::from_store(e, NOT_FOUND))
    }

    #[instrument(skip(self))]
    pub async fn update(
        &self,
        actor: Uuid,
        id: Uuid,
        title: Option<&str>,
        completed: Option<bool>,
    ) -> AppResult<Task> {
        if title.is_none() && completed.is_none() {
            return Err(AppError::field(
                "body",
                "must include at least one of: title, completed",
            ));
        }
        let patch = TaskPatch {
            title: title.map(clean_title).transpose()?,
            completed,
        };
        self.repo
            .update(actor, id, patch)
            .await
            .map_err(|e| AppError::from_store(e, NOT_FOUND))
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, actor: Uuid, id: Uuid) -> AppResult<()> {
        self.repo
            .delete(actor, id)
            .await
            .map_err(|e| AppError::from_store(e, NOT_FOUND))?;
        info!(task_id = %id, "task deleted");
        Ok(())
    }
}
