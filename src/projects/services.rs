use std::sync::Arc;

use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::{
    repo::ProjectRepo,
    repo_types::{Project, ProjectPatch},
};
use crate::{
    error::{AppError, AppResult},
    pagination::{clamp_limit, Cursor, Page},
};

const NOT_FOUND: &str = "project not found";

/// Trims a name and rejects it if nothing is left.
pub(crate) fn clean_name(raw: &str) -> AppResult<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AppError::field("name", "is required"));
    }
    Ok(name.to_owned())
}

#[derive(Clone)]
pub struct ProjectService {
    repo: Arc<dyn ProjectRepo>,
}

impl ProjectService {
    pub fn new(repo: Arc<dyn ProjectRepo>) -> Self {
        Self { repo }
    }

    #[instrument(skip(self))]
    pub async fn create(&self, actor: Uuid, name: &str) -> AppResult<Project> {
        let name = clean_name(name)?;
        let project = self.repo.create(actor, &name).await?;
        info!(project_id = %project.id, "project created");
        Ok(project)
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        actor: Uuid,
        limit: i64,
        cursor: Option<Cursor>,
    ) -> AppResult<Page<Project>> {
        Ok(self.repo.list(actor, clamp_limit(limit), cursor).await?)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, actor: Uuid, id: Uuid) -> AppResult<Project> {
        self.repo.get(actor, id).await.map_err(|e| {
            debug!(error = %e, "project lookup failed");
            AppError::from_store(e, NOT_FOUND)
        })
    }

    /// `name` is the only mutable field, so it must be supplied.
    #[instrument(skip(self))]
    pub async fn update(&self, actor: Uuid, id: Uuid, name: Option<&str>) -> AppResult<Project> {
        let name = match name {
            Some(raw) => clean_name(raw)?,
            None => return Err(AppError::field("name", "is required")),
        };
        let patch = ProjectPatch { name: Some(name) };
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
        info!(project_id = %id, "project deleted");
        Ok(())
    }
}
