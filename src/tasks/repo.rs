use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::repo_types::{Task, TaskFilter, TaskPatch};
use crate::db::{StoreError, StoreResult};
use crate::pagination::{clamp_limit, Cursor, Page};

/// Task access, always joined through `projects` so the project owner is the
/// only actor who can see or touch a task.
#[async_trait]
pub trait TaskRepo: Send + Sync {
    /// Creates the task only if `project_id` is owned by `owner_id`, in one
    /// statement. Otherwise `StoreError::NotFound`.
    async fn create(&self, owner_id: Uuid, project_id: Uuid, title: &str) -> StoreResult<Task>;
    async fn list(
        &self,
        owner_id: Uuid,
        filter: TaskFilter,
        limit: i64,
        cursor: Option<Cursor>,
    ) -> StoreResult<Page<Task>>;
    async fn get(&self, owner_id: Uuid, id: Uuid) -> StoreResult<Task>;
    async fn update(&self, owner_id: Uuid, id: Uuid, patch: TaskPatch) -> StoreResult<Task>;
    async fn delete(&self, owner_id: Uuid, id: Uuid) -> StoreResult<()>;
}

#[derive(Clone)]
pub struct PgTaskRepo {
    db: PgPool,
}

impl PgTaskRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TaskRepo for PgTaskRepo {
    async fn create(&self, owner_id: Uuid, project_id: Uuid, title: &str) -> StoreResult<Task> {
        sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (id, project_id, title)
            SELECT $1, p.id, $2
            FROM projects p
            WHERE p.id = $3 AND p.user_id = $4
            RETURNING id, project_id, title, completed, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(title)
        .bind(project_id)
        .bind(owner_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(StoreError::NotFound)
    }

    async fn list(
        &self,
        owner_id: Uuid,
        filter: TaskFilter,
        limit: i64,
        cursor: Option<Cursor>,
    ) -> StoreResult<Page<Task>> {
        let limit = clamp_limit(limit);

        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT t.id, t.project_id, t.title, t.completed, t.created_at, t.updated_at \
             FROM tasks t \
             JOIN projects p ON p.id = t.project_id \
             WHERE p.user_id = ",
        );
        qb.push_bind(owner_id);
        qb.push(" AND t.project_id = ").push_bind(filter.project_id);

        if let Some(completed) = filter.completed {
            qb.push(" AND t.completed = ").push_bind(completed);
        }

        if let Some(c) = cursor {
            qb.push(" AND (t.created_at, t.id) < (")
                .push_bind(c.created_at)
                .push(", ")
                .push_bind(c.id)
                .push(")");
        }

        qb.push(" ORDER BY t.created_at DESC, t.id DESC LIMIT ")
            .push_bind(limit + 1);

        let rows = qb.build_query_as::<Task>().fetch_all(&self.db).await?;
        Ok(Page::from_overfetch(rows, limit, Task::cursor))
    }

    async fn get(&self, owner_id: Uuid, id: Uuid) -> StoreResult<Task> {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT t.id, t.project_id, t.title, t.completed, t.created_at, t.updated_at
            FROM tasks t
            JOIN projects p ON p.id = t.project_id
            WHERE t.id = $1 AND p.user_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(StoreError::NotFound)
    }

    async fn update(&self, owner_id: Uuid, id: Uuid, patch: TaskPatch) -> StoreResult<Task> {
        sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks t
            SET title = COALESCE($3, t.title),
                completed = COALESCE($4, t.completed),
                updated_at = now()
            FROM projects p
            WHERE p.id = t.project_id
              AND p.user_id = $2
              AND t.id = $1
            RETURNING t.id, t.project_id, t.title, t.completed, t.created_at, t.updated_at
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(patch.title)
        .bind(patch.completed)
        .fetch_optional(&self.db)
        .await?
        .ok_or(StoreError::NotFound)
    }

    async fn delete(&self, owner_id: Uuid, id: Uuid) -> StoreResult<()> {
        let res = sqlx::query(
            r#"
            DELETE FROM tasks t
            USING projects p
            WHERE p.id = t.project_id
              AND p.user_id = $2
              AND t.id = $1
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .execute(&self.db)
        .await?;
        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
