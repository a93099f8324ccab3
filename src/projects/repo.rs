use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{Project, ProjectPatch};
use crate::db::{StoreError, StoreResult};
use crate::pagination::{clamp_limit, Cursor, Page};

/// Every method is scoped to `owner_id`; rows owned by someone else are
/// indistinguishable from rows that do not exist.
#[async_trait]
pub trait ProjectRepo: Send + Sync {
    async fn create(&self, owner_id: Uuid, name: &str) -> StoreResult<Project>;
    async fn list(
        &self,
        owner_id: Uuid,
        limit: i64,
        cursor: Option<Cursor>,
    ) -> StoreResult<Page<Project>>;
    async fn get(&self, owner_id: Uuid, id: Uuid) -> StoreResult<Project>;
    async fn update(&self, owner_id: Uuid, id: Uuid, patch: ProjectPatch) -> StoreResult<Project>;
    async fn delete(&self, owner_id: Uuid, id: Uuid) -> StoreResult<()>;
}

#[derive(Clone)]
pub struct PgProjectRepo {
    db: PgPool,
}

impl PgProjectRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProjectRepo for PgProjectRepo {
    async fn create(&self, owner_id: Uuid, name: &str) -> StoreResult<Project> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (id, user_id, name)
            VALUES ($1, $2, $3)
            RETURNING id, user_id AS owner_id, name, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(name)
        .fetch_one(&self.db)
        .await?;
        Ok(project)
    }

    async fn list(
        &self,
        owner_id: Uuid,
        limit: i64,
        cursor: Option<Cursor>,
    ) -> StoreResult<Page<Project>> {
        let limit = clamp_limit(limit);
        let fetch = limit + 1;

        let rows = match cursor {
            None => {
                sqlx::query_as::<_, Project>(
                    r#"
                    SELECT id, user_id AS owner_id, name, created_at, updated_at
                    FROM projects
                    WHERE user_id = $1
                    ORDER BY created_at DESC, id DESC
                    LIMIT $2
                    "#,
                )
                .bind(owner_id)
                .bind(fetch)
                .fetch_all(&self.db)
                .await?
            }
            Some(c) => {
                sqlx::query_as::<_, Project>(
                    r#"
                    SELECT id, user_id AS owner_id, name, created_at, updated_at
                    FROM projects
                    WHERE user_id = $1
                      AND (created_at, id) < ($2, $3)
                    ORDER BY created_at DESC, id DESC
                    LIMIT $4
                    "#,
                )
                .bind(owner_id)
                .bind(c.created_at)
                .bind(c.id)
                .bind(fetch)
                .fetch_all(&self.db)
                .await?
            }
        };

        Ok(Page::from_overfetch(rows, limit, Project::cursor))
    }

    async fn get(&self, owner_id: Uuid, id: Uuid) -> StoreResult<Project> {
        sqlx::query_as::<_, Project>(
            r#"
            SELECT id, user_id AS owner_id, name, created_at, updated_at
            FROM projects
            WHERE user_id = $1 AND id = $2
            "#,
        )
        .bind(owner_id)
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(StoreError::NotFound)
    }

    async fn update(&self, owner_id: Uuid, id: Uuid, patch: ProjectPatch) -> StoreResult<Project> {
        sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET name = COALESCE($3, name),
                updated_at = now()
            WHERE user_id = $1 AND id = $2
            RETURNING id, user_id AS owner_id, name, created_at, updated_at
            "#,
        )
        .bind(owner_id)
        .bind(id)
        .bind(patch.name)
        .fetch_optional(&self.db)
        .await?
        .ok_or(StoreError::NotFound)
    }

    async fn delete(&self, owner_id: Uuid, id: Uuid) -> StoreResult<()> {
        let res = sqlx::query(
            r#"
            DELETE FROM projects
            WHERE user_id = $1 AND id = $2
            "#,
        )
        .bind(owner_id)
        .bind(id)
        .execute(&self.db)
        .await?;
        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod pg_tests {
    use super::*;
    use crate::auth::{PgUserRepo, UserRepo};

    async fn user(pool: &PgPool, email: &str) -> Uuid {
        PgUserRepo::new(pool.clone())
            .create(email, "hash")
            .await
            .unwrap()
            .id
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs DATABASE_URL"]
    async fn ownership_is_enforced(pool: PgPool) {
        let a = user(&pool, "a@example.com").await;
        let b = user(&pool, "b@example.com").await;
        let repo = PgProjectRepo::new(pool);

        let p = repo.create(a, "Project A").await.unwrap();
        assert_eq!(repo.get(a, p.id).await.unwrap().name, "Project A");

        assert!(matches!(repo.get(b, p.id).await, Err(StoreError::NotFound)));
        let patch = ProjectPatch {
            name: Some("hacked".into()),
        };
        assert!(matches!(
            repo.update(b, p.id, patch).await,
            Err(StoreError::NotFound)
        ));
        assert!(matches!(repo.delete(b, p.id).await, Err(StoreError::NotFound)));
        assert!(repo.list(b, 10, None).await.unwrap().items.is_empty());

        repo.delete(a, p.id).await.unwrap();
        assert!(matches!(repo.get(a, p.id).await, Err(StoreError::NotFound)));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs DATABASE_URL"]
    async fn pages_cover_everything_once(pool: PgPool) {
        let a = user(&pool, "pager@example.com").await;
        let repo = PgProjectRepo::new(pool);
        for i in 0..7 {
            repo.create(a, &format!("p{i}")).await.unwrap();
        }

        let mut seen = Vec::new();
        let mut cursor = None;
        loop {
            let page = repo.list(a, 3, cursor).await.unwrap();
            seen.extend(page.items.iter().map(Project::cursor));
            match page.next_cursor {
                Some(c) => cursor = Some(c),
                None => break,
            }
        }
        assert_eq!(seen.len(), 7);
        for pair in seen.windows(2) {
            assert!(pair[1].created_at < pair[0].created_at
                || (pair[1].created_at == pair[0].created_at && pair[1].id < pair[0].id));
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs DATABASE_URL"]
    async fn update_without_name_keeps_it_and_bumps_updated_at(pool: PgPool) {
        let a = user(&pool, "keep@example.com").await;
        let repo = PgProjectRepo::new(pool);
        let p = repo.create(a, "Keep me").await.unwrap();
        let updated = repo.update(a, p.id, ProjectPatch::default()).await.unwrap();
        assert_eq!(updated.name, "Keep me");
        assert!(updated.updated_at >= p.updated_at);
    }
}
