//! In-process store used by unit and router tests in place of Postgres.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    auth::{repo_types::User, UserRepo},
    db::{StoreError, StoreResult},
    pagination::{clamp_limit, Cursor, Page},
    projects::{
        repo_types::{Project, ProjectPatch},
        ProjectRepo,
    },
    tasks::{
        repo_types::{Task, TaskFilter, TaskPatch},
        TaskRepo,
    },
};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    projects: HashMap<Uuid, Project>,
    tasks: HashMap<Uuid, Task>,
}

impl Tables {
    fn owns_project(&self, owner_id: Uuid, project_id: Uuid) -> bool {
        self.projects
            .get(&project_id)
            .is_some_and(|p| p.owner_id == owner_id)
    }

    fn owned_task_mut(&mut self, owner_id: Uuid, id: Uuid) -> Option<&mut Task> {
        let project_id = self.tasks.get(&id)?.project_id;
        if !self.owns_project(owner_id, project_id) {
            return None;
        }
        self.tasks.get_mut(&id)
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
    frozen_at: Option<OffsetDateTime>,
}

impl MemoryStore {
    /// Every row created by this store gets the same `created_at`.
    pub fn frozen_at(ts: OffsetDateTime) -> Self {
        Self {
            tables: Arc::default(),
            frozen_at: Some(ts),
        }
    }

    fn now(&self) -> OffsetDateTime {
        self.frozen_at.unwrap_or_else(OffsetDateTime::now_utc)
    }
}

/// True when a row at `key` comes strictly after `cursor` in
/// `created_at DESC, id DESC` order.
fn after(cursor: &Cursor, key: &Cursor) -> bool {
    (key.created_at, key.id) < (cursor.created_at, cursor.id)
}

fn page_of<T, F>(mut rows: Vec<T>, limit: i64, cursor: Option<Cursor>, key: F) -> Page<T>
where
    F: Fn(&T) -> Cursor,
{
    if let Some(c) = cursor {
        rows.retain(|r| after(&c, &key(r)));
    }
    rows.sort_by(|a, b| {
        let (a, b) = (key(a), key(b));
        (b.created_at, b.id).cmp(&(a.created_at, a.id))
    });
    rows.truncate(clamp_limit(limit) as usize + 1);
    Page::from_overfetch(rows, limit, key)
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn create(&self, email: &str, password_hash: &str) -> StoreResult<User> {
        let mut t = self.tables.write().await;
        if t.users.values().any(|u| u.email == email) {
            return Err(StoreError::UniqueViolation("users_email_key".into()));
        }
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_owned(),
            password_hash: password_hash.to_owned(),
            created_at: self.now(),
        };
        t.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let t = self.tables.read().await;
        Ok(t.users.values().find(|u| u.email == email).cloned())
    }
}

#[async_trait]
impl ProjectRepo for MemoryStore {
    async fn create(&self, owner_id: Uuid, name: &str) -> StoreResult<Project> {
        let now = self.now();
        let project = Project {
            id: Uuid::new_v4(),
            owner_id,
            name: name.to_owned(),
            created_at: now,
            updated_at: now,
        };
        self.tables
            .write()
            .await
            .projects
            .insert(project.id, project.clone());
        Ok(project)
    }

    async fn list(
        &self,
        owner_id: Uuid,
        limit: i64,
        cursor: Option<Cursor>,
    ) -> StoreResult<Page<Project>> {
        let t = self.tables.read().await;
        let rows = t
            .projects
            .values()
            .filter(|p| p.owner_id == owner_id)
            .cloned()
            .collect();
        Ok(page_of(rows, limit, cursor, Project::cursor))
    }

    async fn get(&self, owner_id: Uuid, id: Uuid) -> StoreResult<Project> {
        let t = self.tables.read().await;
        t.projects
            .get(&id)
            .filter(|p| p.owner_id == owner_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn update(&self, owner_id: Uuid, id: Uuid, patch: ProjectPatch) -> StoreResult<Project> {
        let now = self.now();
        let mut t = self.tables.write().await;
        let project = t
            .projects
            .get_mut(&id)
            .filter(|p| p.owner_id == owner_id)
            .ok_or(StoreError::NotFound)?;
        if let Some(name) = patch.name {
            project.name = name;
        }
        project.updated_at = now;
        Ok(project.clone())
    }

    async fn delete(&self, owner_id: Uuid, id: Uuid) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        if !t.owns_project(owner_id, id) {
            return Err(StoreError::NotFound);
        }
        t.projects.remove(&id);
        t.tasks.retain(|_, task| task.project_id != id);
        Ok(())
    }
}

#[async_trait]
impl TaskRepo for MemoryStore {
    async fn create(&self, owner_id: Uuid, project_id: Uuid, title: &str) -> StoreResult<Task> {
        let now = self.now();
        let mut t = self.tables.write().await;
        if !t.owns_project(owner_id, project_id) {
            return Err(StoreError::NotFound);
        }
        let task = Task {
            id: Uuid::new_v4(),
            project_id,
            title: title.to_owned(),
            completed: false,
            created_at: now,
            updated_at: now,
        };
        t.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn list(
        &self,
        owner_id: Uuid,
        filter: TaskFilter,
        limit: i64,
        cursor: Option<Cursor>,
    ) -> StoreResult<Page<Task>> {
        let t = self.tables.read().await;
        if !t.owns_project(owner_id, filter.project_id) {
            return Ok(Page {
                items: Vec::new(),
                next_cursor: None,
            });
        }
        let rows = t
            .tasks
            .values()
            .filter(|task| task.project_id == filter.project_id)
            .filter(|task| filter.completed.map_or(true, |c| task.completed == c))
            .cloned()
            .collect();
        Ok(page_of(rows, limit, cursor, Task::cursor))
    }

    async fn get(&self, owner_id: Uuid, id: Uuid) -> StoreResult<Task> {
        let t = self.tables.read().await;
        let task = t.tasks.get(&id).ok_or(StoreError::NotFound)?;
        if !t.owns_project(owner_id, task.project_id) {
            return Err(StoreError::NotFound);
        }
        Ok(task.clone())
    }

    async fn update(&self, owner_id: Uuid, id: Uuid, patch: TaskPatch) -> StoreResult<Task> {
        let now = self.now();
        let mut t = self.tables.write().await;
        let task = t.owned_task_mut(owner_id, id).ok_or(StoreError::NotFound)?;
        if let Some(title) = patch.title {
            task.title = title;
        }
        if let Some(completed) = patch.completed {
            task.completed = completed;
        }
        task.updated_at = now;
        Ok(task.clone())
    }

    async fn delete(&self, owner_id: Uuid, id: Uuid) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        t.owned_task_mut(owner_id, id).ok_or(StoreError::NotFound)?;
        t.tasks.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn after_is_strict_and_breaks_ties_on_id() {
        let ts = datetime!(2024-01-01 00:00 UTC);
        let cursor = Cursor::new(ts, Uuid::from_u128(2));
        assert!(after(&cursor, &Cursor::new(ts, Uuid::from_u128(1))));
        assert!(!after(&cursor, &Cursor::new(ts, Uuid::from_u128(2))));
        assert!(!after(
            &cursor,
            &Cursor::new(ts + time::Duration::seconds(1), Uuid::from_u128(1))
        ));
        assert!(after(
            &cursor,
            &Cursor::new(ts - time::Duration::seconds(1), Uuid::from_u128(u128::MAX))
        ));
    }

    #[tokio::test]
    async fn equal_timestamps_page_by_id_without_gaps() {
        let store = MemoryStore::frozen_at(datetime!(2024-01-01 00:00 UTC));
        let owner = Uuid::new_v4();
        let mut ids = Vec::new();
        for i in 0..5 {
            ids.push(ProjectRepo::create(&store, owner, &format!("p{i}")).await.unwrap().id);
        }

        let mut seen = Vec::new();
        let mut cursor = None;
        loop {
            let page = ProjectRepo::list(&store, owner, 2, cursor).await.unwrap();
            seen.extend(page.items.iter().map(|p| p.id));
            match page.next_cursor {
                Some(c) => cursor = Some(c),
                None => break,
            }
        }

        ids.sort_by(|a, b| b.cmp(a));
        assert_eq!(seen, ids);
    }

    #[tokio::test]
    async fn task_ownership_follows_the_project() {
        let store = MemoryStore::default();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let p = ProjectRepo::create(&store, a, "A").await.unwrap();
        let task = TaskRepo::create(&store, a, p.id, "t").await.unwrap();

        assert!(matches!(
            TaskRepo::get(&store, b, task.id).await,
            Err(StoreError::NotFound)
        ));
        assert!(matches!(
            TaskRepo::create(&store, b, p.id, "x").await,
            Err(StoreError::NotFound)
        ));

        ProjectRepo::delete(&store, a, p.id).await.unwrap();
        assert!(matches!(
            TaskRepo::get(&store, a, task.id).await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn duplicate_email_is_a_unique_violation() {
        let store = MemoryStore::default();
        UserRepo::create(&store, "x@example.com", "h").await.unwrap();
        assert!(matches!(
            UserRepo::create(&store, "x@example.com", "h").await,
            Err(StoreError::UniqueViolation(_))
        ));
    }
}
