use crate::domain::task::{Task, TaskFilter};
use crate::domain::user::User;
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Adds a new user; fails with `DomainError::DuplicateResource` when the
    /// email is already taken. The check and the insert are one step.
    async fn insert_user(&self, user: User) -> Result<()>;
    async fn save_user(&self, user: User) -> Result<()>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>>;
}

#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn save(&self, task: Task) -> Result<()>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Task>>;
    /// Replaces a stored task. Returns `false`, storing nothing, when it no longer exists.
    async fn update(&self, task: Task) -> Result<bool>;
    /// Returns `true` when a task was removed.
    async fn delete(&self, id: &str) -> Result<bool>;
    /// Tasks owned by `owner` matching `filter`, newest first.
    async fn find_by_owner(&self, owner: &str, filter: &TaskFilter) -> Result<Vec<Task>>;
}
