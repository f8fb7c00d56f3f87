use crate::domain::error::DomainError;
use crate::domain::repository::TaskRepository;
use crate::domain::task::{CreateTask, Task, TaskFilter, TaskStatus, UpdateTask};
use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

pub struct TaskService<R: TaskRepository> {
    repository: Arc<R>,
}

impl<R: TaskRepository> TaskService<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    #[instrument(skip(self, req), fields(owner = owner))]
    pub async fn create_task(&self, owner: &str, req: CreateTask) -> Result<Task> {
        let title = req.validated_title()?;
        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4().to_string(),
            title,
            description: req.description,
            status: TaskStatus::default(),
            priority: req.priority.unwrap_or_default(),
            due_date: req.due_date,
            owner: owner.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.repository.save(task.clone()).await?;
        info!(task_id = %task.id, "Task created");
        Ok(task)
    }

    #[instrument(skip(self, filter), fields(owner = owner))]
    pub async fn list_tasks(&self, owner: &str, filter: &TaskFilter) -> Result<Vec<Task>> {
        let tasks = self.repository.find_by_owner(owner, filter).await?;
        debug!(count = tasks.len(), "Tasks listed");
        Ok(tasks)
    }

    /// Loads a task on behalf of `requester`: NotFound if it does not exist,
    /// Forbidden if someone else owns it.
    #[instrument(skip(self), fields(task_id = task_id, requester = requester))]
    pub async fn owned_task(&self, task_id: &str, requester: &str) -> Result<Task> {
        let task = self
            .repository
            .find_by_id(task_id)
            .await?
            .ok_or_else(|| DomainError::NotFound("Task not found".to_string()))?;

        if !task.is_owned_by(requester) {
            warn!(owner = %task.owner, "Task access denied to non-owner");
            return Err(
                DomainError::Forbidden("Not authorized to access this task".to_string()).into(),
            );
        }
        Ok(task)
    }

    pub async fn get_task(&self, task_id: &str, requester: &str) -> Result<Task> {
        self.owned_task(task_id, requester).await
    }

    #[instrument(skip(self, update), fields(task_id = task_id))]
    pub async fn update_task(
        &self,
        task_id: &str,
        requester: &str,
        update: UpdateTask,
    ) -> Result<Task> {
        let mut task = self.owned_task(task_id, requester).await?;
        task.apply_update(update);
        if !self.repository.update(task.clone()).await? {
            warn!("Task deleted while the update was in flight");
            return Err(DomainError::NotFound("Task not found".to_string()).into());
        }
        info!(task_id = %task.id, status = %task.status, "Task updated");
        Ok(task)
    }

    #[instrument(skip(self), fields(task_id = task_id))]
    pub async fn delete_task(&self, task_id: &str, requester: &str) -> Result<()> {
        self.owned_task(task_id, requester).await?;
        if !self.repository.delete(task_id).await? {
            // Removed between the ownership check and now.
            return Err(DomainError::NotFound("Task not found".to_string()).into());
        }
        info!(task_id = task_id, "Task deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::task_repository::InMemoryTaskRepository;
    use crate::domain::task::TaskPriority;

    fn service() -> TaskService<InMemoryTaskRepository> {
        TaskService::new(Arc::new(InMemoryTaskRepository::new()))
    }

    fn create(title: &str) -> CreateTask {
        CreateTask {
            title: title.to_string(),
            ..Default::default()
        }
    }

    fn domain_error(err: &anyhow::Error) -> &DomainError {
        err.downcast_ref::<DomainError>().unwrap()
    }

    #[tokio::test]
    async fn test_create_task_applies_defaults() {
        let service = service();
        let task = service.create_task("alice", create("Buy milk")).await.unwrap();

        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.priority, TaskPriority::Medium);
        assert_eq!(task.owner, "alice");
    }

    #[tokio::test]
    async fn test_create_task_without_title_fails() {
        let service = service();
        let err = service.create_task("alice", create(" ")).await.unwrap_err();
        assert!(matches!(domain_error(&err), DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn test_non_owner_is_forbidden_for_read_update_delete() {
        let service = service();
        let task = service.create_task("alice", create("Private")).await.unwrap();

        let err = service.get_task(&task.id, "bob").await.unwrap_err();
        assert!(matches!(domain_error(&err), DomainError::Forbidden(_)));

        let err = service
            .update_task(&task.id, "bob", UpdateTask::default())
            .await
            .unwrap_err();
        assert!(matches!(domain_error(&err), DomainError::Forbidden(_)));

        let err = service.delete_task(&task.id, "bob").await.unwrap_err();
        assert!(matches!(domain_error(&err), DomainError::Forbidden(_)));

        // Still there for the owner
        assert!(service.get_task(&task.id, "alice").await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_then_get_is_not_found() {
        let service = service();
        let task = service.create_task("alice", create("Temp")).await.unwrap();

        service.delete_task(&task.id, "alice").await.unwrap();

        let err = service.get_task(&task.id, "alice").await.unwrap_err();
        assert!(matches!(domain_error(&err), DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_wins_over_in_flight_update() {
        let repo = Arc::new(InMemoryTaskRepository::new());
        let service = TaskService::new(repo.clone());
        let task = service.create_task("alice", create("Racy")).await.unwrap();

        // An update that loaded the task before the delete landed
        let mut stale = service.owned_task(&task.id, "alice").await.unwrap();
        service.delete_task(&task.id, "alice").await.unwrap();
        stale.apply_update(UpdateTask {
            status: Some(TaskStatus::Completed),
            ..Default::default()
        });
        assert!(!repo.update(stale).await.unwrap());

        let err = service.get_task(&task.id, "alice").await.unwrap_err();
        assert!(matches!(domain_error(&err), DomainError::NotFound(_)));
        let tasks = service
            .list_tasks("alice", &TaskFilter::default())
            .await
            .unwrap();
        assert!(tasks.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_update_and_delete_leave_task_deleted() {
        let service = Arc::new(service());

        for round in 0..20 {
            let task = service
                .create_task("alice", create(&format!("Round {}", round)))
                .await
                .unwrap();

            let updater = {
                let service = service.clone();
                let id = task.id.clone();
                tokio::spawn(async move {
                    let update = UpdateTask {
                        title: Some("Edited".to_string()),
                        ..Default::default()
                    };
                    service.update_task(&id, "alice", update).await
                })
            };
            let deleter = {
                let service = service.clone();
                let id = task.id.clone();
                tokio::spawn(async move { service.delete_task(&id, "alice").await })
            };

            let updated = updater.await.unwrap();
            deleter.await.unwrap().unwrap();
            if let Err(err) = updated {
                assert!(matches!(domain_error(&err), DomainError::NotFound(_)));
            }

            let err = service.get_task(&task.id, "alice").await.unwrap_err();
            assert!(matches!(domain_error(&err), DomainError::NotFound(_)));
        }
    }

    #[tokio::test]
    async fn test_update_task_changes_fields() {
        let service = service();
        let task = service.create_task("alice", create("Draft")).await.unwrap();
        let update = UpdateTask {
            status: Some(TaskStatus::Completed),
            ..Default::default()
        };

        let updated = service.update_task(&task.id, "alice", update).await.unwrap();
        assert_eq!(updated.status, TaskStatus::Completed);
        assert_eq!(updated.created_at, task.created_at);

        let reloaded = service.get_task(&task.id, "alice").await.unwrap();
        assert_eq!(reloaded.status, TaskStatus::Completed);
    }

    #[tokio::test]
    async fn test_list_tasks_only_returns_own_tasks() {
        let service = service();
        service.create_task("alice", create("A1")).await.unwrap();
        service.create_task("bob", create("B1")).await.unwrap();
        service.create_task("alice", create("A2")).await.unwrap();

        let tasks = service
            .list_tasks("alice", &TaskFilter::default())
            .await
            .unwrap();
        let titles: Vec<&str> = tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["A2", "A1"]);
    }
}
