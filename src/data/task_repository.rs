use crate::domain::repository::TaskRepository;
use crate::domain::task::{Task, TaskFilter};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument, trace};

/// Task store. Tasks are kept in insertion order so that tasks created within
/// the same clock tick still list newest-first.
#[derive(Clone)]
pub struct InMemoryTaskRepository {
    storage: Arc<RwLock<Vec<Task>>>,
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl Default for InMemoryTaskRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    #[instrument(skip(self, task), fields(task_id = %task.id, owner = %task.owner))]
    async fn save(&self, task: Task) -> Result<()> {
        let mut storage = self.storage.write().await;
        match storage.iter_mut().find(|t| t.id == task.id) {
            Some(existing) => *existing = task,
            None => storage.push(task),
        }
        debug!("Task saved to memory storage");
        Ok(())
    }

    #[instrument(skip(self), fields(task_id = id))]
    async fn find_by_id(&self, id: &str) -> Result<Option<Task>> {
        let storage = self.storage.read().await;
        let task = storage.iter().find(|t| t.id == id).cloned();
        if task.is_none() {
            trace!("No task with this id");
        }
        Ok(task)
    }

    #[instrument(skip(self, task), fields(task_id = %task.id))]
    async fn update(&self, task: Task) -> Result<bool> {
        let mut storage = self.storage.write().await;
        match storage.iter_mut().find(|t| t.id == task.id) {
            Some(existing) => {
                *existing = task;
                debug!("Task updated in memory storage");
                Ok(true)
            }
            None => {
                trace!("Task is gone, update dropped");
                Ok(false)
            }
        }
    }

    #[instrument(skip(self), fields(task_id = id))]
    async fn delete(&self, id: &str) -> Result<bool> {
        let mut storage = self.storage.write().await;
        let before = storage.len();
        storage.retain(|t| t.id != id);
        let removed = storage.len() < before;
        debug!(removed, "Task delete applied");
        Ok(removed)
    }

    #[instrument(skip(self, filter), fields(owner = owner))]
    async fn find_by_owner(&self, owner: &str, filter: &TaskFilter) -> Result<Vec<Task>> {
        let storage = self.storage.read().await;
        let mut tasks: Vec<Task> = storage
            .iter()
            .rev()
            .filter(|t| t.is_owned_by(owner) && filter.matches(t))
            .cloned()
            .collect();
        // Stable sort keeps reverse insertion order for equal timestamps.
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        debug!(count = tasks.len(), "Tasks listed for owner");
        Ok(tasks)
    }
}
