//! Ownership-scoped task lifecycle.
//!
//! Every operation takes the resolved owner. A task that exists but belongs
//! to someone else is reported exactly like a task that does not exist, so
//! the API never reveals other users' task ids.

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{
    CreateTaskRequest, NewTask, Page, Task, TaskStatus, UpdateTaskRequest, User,
};
use crate::store::{PageRequest, TaskStore};

#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn TaskStore>,
}

impl TaskService {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }

    /// Creates a task for `owner`. New tasks always start as `TO_DO`.
    pub async fn create_task(
        &self,
        owner: &User,
        request: CreateTaskRequest,
    ) -> Result<Task, AppError> {
        let task = self
            .store
            .insert_task(NewTask {
                title: request.title,
                description: request.description,
                status: TaskStatus::ToDo,
                owner_id: owner.id,
            })
            .await?;
        log::debug!("User {} created task {}", owner.id, task.id);
        Ok(task)
    }

    pub async fn get_task(&self, owner: &User, id: Uuid) -> Result<Task, AppError> {
        self.find_owned(owner, id).await
    }

    pub async fn list_tasks(
        &self,
        owner: &User,
        status: Option<TaskStatus>,
        page: &PageRequest,
    ) -> Result<Page<Task>, AppError> {
        self.store.list_tasks(owner.id, status, page).await
    }

    /// Applies a partial update. Blank strings and a missing status keep the
    /// current values.
    pub async fn update_task(
        &self,
        owner: &User,
        id: Uuid,
        update: UpdateTaskRequest,
    ) -> Result<Task, AppError> {
        let mut task = self.find_owned(owner, id).await?;
        task.apply_update(update);
        self.store.save_task(&task).await
    }

    /// Soft-deletes a task. The row stays until the purge job removes it.
    pub async fn delete_task(&self, owner: &User, id: Uuid) -> Result<(), AppError> {
        let mut task = self.find_owned(owner, id).await?;
        task.soft_delete(Utc::now());
        self.store.save_task(&task).await?;
        log::debug!("User {} soft-deleted task {}", owner.id, id);
        Ok(())
    }

    /// Makes a soft-deleted task visible again. Restoring a task that is not
    /// deleted returns it unchanged.
    pub async fn restore_task(&self, owner: &User, id: Uuid) -> Result<Task, AppError> {
        let mut task = self
            .store
            .find_task_even_if_deleted(id)
            .await?
            .filter(|t| t.is_owned_by(owner.id))
            .ok_or_else(|| AppError::task_not_found(id))?;

        if !task.is_deleted {
            return Ok(task);
        }
        task.restore();
        let task = self.store.save_task(&task).await?;
        log::debug!("User {} restored task {}", owner.id, id);
        Ok(task)
    }

    /// Looks a task up without any owner or visibility check.
    pub async fn find_task_even_if_deleted(&self, id: Uuid) -> Result<Option<Task>, AppError> {
        self.store.find_task_even_if_deleted(id).await
    }

    async fn find_owned(&self, owner: &User, id: Uuid) -> Result<Task, AppError> {
        self.store
            .find_task(id)
            .await?
            .filter(|t| t.is_owned_by(owner.id))
            .ok_or_else(|| AppError::task_not_found(id))
    }
}
