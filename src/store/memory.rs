use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{PageRequest, SortDirection, SortField, TaskStore, UserStore};
use crate::error::AppError;
use crate::models::{NewTask, NewUser, Page, Task, TaskStatus, User};

#[derive(Default)]
struct State {
    next_user_id: i32,
    users: HashMap<i32, User>,
    next_seq: u64,
    /// Tasks keyed by id, with their insertion sequence for stable ordering.
    tasks: HashMap<Uuid, (u64, Task)>,
}

/// Process-local store. All data lives behind a single lock, so every
/// operation is atomic with respect to every other one.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of task rows, deleted or not.
    pub async fn task_count(&self) -> usize {
        self.state.read().await.tasks.len()
    }

    pub async fn user_count(&self) -> usize {
        self.state.read().await.users.len()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut state = self.state.write().await;
        if state.users.values().any(|u| u.email == user.email) {
            return Err(AppError::Conflict(format!(
                "Email '{}' is already taken",
                user.email
            )));
        }
        state.next_user_id += 1;
        let stored = User {
            id: state.next_user_id,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        state.users.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, AppError> {
        let state = self.state.read().await;
        Ok(state.users.values().any(|u| u.email == email))
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn insert_task(&self, task: NewTask) -> Result<Task, AppError> {
        let mut state = self.state.write().await;
        let owner_email = state
            .users
            .get(&task.owner_id)
            .map(|u| u.email.clone())
            .ok_or_else(|| {
                AppError::DatabaseError(format!("owner {} does not exist", task.owner_id))
            })?;

        let now = Utc::now();
        let stored = Task {
            id: Uuid::new_v4(),
            title: task.title,
            description: task.description,
            status: task.status,
            owner_id: task.owner_id,
            owner_email,
            created_at: now,
            updated_at: now,
            is_deleted: false,
            deleted_at: None,
        };
        state.next_seq += 1;
        let seq = state.next_seq;
        state.tasks.insert(stored.id, (seq, stored.clone()));
        Ok(stored)
    }

    async fn find_task(&self, id: Uuid) -> Result<Option<Task>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .tasks
            .get(&id)
            .map(|(_, t)| t)
            .filter(|t| !t.is_deleted)
            .cloned())
    }

    async fn find_task_even_if_deleted(&self, id: Uuid) -> Result<Option<Task>, AppError> {
        let state = self.state.read().await;
        Ok(state.tasks.get(&id).map(|(_, t)| t.clone()))
    }

    async fn list_tasks(
        &self,
        owner_id: i32,
        status: Option<TaskStatus>,
        page: &PageRequest,
    ) -> Result<Page<Task>, AppError> {
        let state = self.state.read().await;
        let mut matching: Vec<&(u64, Task)> = state
            .tasks
            .values()
            .filter(|(_, t)| t.owner_id == owner_id && !t.is_deleted)
            .filter(|(_, t)| status.map_or(true, |s| t.status == s))
            .collect();

        matching.sort_by(|(seq_a, a), (seq_b, b)| {
            let ordering = compare_by(page.sort, a, b).then(seq_a.cmp(seq_b));
            match page.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });

        let total = matching.len() as u64;
        let content = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.size as usize)
            .map(|(_, t)| t.clone())
            .collect();
        Ok(Page::new(content, page.page, page.size, total))
    }

    async fn save_task(&self, task: &Task) -> Result<Task, AppError> {
        let mut state = self.state.write().await;
        let (_, stored) = state
            .tasks
            .get_mut(&task.id)
            .ok_or_else(|| AppError::task_not_found(task.id))?;
        stored.title = task.title.clone();
        stored.description = task.description.clone();
        stored.status = task.status;
        stored.is_deleted = task.is_deleted;
        stored.deleted_at = task.deleted_at;
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn purge_deleted_before(&self, cutoff: DateTime<Utc>) -> Result<u64, AppError> {
        let mut state = self.state.write().await;
        let before = state.tasks.len();
        state.tasks.retain(|_, (_, t)| {
            !(t.is_deleted && t.deleted_at.map_or(false, |at| at < cutoff))
        });
        Ok((before - state.tasks.len()) as u64)
    }
}

fn compare_by(field: SortField, a: &Task, b: &Task) -> Ordering {
    match field {
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        SortField::Title => a.title.cmp(&b.title),
        SortField::Status => status_rank(a.status).cmp(&status_rank(b.status)),
    }
}

// Matches the declaration order of the PostgreSQL enum.
fn status_rank(status: TaskStatus) -> u8 {
    match status {
        TaskStatus::ToDo => 0,
        TaskStatus::InProgress => 1,
        TaskStatus::Done => 2,
    }
}
