use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use super::{PageRequest, TaskStore, UserStore};
use crate::error::AppError;
use crate::models::{NewTask, NewUser, Page, Task, TaskStatus, User};

const TASK_COLUMNS: &str = "t.id, t.title, t.description, t.status, t.user_id AS owner_id, \
     u.email AS owner_email, t.created_at, t.updated_at, t.is_deleted, t.deleted_at";

/// PostgreSQL-backed store. Each operation is a single statement, so it is
/// atomic on its own.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a pool and applies the embedded migrations.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to run migrations: {}", e)))?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (name, email, password_hash) VALUES ($1, $2, $3)
             RETURNING id, name, email, password_hash, created_at",
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => {
                AppError::Conflict(format!("Email '{}' is already taken", user.email))
            }
            other => other,
        })
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, password_hash, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, AppError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn insert_task(&self, task: NewTask) -> Result<Task, AppError> {
        let sql = format!(
            "WITH t AS (
                 INSERT INTO tasks (id, title, description, status, user_id)
                 VALUES ($1, $2, $3, $4, $5)
                 RETURNING *
             )
             SELECT {} FROM t JOIN users u ON u.id = t.user_id",
            TASK_COLUMNS
        );
        let created = sqlx::query_as::<_, Task>(&sql)
            .bind(Uuid::new_v4())
            .bind(&task.title)
            .bind(&task.description)
            .bind(task.status)
            .bind(task.owner_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn find_task(&self, id: Uuid) -> Result<Option<Task>, AppError> {
        let sql = format!(
            "SELECT {} FROM tasks t JOIN users u ON u.id = t.user_id
             WHERE t.id = $1 AND t.is_deleted = FALSE",
            TASK_COLUMNS
        );
        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(task)
    }

    async fn find_task_even_if_deleted(&self, id: Uuid) -> Result<Option<Task>, AppError> {
        let sql = format!(
            "SELECT {} FROM tasks t JOIN users u ON u.id = t.user_id WHERE t.id = $1",
            TASK_COLUMNS
        );
        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(task)
    }

    async fn list_tasks(
        &self,
        owner_id: i32,
        status: Option<TaskStatus>,
        page: &PageRequest,
    ) -> Result<Page<Task>, AppError> {
        // Conditions are appended in the same order their values are bound.
        let mut filter = String::from("t.user_id = $1 AND t.is_deleted = FALSE");
        let mut param_count = 2;
        if status.is_some() {
            filter.push_str(&format!(" AND t.status = ${}", param_count));
            param_count += 1;
        }

        let count_sql = format!("SELECT COUNT(*) FROM tasks t WHERE {}", filter);
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql).bind(owner_id);
        if let Some(status) = status {
            count_query = count_query.bind(status);
        }
        let total = count_query.fetch_one(&self.pool).await?;

        let list_sql = format!(
            "SELECT {} FROM tasks t JOIN users u ON u.id = t.user_id
             WHERE {}
             ORDER BY {} {}, t.id {}
             LIMIT ${} OFFSET ${}",
            TASK_COLUMNS,
            filter,
            page.sort.column(),
            page.direction.as_sql(),
            page.direction.as_sql(),
            param_count,
            param_count + 1
        );
        let mut list_query = sqlx::query_as::<_, Task>(&list_sql).bind(owner_id);
        if let Some(status) = status {
            list_query = list_query.bind(status);
        }
        let tasks = list_query
            .bind(i64::from(page.size))
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(tasks, page.page, page.size, total.max(0) as u64))
    }

    async fn save_task(&self, task: &Task) -> Result<Task, AppError> {
        let sql = format!(
            "WITH t AS (
                 UPDATE tasks
                 SET title = $2, description = $3, status = $4,
                     is_deleted = $5, deleted_at = $6, updated_at = NOW()
                 WHERE id = $1 AND user_id = $7
                 RETURNING *
             )
             SELECT {} FROM t JOIN users u ON u.id = t.user_id",
            TASK_COLUMNS
        );
        sqlx::query_as::<_, Task>(&sql)
            .bind(task.id)
            .bind(&task.title)
            .bind(&task.description)
            .bind(task.status)
            .bind(task.is_deleted)
            .bind(task.deleted_at)
            .bind(task.owner_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::task_not_found(task.id))
    }

    async fn purge_deleted_before(&self, cutoff: DateTime<Utc>) -> Result<u64, AppError> {
        let result =
            sqlx::query("DELETE FROM tasks WHERE is_deleted = TRUE AND deleted_at < $1")
                .bind(cutoff)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }
}
