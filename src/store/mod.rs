//! Persistence ports for users and tasks.
//!
//! Services only talk to the `UserStore` and `TaskStore` traits. Two
//! implementations exist: `postgres::PgStore` for production and
//! `memory::MemoryStore` for tests and database-free runs.
//!
//! Every read that serves an owner filters out soft-deleted rows explicitly;
//! `find_task_even_if_deleted` is the only lookup that sees them.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{NewTask, NewUser, Page, Task, TaskStatus, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

lazy_static! {
    // "field" or "field,asc" / "field,desc"
    static ref SORT_REGEX: Regex = Regex::new(r"^\s*([A-Za-z]+)\s*(?:,\s*([A-Za-z]+)\s*)?$").unwrap();
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a user. Fails with `Conflict` if the email is already taken.
    async fn insert_user(&self, user: NewUser) -> Result<User, AppError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn exists_by_email(&self, email: &str) -> Result<bool, AppError>;
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn insert_task(&self, task: NewTask) -> Result<Task, AppError>;
    /// Looks up a task that has not been soft-deleted, regardless of owner.
    async fn find_task(&self, id: Uuid) -> Result<Option<Task>, AppError>;
    /// Looks up a task whether or not it has been soft-deleted.
    async fn find_task_even_if_deleted(&self, id: Uuid) -> Result<Option<Task>, AppError>;
    /// Visible tasks of one owner, optionally filtered by status.
    async fn list_tasks(
        &self,
        owner_id: i32,
        status: Option<TaskStatus>,
        page: &PageRequest,
    ) -> Result<Page<Task>, AppError>;
    /// Writes the mutable fields of `task` back and refreshes `updated_at`.
    /// Fails with `NotFound` if the row no longer exists.
    async fn save_task(&self, task: &Task) -> Result<Task, AppError>;
    /// Hard-deletes soft-deleted tasks whose `deleted_at` is before `cutoff`.
    async fn purge_deleted_before(&self, cutoff: DateTime<Utc>) -> Result<u64, AppError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    UpdatedAt,
    Title,
    Status,
}

impl SortField {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "createdAt" => Some(SortField::CreatedAt),
            "updatedAt" => Some(SortField::UpdatedAt),
            "title" => Some(SortField::Title),
            "status" => Some(SortField::Status),
            _ => None,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "t.created_at",
            SortField::UpdatedAt => "t.updated_at",
            SortField::Title => "t.title",
            SortField::Status => "t.status",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Which slice of a listing to return and in which order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
    pub sort: SortField,
    pub direction: SortDirection,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
            sort: SortField::CreatedAt,
            direction: SortDirection::Desc,
        }
    }
}

impl PageRequest {
    /// Builds a page request from raw query parameters, applying defaults.
    ///
    /// Absent or blank values fall back to the defaults. A size below 1 uses
    /// the default size and a size above `MAX_PAGE_SIZE` is clamped to it.
    pub fn from_params(
        page: Option<&str>,
        size: Option<&str>,
        sort: Option<&str>,
    ) -> Result<Self, AppError> {
        let mut request = PageRequest::default();
        let mut errors = BTreeMap::new();

        if let Some(page) = non_blank(page) {
            match page.parse::<u32>() {
                Ok(page) => request.page = page,
                Err(_) => {
                    errors.insert(
                        "page".to_string(),
                        "Page must be a non-negative integer".to_string(),
                    );
                }
            }
        }
        if let Some(size) = non_blank(size) {
            match size.parse::<i64>() {
                Ok(size) if size < 1 => {}
                Ok(size) => request.size = size.min(i64::from(MAX_PAGE_SIZE)) as u32,
                Err(_) => {
                    errors.insert("size".to_string(), "Page size must be an integer".to_string());
                }
            }
        }
        if let Some(sort) = non_blank(sort) {
            match parse_sort(sort) {
                Some((field, direction)) => {
                    request.sort = field;
                    request.direction = direction;
                }
                None => {
                    errors.insert(
                        "sort".to_string(),
                        format!("Unsupported sort expression: {}", sort),
                    );
                }
            }
        }

        if errors.is_empty() {
            Ok(request)
        } else {
            Err(AppError::ValidationFailed(errors))
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_sort(expr: &str) -> Option<(SortField, SortDirection)> {
    let caps = SORT_REGEX.captures(expr)?;
    let field = SortField::parse(caps.get(1)?.as_str())?;
    let direction = match caps.get(2).map(|m| m.as_str().to_ascii_lowercase()) {
        None => SortDirection::Asc,
        Some(dir) if dir == "asc" => SortDirection::Asc,
        Some(dir) if dir == "desc" => SortDirection::Desc,
        Some(_) => return None,
    };
    Some((field, direction))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_page_request() {
        let request = PageRequest::from_params(None, None, None).unwrap();
        assert_eq!(request, PageRequest::default());
        assert_eq!(request.size, 10);
        assert_eq!(request.sort, SortField::CreatedAt);
        assert_eq!(request.direction, SortDirection::Desc);
    }

    #[test]
    fn test_sort_expressions() {
        let request =
            PageRequest::from_params(Some("2"), Some("5"), Some("title,DESC")).unwrap();
        assert_eq!(request.sort, SortField::Title);
        assert_eq!(request.direction, SortDirection::Desc);
        assert_eq!(request.offset(), 10);

        let request = PageRequest::from_params(None, None, Some("updatedAt")).unwrap();
        assert_eq!(request.sort, SortField::UpdatedAt);
        assert_eq!(request.direction, SortDirection::Asc);

        assert!(PageRequest::from_params(None, None, Some("password,asc")).is_err());
        assert!(PageRequest::from_params(None, None, Some("title,sideways")).is_err());
    }

    #[test]
    fn test_blank_params_use_defaults() {
        let request = PageRequest::from_params(Some(""), Some("  "), Some("")).unwrap();
        assert_eq!(request, PageRequest::default());
    }

    #[test]
    fn test_page_size_is_clamped() {
        let size = |raw: &str| PageRequest::from_params(None, Some(raw), None).unwrap().size;
        assert_eq!(size("0"), DEFAULT_PAGE_SIZE);
        assert_eq!(size("-3"), DEFAULT_PAGE_SIZE);
        assert_eq!(size("100"), 100);
        assert_eq!(size("101"), MAX_PAGE_SIZE);
        assert_eq!(size("5000000000"), MAX_PAGE_SIZE);
    }

    #[test]
    fn test_non_numeric_params_are_rejected() {
        match PageRequest::from_params(Some("first"), Some("ten"), None) {
            Err(AppError::ValidationFailed(fields)) => {
                assert!(fields.contains_key("page"));
                assert!(fields.contains_key("size"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(PageRequest::from_params(Some("-1"), None, None).is_err());
    }
}
