use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::BTreeMap;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;
use crate::models::not_blank;

/// Progress of a task. Any status may move to any other status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    ToDo,
    InProgress,
    Done,
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "TO_DO" => Ok(TaskStatus::ToDo),
            "IN_PROGRESS" => Ok(TaskStatus::InProgress),
            "DONE" => Ok(TaskStatus::Done),
            other => Err(format!(
                "Unknown status '{}', expected one of TO_DO, IN_PROGRESS, DONE",
                other
            )),
        }
    }
}

/// A stored task, joined with the owner's email for responses.
///
/// `is_deleted` tasks are invisible to every owner-facing read; only the
/// bypass lookup and the purge job see them.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub owner_id: i32,
    pub owner_email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Overwrites only the fields that carry a value: blank strings and a
    /// missing status leave the current values in place.
    pub fn apply_update(&mut self, update: UpdateTaskRequest) {
        if let Some(title) = update.title.filter(|t| !t.trim().is_empty()) {
            self.title = title;
        }
        if let Some(description) = update.description.filter(|d| !d.trim().is_empty()) {
            self.description = description;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
    }

    pub fn soft_delete(&mut self, at: DateTime<Utc>) {
        self.is_deleted = true;
        self.deleted_at = Some(at);
    }

    pub fn restore(&mut self) {
        self.is_deleted = false;
        self.deleted_at = None;
    }

    pub fn is_owned_by(&self, user_id: i32) -> bool {
        self.owner_id == user_id
    }
}

/// Fields required to persist a new task.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub owner_id: i32,
}

/// Payload for `POST /api/tasks`. A `status` in the body is ignored.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(
        custom(function = "not_blank", message = "Title cannot be blank"),
        length(max = 100, message = "Title cannot exceed 100 characters")
    )]
    pub title: String,

    #[validate(
        custom(function = "not_blank", message = "Description cannot be blank"),
        length(max = 500, message = "Description cannot exceed 500 characters")
    )]
    pub description: String,
}

/// Payload for `PUT /api/tasks/{id}`. Every field is optional.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(max = 100, message = "Title cannot exceed 100 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 500, message = "Description cannot exceed 500 characters"))]
    pub description: Option<String>,

    pub status: Option<TaskStatus>,
}

/// Query string of `GET /api/tasks`. Values stay raw so that blank ones
/// can mean "not given".
#[derive(Debug, Default, Deserialize)]
pub struct TaskListQuery {
    pub status: Option<String>,
    pub page: Option<String>,
    pub size: Option<String>,
    pub sort: Option<String>,
}

impl TaskListQuery {
    /// The status filter, if a non-blank one was given.
    pub fn status_filter(&self) -> Result<Option<TaskStatus>, AppError> {
        match self.status.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw.parse::<TaskStatus>().map(Some).map_err(|message| {
                AppError::ValidationFailed(BTreeMap::from([("status".to_string(), message)]))
            }),
        }
    }
}

/// JSON representation of a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user_id: i32,
    pub user_email: String,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            title: task.title,
            description: task.description,
            status: task.status,
            created_at: task.created_at,
            updated_at: task.updated_at,
            user_id: task.owner_id,
            user_email: task.owner_email,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_task() -> Task {
        let now = Utc::now();
        Task {
            id: Uuid::new_v4(),
            title: "Original".to_string(),
            description: "Original description".to_string(),
            status: TaskStatus::ToDo,
            owner_id: 1,
            owner_email: "a@x.com".to_string(),
            created_at: now,
            updated_at: now,
            is_deleted: false,
            deleted_at: None,
        }
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_value(TaskStatus::InProgress).unwrap(),
            "IN_PROGRESS"
        );
        let status: TaskStatus = serde_json::from_str("\"TO_DO\"").unwrap();
        assert_eq!(status, TaskStatus::ToDo);
    }

    #[test]
    fn test_status_filter_treats_blank_as_absent() {
        let query = |status: Option<&str>| TaskListQuery {
            status: status.map(String::from),
            ..Default::default()
        };
        assert_eq!(query(None).status_filter().unwrap(), None);
        assert_eq!(query(Some("")).status_filter().unwrap(), None);
        assert_eq!(
            query(Some("IN_PROGRESS")).status_filter().unwrap(),
            Some(TaskStatus::InProgress)
        );
        match query(Some("SOMEDAY")).status_filter() {
            Err(AppError::ValidationFailed(fields)) => {
                assert!(fields["status"].contains("SOMEDAY"))
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_apply_update_ignores_blank_fields() {
        let mut task = sample_task();
        task.apply_update(UpdateTaskRequest {
            title: Some("   ".to_string()),
            description: Some("".to_string()),
            status: None,
        });
        assert_eq!(task.title, "Original");
        assert_eq!(task.description, "Original description");
        assert_eq!(task.status, TaskStatus::ToDo);

        task.apply_update(UpdateTaskRequest {
            title: Some("Renamed".to_string()),
            description: None,
            status: Some(TaskStatus::Done),
        });
        assert_eq!(task.title, "Renamed");
        assert_eq!(task.description, "Original description");
        assert_eq!(task.status, TaskStatus::Done);
    }

    #[test]
    fn test_soft_delete_and_restore() {
        let mut task = sample_task();
        let at = Utc::now();
        task.soft_delete(at);
        assert!(task.is_deleted);
        assert_eq!(task.deleted_at, Some(at));

        task.restore();
        assert!(!task.is_deleted);
        assert!(task.deleted_at.is_none());
    }

    #[test]
    fn test_create_request_validation() {
        let valid = CreateTaskRequest {
            title: "Valid Title".to_string(),
            description: "Something to do".to_string(),
        };
        assert!(valid.validate().is_ok());

        let blank_title = CreateTaskRequest {
            title: "  ".to_string(),
            description: "Something to do".to_string(),
        };
        assert!(blank_title.validate().is_err());

        let long_title = CreateTaskRequest {
            title: "a".repeat(101),
            description: "Something to do".to_string(),
        };
        assert!(long_title.validate().is_err());

        let long_description = CreateTaskRequest {
            title: "Valid Title".to_string(),
            description: "b".repeat(501),
        };
        assert!(long_description.validate().is_err());
    }

    #[test]
    fn test_update_request_validation() {
        assert!(UpdateTaskRequest::default().validate().is_ok());

        let long_title = UpdateTaskRequest {
            title: Some("a".repeat(101)),
            ..Default::default()
        };
        assert!(long_title.validate().is_err());
    }

    #[test]
    fn test_response_uses_camel_case() {
        let task = sample_task();
        let json = serde_json::to_value(TaskResponse::from(task)).unwrap();
        assert_eq!(json["userEmail"], "a@x.com");
        assert_eq!(json["userId"], 1);
        assert_eq!(json["status"], "TO_DO");
        assert!(json["createdAt"].is_string());
    }
}
