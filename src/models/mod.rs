pub mod page;
pub mod task;
pub mod user;

pub use page::Page;
pub use task::{
    CreateTaskRequest, NewTask, Task, TaskListQuery, TaskResponse, TaskStatus, UpdateTaskRequest,
};
pub use user::{AuthResponse, LoginRequest, NewUser, RegisterRequest, User};

use validator::ValidationError;

/// Rejects empty strings and strings made only of whitespace.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("not_blank"));
    }
    Ok(())
}
