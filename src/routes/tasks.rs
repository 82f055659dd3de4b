use crate::{
    auth::CurrentUser,
    error::AppError,
    models::{CreateTaskRequest, TaskListQuery, TaskResponse, UpdateTaskRequest},
    state::AppState,
    store::PageRequest,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use uuid::Uuid;
use validator::Validate;

/// Lists the authenticated user's tasks, one page at a time.
///
/// ## Query Parameters:
/// - `status` (optional): `TO_DO`, `IN_PROGRESS` or `DONE`.
/// - `page` (optional): Zero-based page index. Defaults to 0.
/// - `size` (optional): Page size, clamped to 100. Defaults to 10.
///
/// Blank values are treated as absent.
/// - `sort` (optional): `field[,asc|desc]` where field is `createdAt`, `updatedAt`,
///   `title` or `status`. Defaults to `createdAt,desc`.
///
/// ## Responses:
/// - `200 OK`: A page of `TaskResponse` objects.
/// - `400 Bad Request`: Unknown status, non-numeric page or size, or unsupported sort.
/// - `401 Unauthorized`: Missing or invalid token.
#[get("")]
pub async fn get_tasks(
    state: web::Data<AppState>,
    user: CurrentUser,
    query: web::Query<TaskListQuery>,
) -> Result<impl Responder, AppError> {
    let status = query.status_filter()?;
    let page = PageRequest::from_params(
        query.page.as_deref(),
        query.size.as_deref(),
        query.sort.as_deref(),
    )?;

    let tasks = state.tasks.list_tasks(&user.0, status, &page).await?;

    Ok(HttpResponse::Ok().json(tasks.map(TaskResponse::from)))
}

/// Creates a new task for the authenticated user.
///
/// The task always starts as `TO_DO`; a `status` field in the body is ignored.
///
/// ## Responses:
/// - `201 Created`: The new `TaskResponse`.
/// - `400 Bad Request`: Blank or overly long title/description.
/// - `401 Unauthorized`: Missing or invalid token.
#[post("")]
pub async fn create_task(
    state: web::Data<AppState>,
    user: CurrentUser,
    task_data: web::Json<CreateTaskRequest>,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let task = state
        .tasks
        .create_task(&user.0, task_data.into_inner())
        .await?;

    Ok(HttpResponse::Created().json(TaskResponse::from(task)))
}

/// Retrieves one of the authenticated user's tasks.
///
/// ## Responses:
/// - `200 OK`: The `TaskResponse`.
/// - `404 Not Found`: The task does not exist, is deleted, or belongs to another user.
#[get("/{id}")]
pub async fn get_task(
    state: web::Data<AppState>,
    user: CurrentUser,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let task = state.tasks.get_task(&user.0, task_id.into_inner()).await?;

    Ok(HttpResponse::Ok().json(TaskResponse::from(task)))
}

/// Partially updates a task.
///
/// Blank `title`/`description` values and a missing `status` leave the
/// current values untouched.
///
/// ## Responses:
/// - `200 OK`: The updated `TaskResponse`.
/// - `400 Bad Request`: Overly long title/description or unknown status.
/// - `404 Not Found`: The task does not exist, is deleted, or belongs to another user.
#[put("/{id}")]
pub async fn update_task(
    state: web::Data<AppState>,
    user: CurrentUser,
    task_id: web::Path<Uuid>,
    task_data: web::Json<UpdateTaskRequest>,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let task = state
        .tasks
        .update_task(&user.0, task_id.into_inner(), task_data.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(TaskResponse::from(task)))
}

/// Soft-deletes a task.
///
/// ## Responses:
/// - `204 No Content`: The task is now hidden and will be purged after the retention window.
/// - `404 Not Found`: The task does not exist, is already deleted, or belongs to another user.
#[delete("/{id}")]
pub async fn delete_task(
    state: web::Data<AppState>,
    user: CurrentUser,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    state
        .tasks
        .delete_task(&user.0, task_id.into_inner())
        .await?;

    Ok(HttpResponse::NoContent().finish())
}

/// Restores a soft-deleted task that has not been purged yet.
///
/// ## Responses:
/// - `200 OK`: The restored `TaskResponse`.
/// - `404 Not Found`: The task does not exist (or was purged) or belongs to another user.
#[post("/{id}/restore")]
pub async fn restore_task(
    state: web::Data<AppState>,
    user: CurrentUser,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let task = state
        .tasks
        .restore_task(&user.0, task_id.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(TaskResponse::from(task)))
}
