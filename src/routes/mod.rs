pub mod auth;
pub mod health;
pub mod tasks;

use actix_web::{error, web};

use crate::error::AppError;

/// Registers the `/auth` and `/tasks` scopes. Mount it under `/api`, wrapped
/// in `AuthMiddleware`.
///
/// Body, query, and path extraction failures are turned into `AppError` so
/// they share the JSON error envelope.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        AppError::BadRequest(format!("Malformed request body: {}", err)).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        AppError::BadRequest(format!("Invalid query parameters: {}", err)).into()
    }))
    .app_data(web::PathConfig::default().error_handler(|err, _req| {
        path_error(err)
    }))
    .service(
        web::scope("/auth")
            .service(auth::login)
            .service(auth::register),
    )
    .service(
        web::scope("/tasks")
            .service(tasks::get_tasks)
            .service(tasks::create_task)
            .service(tasks::get_task)
            .service(tasks::update_task)
            .service(tasks::delete_task)
            .service(tasks::restore_task),
    );
}

// An id that is not a UUID cannot name any task.
fn path_error(err: error::PathError) -> actix_web::Error {
    AppError::NotFound(format!("Task not found: {}", err)).into()
}
