use crate::{
    error::AppError,
    models::{AuthResponse, LoginRequest, RegisterRequest},
    state::AppState,
};
use actix_web::{post, web, HttpResponse, Responder};
use validator::Validate;

/// Register a new user
///
/// Creates a new user account and returns an authentication token.
///
/// ## Responses:
/// - `201 Created`: `{ "token": "..." }`.
/// - `400 Bad Request`: Malformed body or failed field validation.
/// - `409 Conflict`: The email is already registered.
#[post("/register")]
pub async fn register(
    state: web::Data<AppState>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;

    let user = state.users.register(register_data.into_inner()).await?;
    let token = state.tokens.generate_token(&user.email)?;

    Ok(HttpResponse::Created().json(AuthResponse { token }))
}

/// Login user
///
/// Authenticates a user and returns an authentication token.
///
/// ## Responses:
/// - `200 OK`: `{ "token": "..." }`.
/// - `400 Bad Request`: Malformed body or failed field validation.
/// - `401 Unauthorized`: Unknown email or wrong password.
#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;

    let user = state
        .users
        .authenticate(&login_data.email, &login_data.password)
        .await?;
    let token = state.tokens.generate_token(&user.email)?;

    Ok(HttpResponse::Ok().json(AuthResponse { token }))
}
