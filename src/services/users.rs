use std::sync::Arc;

use crate::auth::{hash_password, verify_password};
use crate::error::AppError;
use crate::models::{NewUser, RegisterRequest, User};
use crate::store::UserStore;

const BAD_CREDENTIALS: &str = "Invalid email or password";

/// Registration, lookup, and credential checks.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
    bcrypt_cost: u32,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>, bcrypt_cost: u32) -> Self {
        Self { store, bcrypt_cost }
    }

    /// Creates an account. Fails with `Conflict`, without writing anything,
    /// when the email is already taken.
    pub async fn register(&self, request: RegisterRequest) -> Result<User, AppError> {
        if self.store.exists_by_email(&request.email).await? {
            return Err(AppError::Conflict(format!(
                "Email '{}' is already taken",
                request.email
            )));
        }

        let password_hash = hash_password(&request.password, self.bcrypt_cost)?;
        let user = self
            .store
            .insert_user(NewUser {
                name: request.name.trim().to_string(),
                email: request.email,
                password_hash,
            })
            .await?;
        log::info!("Registered user {} ({})", user.id, user.email);
        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<User, AppError> {
        self.store
            .find_user_by_email(email)
            .await?
            .ok_or_else(|| AppError::user_not_found(email))
    }

    /// Checks a password. Unknown emails and wrong passwords produce the same error.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, AppError> {
        let user = match self.find_by_email(email).await {
            Ok(user) => user,
            Err(AppError::NotFound(_)) => {
                return Err(AppError::Unauthorized(BAD_CREDENTIALS.into()))
            }
            Err(e) => return Err(e),
        };

        if verify_password(password, &user.password_hash)? {
            Ok(user)
        } else {
            Err(AppError::Unauthorized(BAD_CREDENTIALS.into()))
        }
    }
}
