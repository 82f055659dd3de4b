use crate::error::AppError;
use bcrypt::{hash, verify};

/// Lowest cost bcrypt accepts. Only suitable for tests.
pub const MIN_COST: u32 = 4;

pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    hash(password, cost)
        .map_err(|e| AppError::InternalFault(format!("Failed to hash password: {}", e)))
}

pub fn verify_password(password: &str, hashed_password: &str) -> Result<bool, AppError> {
    verify(password, hashed_password)
        .map_err(|e| AppError::InternalFault(format!("Failed to verify password: {}", e)))
}
