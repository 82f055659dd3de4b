use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::not_blank;

/// A registered account. Users are created once and never modified.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Fields required to persist a new user. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// Represents the payload for a new user registration request.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(
        custom(function = "not_blank", message = "Name cannot be blank"),
        length(max = 100, message = "Name cannot exceed 100 characters")
    )]
    pub name: String,
    #[validate(email(message = "Email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: String,
}

/// Represents the payload for a user login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Email must be a valid address"))]
    pub email: String,
    #[validate(custom(function = "not_blank", message = "Password cannot be blank"))]
    pub password: String,
}

/// Response returned after a successful registration or login.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_register_request_validation() {
        let input = RegisterRequest {
            name: "A".to_string(),
            email: "a@x.com".to_string(),
            password: "secret123".to_string(),
        };
        assert!(input.validate().is_ok());

        let input = RegisterRequest {
            name: "   ".to_string(),
            email: "a@x.com".to_string(),
            password: "secret123".to_string(),
        };
        assert!(input.validate().is_err());

        let input = RegisterRequest {
            name: "A".to_string(),
            email: "invalid-email".to_string(),
            password: "secret123".to_string(),
        };
        assert!(input.validate().is_err());

        let input = RegisterRequest {
            name: "A".to_string(),
            email: "a@x.com".to_string(),
            password: "short".to_string(),
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_login_request_validation() {
        let input = LoginRequest {
            email: "a@x.com".to_string(),
            password: "x".to_string(),
        };
        assert!(input.validate().is_ok());

        let input = LoginRequest {
            email: "a@x.com".to_string(),
            password: "".to_string(),
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_password_hash_is_never_serialized() {
        let user = User {
            id: 1,
            name: "A".into(),
            email: "a@x.com".into(),
            password_hash: "$2b$12$secret".into(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "a@x.com");
    }
}
