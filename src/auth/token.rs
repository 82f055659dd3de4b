use crate::error::AppError;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Represents the claims encoded within a JWT (JSON Web Token).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject of the token: the user's email.
    pub sub: String,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: usize,
    /// Expiration timestamp (seconds since epoch).
    pub exp: usize,
}

/// Signs and verifies HS256 access tokens.
///
/// Built once from configuration and shared through `web::Data`, so the
/// secret is read a single time at startup.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime_hours: i64,
}

impl TokenIssuer {
    pub fn new(secret: &str, lifetime_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            lifetime_hours,
        }
    }

    /// Generates a token whose subject is `email`.
    ///
    /// # Returns
    /// The encoded JWT, or `AppError::InternalFault` if encoding fails.
    pub fn generate_token(&self, email: &str) -> Result<String, AppError> {
        let now = Utc::now();
        let expires = Duration::try_hours(self.lifetime_hours)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| {
                AppError::InternalFault(format!(
                    "Token lifetime of {} hours is out of range",
                    self.lifetime_hours
                ))
            })?;
        let claims = Claims {
            sub: email.to_string(),
            iat: now.timestamp() as usize,
            exp: expires.timestamp() as usize,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::InternalFault(format!("Failed to generate token: {}", e)))
    }

    /// Verifies a JWT string and decodes its claims.
    ///
    /// Signature and expiration are checked. Any failure is
    /// `AppError::Unauthorized`.
    pub fn verify_token(&self, token: &str) -> Result<Claims, AppError> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::default())?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_generation_and_verification() {
        let issuer = TokenIssuer::new("test_secret_for_gen_verify", 24);
        let token = issuer.generate_token("a@x.com").unwrap();
        let claims = issuer.verify_token(&token).unwrap();
        assert_eq!(claims.sub, "a@x.com");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_token_expiration() {
        let issuer = TokenIssuer::new("test_secret_for_expiration", 24);
        let issued = Utc::now() - Duration::hours(3);
        let claims_expired = Claims {
            sub: "a@x.com".to_string(),
            iat: issued.timestamp() as usize,
            exp: (issued + Duration::hours(1)).timestamp() as usize,
        };
        let expired_token = encode(
            &Header::default(),
            &claims_expired,
            &EncodingKey::from_secret("test_secret_for_expiration".as_bytes()),
        )
        .unwrap();

        match issuer.verify_token(&expired_token) {
            Err(AppError::Unauthorized(msg)) => assert!(msg.contains("ExpiredSignature")),
            Ok(_) => panic!("Token should have been invalid due to expiration"),
            Err(e) => panic!("Unexpected error type for expired token: {:?}", e),
        }
    }

    #[test]
    fn test_invalid_token_signature() {
        let signer = TokenIssuer::new("one_secret", 24);
        let verifier = TokenIssuer::new("a_completely_different_secret", 24);
        let token = signer.generate_token("a@x.com").unwrap();

        match verifier.verify_token(&token) {
            Err(AppError::Unauthorized(msg)) => assert!(msg.contains("InvalidSignature")),
            Ok(_) => panic!("Token should have been invalid due to signature mismatch"),
            Err(e) => panic!("Unexpected error type for invalid signature: {:?}", e),
        }
    }

    #[test]
    fn test_garbage_token_is_unauthorized() {
        let issuer = TokenIssuer::new("secret", 24);
        assert!(matches!(
            issuer.verify_token("not-a-jwt"),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_unrepresentable_lifetime_is_an_error() {
        let issuer = TokenIssuer::new("secret", i64::MAX);
        assert!(matches!(
            issuer.generate_token("a@x.com"),
            Err(AppError::InternalFault(_))
        ));
    }
}
