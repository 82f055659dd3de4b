use std::sync::Arc;

use crate::error::AppError;
use crate::models::User;
use crate::store::UserStore;

/// The security principal attached to a request by `AuthMiddleware`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    /// A verified token whose subject is this email.
    Authenticated(String),
    /// A request on a public route.
    Anonymous,
}

/// Maps the request's principal to the stored user it names.
///
/// Every failure here is an `InternalFault`: a handler that asks for the
/// current user sits behind the middleware, so a missing or anonymous
/// principal, or a token naming an unknown email, means the authentication
/// layer and the store disagree.
#[derive(Clone)]
pub struct AuthenticatedUserResolver {
    users: Arc<dyn UserStore>,
}

impl AuthenticatedUserResolver {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    pub async fn resolve(&self, principal: Option<&Principal>) -> Result<User, AppError> {
        let email = match principal {
            None => return Err(AppError::InternalFault("User is not authenticated.".into())),
            Some(Principal::Anonymous) => {
                return Err(AppError::InternalFault(
                    "Cannot get user details from an anonymous user principal.".into(),
                ))
            }
            Some(Principal::Authenticated(email)) => email,
        };

        self.users.find_user_by_email(email).await?.ok_or_else(|| {
            AppError::InternalFault(format!(
                "Authenticated user '{}' not found in database.",
                email
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewUser;
    use crate::store::MemoryStore;

    async fn resolver_with_user() -> AuthenticatedUserResolver {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_user(NewUser {
                name: "A".into(),
                email: "a@x.com".into(),
                password_hash: "hash".into(),
            })
            .await
            .unwrap();
        AuthenticatedUserResolver::new(store)
    }

    #[actix_rt::test]
    async fn test_resolves_authenticated_principal() {
        let resolver = resolver_with_user().await;
        let user = resolver
            .resolve(Some(&Principal::Authenticated("a@x.com".into())))
            .await
            .unwrap();
        assert_eq!(user.email, "a@x.com");
    }

    #[actix_rt::test]
    async fn test_missing_or_anonymous_principal_is_internal_fault() {
        let resolver = resolver_with_user().await;
        assert!(matches!(
            resolver.resolve(None).await,
            Err(AppError::InternalFault(_))
        ));
        assert!(matches!(
            resolver.resolve(Some(&Principal::Anonymous)).await,
            Err(AppError::InternalFault(_))
        ));
    }

    #[actix_rt::test]
    async fn test_unknown_email_is_internal_fault() {
        let resolver = resolver_with_user().await;
        match resolver
            .resolve(Some(&Principal::Authenticated("ghost@x.com".into())))
            .await
        {
            Err(AppError::InternalFault(msg)) => assert!(msg.contains("ghost@x.com")),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
