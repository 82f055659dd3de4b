use actix_web::dev::Payload;
use actix_web::{web, Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use futures::future::LocalBoxFuture;

use crate::auth::resolver::Principal;
use crate::error::AppError;
use crate::models::User;
use crate::state::AppState;

/// The stored user behind the request's principal.
///
/// Intended for routes protected by `AuthMiddleware`, which places the
/// `Principal` into request extensions. Resolution goes through
/// `AuthenticatedUserResolver`, so an absent principal or an unknown email
/// becomes an `AppError::InternalFault`.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequest for CurrentUser {
    type Error = ActixError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let principal = req.extensions().get::<Principal>().cloned();
        let state = req.app_data::<web::Data<AppState>>().cloned();

        Box::pin(async move {
            let state = state.ok_or_else(|| {
                AppError::InternalFault("Application state is not configured".into())
            })?;
            let user = state.resolver.resolve(principal.as_ref()).await?;
            Ok(CurrentUser(user))
        })
    }
}
