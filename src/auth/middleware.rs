use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};

use crate::auth::resolver::Principal;
use crate::error::AppError;
use crate::state::AppState;

/// Routes under `/api` that are reachable without a token.
const PUBLIC_PATHS: [&str; 2] = ["/api/auth/login", "/api/auth/register"];

/// Verifies the bearer token on every protected request and attaches the
/// resulting `Principal` to the request extensions.
///
/// Rejections are rendered as responses here rather than returned as errors,
/// so they pass through the outer middleware like any other response.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService { service }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if PUBLIC_PATHS.contains(&req.path()) {
            req.extensions_mut().insert(Principal::Anonymous);
            let fut = self.service.call(req);
            return Box::pin(async move { Ok(fut.await?.map_into_left_body()) });
        }

        let verified = match req.app_data::<web::Data<AppState>>() {
            Some(state) => {
                let token = req
                    .headers()
                    .get(header::AUTHORIZATION)
                    .and_then(|value| value.to_str().ok())
                    .and_then(|value| value.strip_prefix("Bearer "));
                match token {
                    Some(token) => state.tokens.verify_token(token.trim()),
                    None => Err(AppError::Unauthorized("Missing token".into())),
                }
            }
            None => Err(AppError::InternalFault(
                "Application state is not configured".into(),
            )),
        };

        match verified {
            Ok(claims) => {
                log::debug!("Authenticated request to {} as {}", req.path(), claims.sub);
                req.extensions_mut()
                    .insert(Principal::Authenticated(claims.sub));
                let fut = self.service.call(req);
                Box::pin(async move { Ok(fut.await?.map_into_left_body()) })
            }
            Err(app_err) => {
                let response = req.error_response(app_err).map_into_right_body();
                Box::pin(async move { Ok(response) })
            }
        }
    }
}
