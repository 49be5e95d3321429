use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error, HttpMessage, ResponseError,
};
use futures::future::{ready, LocalBoxFuture, Ready};

use crate::auth::token::{TokenPayload, TokenService};
use crate::error::AppError;

/// Paths under the wrapped scope that do not need a bearer token.
const PUBLIC_PATHS: &[&str] = &["/api/auth/login", "/api/auth/register"];

/// Verifies the `Authorization: Bearer <token>` header and stores the
/// resulting `TokenPayload` in the request extensions.
///
/// Missing, malformed, forged and expired tokens are all answered with 401
/// before the handler runs.
pub struct AuthMiddleware {
    tokens: TokenService,
}

impl AuthMiddleware {
    pub fn new(tokens: TokenService) -> Self {
        Self { tokens }
    }
}

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
        ready(Ok(AuthMiddlewareService {
            service,
            tokens: self.tokens.clone(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
    tokens: TokenService,
}

impl<S> AuthMiddlewareService<S> {
    fn verify(&self, req: &ServiceRequest) -> Result<TokenPayload, AppError> {
        let bearer = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty());

        match bearer {
            Some(token) => self.tokens.verify(token),
            None => Err(AppError::Unauthorized("No token provided".into())),
        }
    }
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
        let is_public = PUBLIC_PATHS.iter().any(|public| req.path().starts_with(public));

        if !is_public {
            match self.verify(&req) {
                Ok(payload) => {
                    req.extensions_mut().insert(payload);
                }
                Err(app_err) => {
                    log::debug!("Rejected bearer token on {}: {}", req.path(), app_err);
                    let (request, _payload) = req.into_parts();
                    let response = app_err.error_response().map_into_right_body();
                    return Box::pin(async move { Ok(ServiceResponse::new(request, response)) });
                }
            }
        }

        let fut = self.service.call(req);
        Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
    }
}
