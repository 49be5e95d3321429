use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};
use uuid::Uuid;

use crate::auth::token::TokenPayload;
use crate::error::AppError;

/// The authenticated caller, taken from request extensions.
///
/// `AuthMiddleware` verifies the bearer token and inserts its `TokenPayload`;
/// this extractor only reads it back. On routes the middleware does not
/// cover, extraction fails with 401.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub email: String,
}

impl FromRequest for AuthenticatedUser {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<TokenPayload>().cloned() {
            Some(payload) => ready(Ok(AuthenticatedUser {
                id: payload.user_id,
                email: payload.email,
            })),
            None => {
                let err = AppError::Unauthorized("Authentication required".to_string());
                ready(Err(err.into()))
            }
        }
    }
}
