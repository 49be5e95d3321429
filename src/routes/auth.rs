use actix_web::{get, post, web, HttpResponse};
use serde_json::json;

use super::{created, ok};
use crate::{
    auth::{AuthenticatedUser, LoginRequest, RegisterRequest},
    error::AppError,
    state::AppState,
};

/// Register a new user
///
/// Creates the account and returns `{user, token}` with 201.
/// A taken email (compared case-insensitively) is 409.
#[post("/register")]
pub async fn register(
    state: web::Data<AppState>,
    register_data: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    let response = state.auth.register(register_data.into_inner()).await?;
    Ok(created(response))
}

/// Login user
///
/// Returns `{user, token}`. Unknown email and wrong password are the same 401.
#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    login_data: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let response = state.auth.authenticate(login_data.into_inner()).await?;
    Ok(ok(response))
}

/// Profile of the token's owner.
#[get("/profile")]
pub async fn profile(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let user = state.auth.get_profile(user.id).await?;
    Ok(ok(json!({ "user": user })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenService;
    use actix_web::{http::StatusCode, test, App};

    fn state() -> web::Data<AppState> {
        web::Data::new(AppState::in_memory(
            TokenService::with_default_lifetime("routes-auth-secret"),
            4,
        ))
    }

    #[actix_rt::test]
    async fn test_register_validation() {
        let app = test::init_service(
            App::new()
                .app_data(state())
                .configure(crate::routes::config),
        )
        .await;

        let cases = [
            json!({ "email": "invalid-email", "name": "Alice", "password": "Passw0rd" }),
            json!({ "email": "alice@x.com", "name": "Alice", "password": "short" }),
            json!({ "email": "alice@x.com", "name": "A", "password": "Passw0rd" }),
            json!({ "email": "alice@x.com", "name": "Alice" }),
        ];
        for payload in cases {
            let req = test::TestRequest::post()
                .uri("/auth/register")
                .set_json(&payload)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "payload: {}", payload);

            let body: serde_json::Value = test::read_body_json(resp).await;
            assert_eq!(body["status"], "error");
        }
    }

    #[actix_rt::test]
    async fn test_profile_requires_identity() {
        let app = test::init_service(App::new().app_data(state()).service(profile)).await;

        let req = test::TestRequest::get().uri("/profile").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
