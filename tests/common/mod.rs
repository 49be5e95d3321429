//! Shared helpers for the integration tests. Each test builds its own app
//! over a fresh `MemoryStore`, so tests never share data.
#![allow(dead_code)]

use actix_http::Request;
use actix_web::{
    body::MessageBody,
    dev::{Service, ServiceResponse},
    http::{header, StatusCode},
    test,
};
use serde_json::{json, Value};
use taskdeck::auth::TokenService;
use taskdeck::state::AppState;

pub const PASSWORD: &str = "Passw0rd!";
pub const SECRET: &str = "integration-test-secret";

/// Fresh state with a cheap bcrypt cost.
pub fn test_state() -> AppState {
    AppState::in_memory(TokenService::with_default_lifetime(SECRET), 4)
}

/// Builds the full application (health, CORS, logger, `/api` behind the
/// auth middleware) over the given `AppState`. Pull it in with
/// `#[macro_use] mod common;`.
macro_rules! test_app {
    ($state:expr) => {{
        let state: taskdeck::state::AppState = $state;
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new(state.clone()))
                .wrap(
                    actix_cors::Cors::default()
                        .allow_any_origin()
                        .allow_any_method()
                        .allow_any_header()
                        .max_age(3600),
                )
                .wrap(actix_web::middleware::Logger::default())
                .service(taskdeck::routes::health::health)
                .service(
                    actix_web::web::scope("/api")
                        .wrap(taskdeck::auth::AuthMiddleware::new(state.tokens().clone()))
                        .configure(taskdeck::routes::config)
                        .default_service(actix_web::web::to(taskdeck::routes::not_found)),
                )
                .default_service(actix_web::web::to(taskdeck::routes::not_found)),
        )
        .await
    }};
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub token: String,
}

pub fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

/// Sends `req` and returns the status with the parsed JSON body
/// (`Value::Null` for an empty body).
pub async fn send<S, B>(app: &S, req: Request) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let body = test::read_body(resp).await;
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or_else(|e| {
            panic!("body is not JSON ({}): {}", e, String::from_utf8_lossy(&body))
        })
    };
    (status, json)
}

/// Registers a user and returns its id and token.
pub async fn register_user<S, B>(app: &S, email: &str, name: &str) -> TestUser
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({ "email": email, "password": PASSWORD, "name": name }))
        .to_request();
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

    TestUser {
        id: body["data"]["user"]["id"]
            .as_str()
            .expect("user id in response")
            .to_string(),
        email: body["data"]["user"]["email"]
            .as_str()
            .expect("email in response")
            .to_string(),
        token: body["data"]["token"]
            .as_str()
            .expect("token in response")
            .to_string(),
    }
}

/// Creates a project for `user` and returns its id.
pub async fn create_project<S, B>(app: &S, user: &TestUser, name: &str) -> String
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/api/projects")
        .insert_header(bearer(&user.token))
        .set_json(json!({ "name": name, "color": "#3B82F6" }))
        .to_request();
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::CREATED, "project create failed: {}", body);
    body["data"]["project"]["id"]
        .as_str()
        .expect("project id in response")
        .to_string()
}

/// Creates a task for `user` from a JSON body and returns the task object.
pub async fn create_task<S, B>(app: &S, user: &TestUser, payload: Value) -> Value
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/api/tasks")
        .insert_header(bearer(&user.token))
        .set_json(payload)
        .to_request();
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::CREATED, "task create failed: {}", body);
    body["data"]["task"].clone()
}
