use std::sync::Arc;

use tokio::sync::OnceCell;
use uuid::Uuid;
use validator::Validate;

use crate::auth::password::{hash_password_async, verify_password_async};
use crate::auth::{AuthResponse, LoginRequest, RegisterRequest, TokenPayload, TokenService};
use crate::error::AppError;
use crate::models::{NewUser, User};
use crate::store::UserStore;

const EMAIL_TAKEN: &str = "Email already registered";
const INVALID_CREDENTIALS: &str = "Invalid credentials";
const DUMMY_PASSWORD: &str = "taskdeck-unknown-account";

/// Registration, login and profile lookup.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    tokens: TokenService,
    bcrypt_cost: u32,
    /// Hash checked when the email is unknown, at the same cost as real ones.
    dummy_hash: Arc<OnceCell<String>>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, tokens: TokenService, bcrypt_cost: u32) -> Self {
        Self {
            users,
            tokens,
            bcrypt_cost,
            dummy_hash: Arc::new(OnceCell::new()),
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Creates an account and signs the new user in.
    ///
    /// A taken email fails with 409, including when two registrations race
    /// past the lookup and the store's unique constraint fires instead.
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, AppError> {
        let request = request.normalized();
        request.validate()?;

        if self.users.find_user_by_email(&request.email).await?.is_some() {
            return Err(AppError::Conflict(EMAIL_TAKEN.into()));
        }

        let password_hash = hash_password_async(request.password, self.bcrypt_cost).await?;
        let user = self
            .users
            .insert_user(NewUser {
                email: request.email,
                password_hash,
                name: request.name,
            })
            .await
            .map_err(|err| match err {
                AppError::Conflict(_) => AppError::Conflict(EMAIL_TAKEN.into()),
                other => other,
            })?;

        log::info!("Registered user {}", user.id);
        self.sign_in(user)
    }

    /// Checks credentials and issues a fresh token.
    ///
    /// Unknown email and wrong password produce the same error, and both run
    /// one bcrypt verification.
    pub async fn authenticate(&self, request: LoginRequest) -> Result<AuthResponse, AppError> {
        let request = request.normalized();
        request.validate()?;

        let Some(record) = self.users.find_user_by_email(&request.email).await? else {
            let dummy_hash = self
                .dummy_hash
                .get_or_try_init(|| hash_password_async(DUMMY_PASSWORD.to_string(), self.bcrypt_cost))
                .await?
                .clone();
            verify_password_async(request.password, dummy_hash).await?;
            log::warn!("Failed login for unknown email");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
        };

        let matches = verify_password_async(request.password, record.password_hash.clone()).await?;
        if !matches {
            log::warn!("Failed login for user {}", record.id);
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
        }

        self.sign_in(User::from(record))
    }

    pub async fn get_profile(&self, user_id: Uuid) -> Result<User, AppError> {
        self.users
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("User not found".into()))
    }

    fn sign_in(&self, user: User) -> Result<AuthResponse, AppError> {
        let token = self.tokens.issue(&TokenPayload {
            user_id: user.id,
            email: user.email.clone(),
        })?;
        Ok(AuthResponse { user, token })
    }
}
