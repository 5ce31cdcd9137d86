use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use super::{
    dto::{AuthResponse, LoginRequest, RegisterRequest},
    jwt::JwtKeys,
    password::{hash_password_blocking, verify_password_blocking},
    repo::UserStore,
    repo_types::{NewUser, User},
};
use crate::error::{AppError, AppResult};

const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Surrounding whitespace is dropped; letter case is kept and ignored by the store.
pub(crate) fn normalize_email(email: &str) -> &str {
    email.trim()
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Invalid credentials")
}

/// Registration, login and bearer-token checks.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    keys: JwtKeys,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, keys: JwtKeys) -> Self {
        Self { users, keys }
    }

    pub async fn register(&self, req: RegisterRequest) -> AppResult<AuthResponse> {
        let email = normalize_email(&req.email);
        if !is_valid_email(email) {
            warn!(email = %email, "invalid email");
            return Err(AppError::Validation("Invalid email".into()));
        }
        if req.name.trim().is_empty() {
            return Err(AppError::Validation("Name is required".into()));
        }
        if req.password.chars().count() < MIN_PASSWORD_LEN {
            warn!("password too short");
            return Err(AppError::Validation("Password too short".into()));
        }

        if self.users.find_by_email(email).await?.is_some() {
            warn!(email = %email, "email already registered");
            return Err(AppError::Conflict("Email already registered".into()));
        }

        let password_hash = hash_password_blocking(req.password).await?;
        // The insert itself is conditional, so a concurrent registration still lands here.
        let user = self
            .users
            .create(NewUser {
                email,
                display_name: &req.name,
                password_hash: &password_hash,
            })
            .await?
            .ok_or_else(|| AppError::Conflict("Email already registered".into()))?;

        let token = self.keys.sign(user.id)?;
        info!(user_id = %user.id, email = %user.email, "user registered");
        Ok(AuthResponse::bearer(token, &user))
    }

    pub async fn login(&self, req: LoginRequest) -> AppResult<AuthResponse> {
        let email = normalize_email(&req.email);
        if !is_valid_email(email) {
            warn!("login with malformed email");
            return Err(invalid_credentials());
        }

        let Some(user) = self.users.find_by_email(email).await? else {
            warn!(email = %email, "login unknown email");
            return Err(invalid_credentials());
        };

        let ok = verify_password_blocking(req.password, user.password_hash.clone()).await?;
        if !ok {
            warn!(email = %email, user_id = %user.id, "login invalid password");
            return Err(invalid_credentials());
        }

        let token = self.keys.sign(user.id)?;
        info!(user_id = %user.id, email = %user.email, "user logged in");
        Ok(AuthResponse::bearer(token, &user))
    }

    /// Resolves a presented bearer token to a live user record.
    pub async fn authenticate(&self, token: &str) -> AppResult<User> {
        let claims = self.keys.verify(token).map_err(|e| {
            warn!(error = %e, "invalid or expired token");
            AppError::Unauthorized("Invalid or expired token")
        })?;

        self.users.find_by_id(claims.sub).await?.ok_or_else(|| {
            warn!(user_id = %claims.sub, "token subject no longer exists");
            AppError::Unauthorized("User not found")
        })
    }
}
