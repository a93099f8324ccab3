use std::sync::Arc;

use anyhow::Context;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    jwt::JwtKeys,
    password::{hash_password, is_valid_email, verify_password, MIN_PASSWORD_LEN},
    repo::UserRepo,
};
use crate::{
    db::StoreError,
    error::{AppError, AppResult, FieldError},
};

/// Registration, login and token validation.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepo>,
    keys: JwtKeys,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepo>, keys: JwtKeys) -> Self {
        Self { users, keys }
    }

    #[instrument(skip(self, password))]
    pub async fn register(&self, email: &str, password: &str) -> AppResult<Uuid> {
        let email = email.trim();

        let mut details = Vec::new();
        if !is_valid_email(email) {
            details.push(FieldError::new("email", "must be a valid email"));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            details.push(FieldError::new("password", "must be at least 8 chars"));
        }
        if !details.is_empty() {
            return Err(AppError::Validation(details));
        }

        let plain = password.to_owned();
        let hash = tokio::task::spawn_blocking(move || hash_password(&plain))
            .await
            .context("hash task panicked")??;

        match self.users.create(email, &hash).await {
            Ok(user) => {
                info!(user_id = %user.id, "user registered");
                Ok(user.id)
            }
            Err(StoreError::UniqueViolation(_)) => {
                warn!("email already registered");
                Err(AppError::Conflict("email already registered"))
            }
            Err(e) => Err(AppError::from_store(e, "user not found")),
        }
    }

    /// Unknown email and wrong password produce the same error.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> AppResult<String> {
        let email = email.trim();

        let user = match self.users.find_by_email(email).await? {
            Some(u) => u,
            None => {
                warn!("login unknown email");
                return Err(AppError::Unauthorized("invalid credentials"));
            }
        };

        let plain = password.to_owned();
        let stored = user.password_hash.clone();
        let ok = tokio::task::spawn_blocking(move || verify_password(&plain, &stored))
            .await
            .context("verify task panicked")??;

        if !ok {
            warn!(user_id = %user.id, "login invalid password");
            return Err(AppError::Unauthorized("invalid credentials"));
        }

        let token = self.keys.sign(user.id)?;
        info!(user_id = %user.id, "user logged in");
        Ok(token)
    }

    pub fn validate(&self, token: &str) -> AppResult<Uuid> {
        self.keys
            .verify(token)
            .map(|claims| claims.sub)
            .map_err(|e| {
                warn!(error = %e, "token rejected");
                AppError::Unauthorized("invalid or expired token")
            })
    }
}
