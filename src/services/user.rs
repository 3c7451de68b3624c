//! User service
//!
//! The blog has exactly one author. Registration is open only while the
//! users table is empty; the insert itself is conditional so two racing
//! registrations cannot both succeed.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::repositories::UserRepository;
use crate::models::{UpdateProfileInput, User};
use crate::services::password::{hash_password_blocking, verify_password_blocking};
use crate::services::token::{IssuedToken, TokenService};

const INVALID_CREDENTIALS: &str = "Invalid username or password";

#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    /// A user already exists
    #[error("Registration is closed")]
    RegistrationClosed,

    #[error("User not found: {0}")]
    NotFound(i64),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegisterInput {
    pub fn new(username: impl Into<String>, email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

/// Successful login
#[derive(Debug, Clone, Serialize)]
pub struct LoginOutput {
    pub token: String,
    pub expires_at: chrono::DateTime<chrono::Utc>,
    pub user: User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegistrationStatus {
    pub registration_allowed: bool,
    pub user_count: i64,
}

pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    tokens: Arc<TokenService>,
}

impl UserService {
    pub fn new(user_repo: Arc<dyn UserRepository>, tokens: Arc<TokenService>) -> Self {
        Self { user_repo, tokens }
    }

    /// Register the blog's author. Fails with `RegistrationClosed` once any
    /// user exists.
    pub async fn register(&self, input: RegisterInput) -> Result<User, UserServiceError> {
        let input = validate_register_input(input)?;

        if self.user_repo.count().await.context("Failed to count users")? > 0 {
            return Err(UserServiceError::RegistrationClosed);
        }

        let password_hash = hash_password_blocking(input.password).await?;
        let user = User::new(input.username, input.email, password_hash);

        let created = self
            .user_repo
            .create_if_none(&user)
            .await
            .context("Failed to create user")?
            .ok_or(UserServiceError::RegistrationClosed)?;

        tracing::info!(user_id = created.id, username = %created.username, "Author registered");
        Ok(created)
    }

    /// Check credentials and issue a token. Unknown user and wrong password
    /// produce the same error.
    pub async fn login(&self, input: LoginInput) -> Result<LoginOutput, UserServiceError> {
        let user = self
            .user_repo
            .get_by_username(input.username.trim())
            .await
            .context("Failed to look up user")?
            .ok_or_else(|| UserServiceError::AuthenticationError(INVALID_CREDENTIALS.to_string()))?;

        if !verify_password_blocking(input.password, user.password_hash.clone()).await? {
            tracing::debug!(username = %user.username, "Login rejected");
            return Err(UserServiceError::AuthenticationError(
                INVALID_CREDENTIALS.to_string(),
            ));
        }

        let IssuedToken { token, expires_at } = self.tokens.issue(user.id)?;
        Ok(LoginOutput {
            token,
            expires_at,
            user,
        })
    }

    pub async fn get_profile(&self, user_id: i64) -> Result<User, UserServiceError> {
        self.user_repo
            .get_by_id(user_id)
            .await
            .context("Failed to get user")?
            .ok_or(UserServiceError::NotFound(user_id))
    }

    pub async fn update_profile(
        &self,
        user_id: i64,
        input: UpdateProfileInput,
    ) -> Result<User, UserServiceError> {
        let mut user = self.get_profile(user_id).await?;
        input.apply_to(&mut user);

        let updated = self
            .user_repo
            .update_profile(&user)
            .await
            .context("Failed to update profile")?;
        Ok(updated)
    }

    /// Public profile of the blog's author (the first registered user)
    pub async fn author_profile(&self) -> Result<Option<User>, UserServiceError> {
        Ok(self
            .user_repo
            .get_first()
            .await
            .context("Failed to get author")?)
    }

    pub async fn registration_status(&self) -> Result<RegistrationStatus, UserServiceError> {
        let user_count = self.user_repo.count().await.context("Failed to count users")?;
        Ok(RegistrationStatus {
            registration_allowed: user_count == 0,
            user_count,
        })
    }
}

fn validate_register_input(input: RegisterInput) -> Result<RegisterInput, UserServiceError> {
    let username = input.username.trim().to_string();
    let email = input.email.trim().to_string();

    if username.is_empty() {
        return Err(UserServiceError::ValidationError(
            "Username cannot be empty".to_string(),
        ));
    }
    if input.password.is_empty() {
        return Err(UserServiceError::ValidationError(
            "Password cannot be empty".to_string(),
        ));
    }
    if !is_plausible_email(&email) {
        return Err(UserServiceError::ValidationError(
            "Invalid email format".to_string(),
        ));
    }

    Ok(RegisterInput {
        username,
        email,
        password: input.password,
    })
}

/// `local@domain.tld` with no whitespace
fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}
