use crate::domain::error::DomainError;
use crate::domain::repository::UserRepository;
use crate::domain::user::{CreateUser, LoginRequest, UpdateProfile, User};
use crate::infrastructure::security::{
    DEFAULT_TOKEN_TTL_SECS, generate_token, hash_password, validate_token, verify_password,
};
use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, trace, warn};
use uuid::Uuid;

/// Result of a successful register or login: a fresh bearer token and the user.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub user: User,
}

pub struct AuthService<R: UserRepository> {
    user_repository: Arc<R>,
    jwt_secret: String,
    token_ttl_secs: u64,
}

impl<R: UserRepository> AuthService<R> {
    pub fn new(user_repository: Arc<R>, jwt_secret: String) -> Self {
        Self {
            user_repository,
            jwt_secret,
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
        }
    }

    pub fn with_token_ttl(mut self, token_ttl_secs: u64) -> Self {
        self.token_ttl_secs = token_ttl_secs;
        self
    }

    #[instrument(skip(self, req), fields(email = %req.email))]
    pub async fn register_user(&self, req: CreateUser) -> Result<AuthSession> {
        trace!("Starting user registration");
        req.validate()?;

        if self
            .user_repository
            .find_user_by_email(&req.email)
            .await?
            .is_some()
        {
            warn!(email = %req.email, "User already exists");
            return Err(DomainError::DuplicateResource("User already exists".to_string()).into());
        }

        let password_hash = hash_password(&req.password).map_err(|e| {
            error!(error = %e, "Failed to hash password");
            DomainError::Internal(format!("Failed to hash password: {}", e))
        })?;

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            name: req.name.trim().to_string(),
            email: req.email,
            password_hash,
            bio: None,
            avatar: None,
            created_at: now,
            updated_at: now,
        };

        // The lookup above only skips hashing for known duplicates; the insert decides.
        debug!(user_id = %user.id, "Inserting user into repository");
        self.user_repository.insert_user(user.clone()).await?;

        let token = self.issue_token(&user.id)?;
        info!(user_id = %user.id, email = %user.email, "User registered successfully");

        Ok(AuthSession { token, user })
    }

    #[instrument(skip(self, req), fields(email = %req.email))]
    pub async fn login(&self, req: LoginRequest) -> Result<AuthSession> {
        trace!("Starting login");
        req.validate()?;

        let user = self
            .user_repository
            .find_user_by_email(&req.email)
            .await?
            .ok_or_else(|| {
                warn!(email = %req.email, "User not found during login");
                DomainError::InvalidCredentials
            })?;

        let is_valid = verify_password(&req.password, &user.password_hash).map_err(|e| {
            error!(user_id = %user.id, error = %e, "Failed to verify password");
            DomainError::Internal(format!("Failed to verify password: {}", e))
        })?;

        if !is_valid {
            warn!(user_id = %user.id, "Invalid password during login");
            return Err(DomainError::InvalidCredentials.into());
        }

        let token = self.issue_token(&user.id)?;
        info!(user_id = %user.id, email = %user.email, "Login successful");

        Ok(AuthSession { token, user })
    }

    /// Resolves a bearer token to a user that still exists in the credential store.
    #[instrument(skip(self, token))]
    pub async fn authenticate(&self, token: &str) -> Result<User> {
        let user_id = validate_token(token, &self.jwt_secret).map_err(|e| {
            warn!(error = %e, "Rejected bearer token");
            DomainError::Unauthenticated("Not authorized, token failed".to_string())
        })?;

        let user = self
            .user_repository
            .find_user_by_id(&user_id)
            .await?
            .ok_or_else(|| {
                warn!(user_id = %user_id, "Token refers to unknown user");
                DomainError::Unauthenticated("Not authorized, user not found".to_string())
            })?;

        trace!(user_id = %user.id, "Bearer token accepted");
        Ok(user)
    }

    #[instrument(skip(self), fields(user_id = user_id))]
    pub async fn get_profile(&self, user_id: &str) -> Result<User> {
        self.user_repository
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| {
                warn!(user_id = user_id, "Profile requested for missing user");
                DomainError::NotFound("User not found".to_string()).into()
            })
    }

    #[instrument(skip(self, update), fields(user_id = user_id))]
    pub async fn update_profile(&self, user_id: &str, update: UpdateProfile) -> Result<User> {
        let mut user = self.get_profile(user_id).await?;
        user.apply_profile_update(update);
        self.user_repository.save_user(user.clone()).await?;
        info!(user_id = %user.id, "Profile updated");
        Ok(user)
    }

    fn issue_token(&self, user_id: &str) -> Result<String> {
        generate_token(user_id, &self.jwt_secret, self.token_ttl_secs).map_err(|e| {
            error!(error = %e, "Failed to generate token");
            DomainError::Internal(format!("Failed to generate token: {}", e)).into()
        })
    }
}
