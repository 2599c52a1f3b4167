//! User account and authentication service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use validator::Validate;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{SignupRequest, User, UserClaims},
    repository::Repository,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: AuthConfig,
}

impl UsersService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Register a new user account
    pub async fn signup(&self, request: &SignupRequest) -> AppResult<User> {
        request
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        if self.repository.users.username_exists(&request.username).await? {
            return Err(AppError::Conflict("Username already taken".to_string()));
        }

        let password_hash = self.hash_password(&request.password)?;

        self.repository
            .users
            .create(
                &request.username,
                &password_hash,
                &request.name,
                request.phone.as_deref(),
                &request.user_type,
            )
            .await
    }

    /// Authenticate and return a JWT token with the user
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<(String, User)> {
        let user = self
            .repository
            .users
            .get_by_username(username)
            .await?
            .ok_or_else(|| {
                AppError::Authentication("Invalid username or password".to_string())
            })?;

        if !self.verify_password(&user, password)? {
            return Err(AppError::Authentication(
                "Invalid username or password".to_string(),
            ));
        }

        let now = Utc::now().timestamp();
        let claims = UserClaims {
            sub: user.username.clone(),
            user_id: user.id,
            is_staff: user.is_staff,
            exp: now + (self.config.jwt_expiration_hours as i64 * 3600),
            iat: now,
        };

        let token = claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))?;

        Ok((token, user))
    }

    /// Get a user by id
    pub async fn get_by_id(&self, user_id: i32) -> AppResult<User> {
        self.repository.users.get_by_id(user_id).await
    }

    fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
    }

    fn verify_password(&self, user: &User, password: &str) -> AppResult<bool> {
        let parsed = PasswordHash::new(&user.password_hash)
            .map_err(|e| AppError::Internal(format!("Invalid stored password hash: {}", e)))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}
