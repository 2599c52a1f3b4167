//! User model, authentication claims and request types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::error::AppError;

/// User model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i32,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub phone: Option<String>,
    /// Membership category (enrolled, on-leave, other-department)
    pub user_type: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub created_at: DateTime<Utc>,
}

/// Public user representation
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserInfo {
    pub id: i32,
    pub username: String,
    pub name: String,
    pub phone: Option<String>,
    pub user_type: String,
    pub is_staff: bool,
}

impl From<User> for UserInfo {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            name: u.name,
            phone: u.phone,
            user_type: u.user_type,
            is_staff: u.is_staff,
        }
    }
}

/// Signup request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SignupRequest {
    #[validate(length(min = 3, max = 20, message = "username must be 3-20 characters"))]
    pub username: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 20, message = "name must be 1-20 characters"))]
    pub name: String,
    #[validate(length(max = 20, message = "phone must be at most 20 characters"))]
    pub phone: Option<String>,
    pub user_type: String,
}

/// JWT Claims for authenticated users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub user_id: i32,
    pub is_staff: bool,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn require_staff(&self) -> Result<(), AppError> {
        if self.is_staff {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "Staff privileges required".to_string(),
            ))
        }
    }
}
