//! Review model and request types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Review model from database; one per (book, user)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Review {
    pub id: i32,
    pub user_id: i32,
    pub book_id: i32,
    pub content: String,
    /// 1-5 rating
    pub rating: i16,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Review with the author's username for list views
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct ReviewDetails {
    pub id: i32,
    pub user_id: i32,
    pub book_id: i32,
    pub username: String,
    pub content: String,
    pub rating: i16,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create review request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateReview {
    pub book_id: i32,
    #[validate(length(min = 1, message = "content must not be empty"))]
    pub content: String,
    #[validate(range(min = 1, max = 5, message = "rating must be between 1 and 5"))]
    pub rating: i16,
}

/// Update review request (owner or staff)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateReview {
    #[validate(length(min = 1, message = "content must not be empty"))]
    pub content: Option<String>,
    #[validate(range(min = 1, max = 5, message = "rating must be between 1 and 5"))]
    pub rating: Option<i16>,
}

/// Review listing filters
#[derive(Debug, Deserialize, IntoParams)]
pub struct ReviewQuery {
    pub book_id: Option<i32>,
    pub user_id: Option<i32>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Paginated review listing, newest first
#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewPage {
    pub items: Vec<ReviewDetails>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}
