//! Reviews repository for database operations

use chrono::Utc;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::review::{CreateReview, Review, ReviewDetails, ReviewPage, ReviewQuery, UpdateReview},
};

#[derive(Clone)]
pub struct ReviewsRepository {
    pool: Pool<Postgres>,
}

impl ReviewsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get review by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Review> {
        sqlx::query_as::<_, Review>("SELECT * FROM reviews WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Review with id {} not found", id)))
    }

    /// List reviews with filters and pagination, newest first
    pub async fn list(&self, query: &ReviewQuery) -> AppResult<ReviewPage> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(10).clamp(1, 100);

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM reviews
            WHERE ($1::int IS NULL OR book_id = $1)
              AND ($2::int IS NULL OR user_id = $2)
            "#,
        )
        .bind(query.book_id)
        .bind(query.user_id)
        .fetch_one(&self.pool)
        .await?;

        let items = sqlx::query_as::<_, ReviewDetails>(
            r#"
            SELECT r.id, r.user_id, r.book_id, u.username, r.content, r.rating,
                   r.created_at, r.updated_at
            FROM reviews r
            JOIN users u ON r.user_id = u.id
            WHERE ($1::int IS NULL OR r.book_id = $1)
              AND ($2::int IS NULL OR r.user_id = $2)
            ORDER BY r.created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(query.book_id)
        .bind(query.user_id)
        .bind(per_page)
        .bind((page - 1) * per_page)
        .fetch_all(&self.pool)
        .await?;

        Ok(ReviewPage {
            items,
            total,
            page,
            per_page,
        })
    }

    /// Create a review. The unique (book, user) constraint rejects a
    /// second review from the same user.
    pub async fn create(&self, user_id: i32, review: &CreateReview) -> AppResult<Review> {
        let created = sqlx::query_as::<_, Review>(
            r#"
            INSERT INTO reviews (user_id, book_id, content, rating)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(review.book_id)
        .bind(&review.content)
        .bind(review.rating)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    /// Update content and/or rating
    pub async fn update(&self, id: i32, update: &UpdateReview) -> AppResult<Review> {
        sqlx::query_as::<_, Review>(
            r#"
            UPDATE reviews
            SET content = COALESCE($1, content),
                rating = COALESCE($2, rating),
                updated_at = $3
            WHERE id = $4
            RETURNING *
            "#,
        )
        .bind(&update.content)
        .bind(update.rating)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Review with id {} not found", id)))
    }

    /// Delete a review
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Review with id {} not found", id)));
        }
        Ok(())
    }
}
