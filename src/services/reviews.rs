//! Review service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::review::{CreateReview, Review, ReviewPage, ReviewQuery, UpdateReview},
    repository::Repository,
};

#[derive(Clone)]
pub struct ReviewsService {
    repository: Repository,
}

impl ReviewsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self, query: &ReviewQuery) -> AppResult<ReviewPage> {
        self.repository.reviews.list(query).await
    }

    /// Create a review for a book; one per user per book
    pub async fn create(&self, user_id: i32, review: &CreateReview) -> AppResult<Review> {
        review
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        // Reject unknown books with 404 instead of a foreign-key error
        self.repository.books.get_by_id(review.book_id).await?;
        self.repository.reviews.create(user_id, review).await
    }

    /// Update a review; only the author or staff may do so
    pub async fn update(
        &self,
        review_id: i32,
        update: &UpdateReview,
        acting_user: i32,
        is_staff: bool,
    ) -> AppResult<Review> {
        update
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        let review = self.repository.reviews.get_by_id(review_id).await?;
        if review.user_id != acting_user && !is_staff {
            return Err(AppError::Authorization(
                "Cannot modify another user's review".to_string(),
            ));
        }
        self.repository.reviews.update(review_id, update).await
    }

    /// Delete a review; only the author or staff may do so
    pub async fn delete(&self, review_id: i32, acting_user: i32, is_staff: bool) -> AppResult<()> {
        let review = self.repository.reviews.get_by_id(review_id).await?;
        if review.user_id != acting_user && !is_staff {
            return Err(AppError::Authorization(
                "Cannot delete another user's review".to_string(),
            ));
        }
        self.repository.reviews.delete(review_id).await
    }
}
