//! Rental lifecycle service

use crate::{
    config::CirculationConfig,
    error::AppResult,
    models::rental::{BorrowPenalty, Rental, RentalDetails, RentalStats},
    repository::Repository,
};

#[derive(Clone)]
pub struct RentalsService {
    repository: Repository,
    policy: CirculationConfig,
}

impl RentalsService {
    pub fn new(repository: Repository, policy: CirculationConfig) -> Self {
        Self { repository, policy }
    }

    /// Borrow the book identified by its registration code
    pub async fn create_rental(&self, user_id: i32, book_code: &str) -> AppResult<Rental> {
        self.repository.users.get_by_id(user_id).await?;
        self.repository
            .rentals
            .create(user_id, book_code.trim(), &self.policy)
            .await
    }

    /// Return a rental; the acting user must own it unless they are staff
    pub async fn return_rental(
        &self,
        rental_id: i32,
        acting_user: i32,
        is_staff: bool,
    ) -> AppResult<Rental> {
        let rental = self.repository.rentals.get_by_id(rental_id).await?;
        if rental.user_id != acting_user && !is_staff {
            return Err(crate::error::AppError::Authorization(
                "Cannot return another user's rental".to_string(),
            ));
        }
        self.repository
            .rentals
            .return_rental(rental_id, &self.policy)
            .await
    }

    /// Rentals of a user; `status` accepts "active" or "returned"
    pub async fn list_for_user(
        &self,
        user_id: i32,
        status: Option<&str>,
    ) -> AppResult<Vec<RentalDetails>> {
        let returned = match status {
            Some("active") => Some(false),
            Some("returned") => Some(true),
            _ => None,
        };
        self.repository.rentals.list_for_user(user_id, returned).await
    }

    /// Open rentals of a user
    pub async fn current_for_user(&self, user_id: i32) -> AppResult<Vec<RentalDetails>> {
        self.repository.rentals.list_for_user(user_id, Some(false)).await
    }

    /// Currently-overdue rentals of a user
    pub async fn overdue_for_user(&self, user_id: i32) -> AppResult<Vec<RentalDetails>> {
        self.repository.rentals.list_overdue_for_user(user_id).await
    }

    /// Borrowing penalty of a user, if any
    pub async fn penalty_for_user(&self, user_id: i32) -> AppResult<Option<BorrowPenalty>> {
        self.repository.rentals.get_penalty(user_id).await
    }

    /// Aggregate counters for the staff dashboard
    pub async fn stats(&self) -> AppResult<RentalStats> {
        self.repository.rentals.stats().await
    }
}
