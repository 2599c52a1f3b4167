//! Reservation lifecycle service

use crate::{
    config::CirculationConfig,
    error::AppResult,
    models::reservation::{Reservation, ReservationDetails, ReservationStatus},
    repository::Repository,
};

#[derive(Clone)]
pub struct ReservationsService {
    repository: Repository,
    policy: CirculationConfig,
}

impl ReservationsService {
    pub fn new(repository: Repository, policy: CirculationConfig) -> Self {
        Self { repository, policy }
    }

    /// Queue a claim on a borrowed or reserved book
    pub async fn create_reservation(&self, user_id: i32, book_id: i32) -> AppResult<Reservation> {
        self.repository
            .reservations
            .create(user_id, book_id, &self.policy)
            .await
    }

    /// Cancel a reservation; idempotent, returns whether anything changed.
    /// The acting user must own it unless they are staff.
    pub async fn cancel_reservation(
        &self,
        reservation_id: i32,
        acting_user: i32,
        is_staff: bool,
    ) -> AppResult<bool> {
        let reservation = self.repository.reservations.get_by_id(reservation_id).await?;
        if reservation.user_id != acting_user && !is_staff {
            return Err(crate::error::AppError::Authorization(
                "Cannot cancel another user's reservation".to_string(),
            ));
        }
        self.repository.reservations.cancel(reservation_id).await
    }

    /// Expire all overdue active reservations; returns the count expired
    pub async fn sweep_expired(&self) -> AppResult<u64> {
        self.repository.reservations.sweep_expired().await
    }

    /// Reservations of a user, with a lazy expiry pass first so the
    /// listing never shows an ACTIVE reservation past its deadline
    pub async fn list_for_user(
        &self,
        user_id: i32,
        status: Option<ReservationStatus>,
    ) -> AppResult<Vec<ReservationDetails>> {
        self.repository.reservations.expire_for_user(user_id).await?;
        self.repository.reservations.list_for_user(user_id, status).await
    }
}
