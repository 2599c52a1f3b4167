//! Reservations repository: queueing claims on borrowed books
//!
//! Creation and cancellation run in single transactions; the expiry sweep
//! is an idempotent conditional bulk update safe to run repeatedly.

use chrono::Utc;
use sqlx::{Pool, Postgres, Row};

use crate::{
    config::CirculationConfig,
    error::{AppError, AppResult, ErrorCode},
    models::{
        book::{derive_book_status, Book, BookStatus, BookSummary},
        reservation::{Reservation, ReservationDetails, ReservationStatus},
    },
};

#[derive(Clone)]
pub struct ReservationsRepository {
    pool: Pool<Postgres>,
}

impl ReservationsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get reservation by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Reservation> {
        sqlx::query_as::<_, Reservation>("SELECT * FROM reservations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Reservation with id {} not found", id)))
    }

    /// Queue a claim on a currently-unavailable book.
    ///
    /// Only books that are on loan or already reserved can be reserved;
    /// the book status does not change on creation.
    pub async fn create(
        &self,
        user_id: i32,
        book_id: i32,
        policy: &CirculationConfig,
    ) -> AppResult<Reservation> {
        let mut tx = self.pool.begin().await?;

        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1 FOR UPDATE")
            .bind(book_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", book_id)))?;

        if !matches!(book.status(), BookStatus::Rented | BookStatus::Reserved) {
            return Err(AppError::rule(
                ErrorCode::NotReservable,
                "Only books currently on loan or reserved can be reserved",
            ));
        }

        let duplicate: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM reservations WHERE user_id = $1 AND book_id = $2 AND status = 'ACTIVE')",
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_one(&mut *tx)
        .await?;

        if duplicate {
            return Err(AppError::rule(
                ErrorCode::DuplicateReservation,
                "An active reservation for this book already exists",
            ));
        }

        let active_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM reservations WHERE user_id = $1 AND status = 'ACTIVE'",
        )
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        if active_count >= policy.reservation_limit_per_user {
            return Err(AppError::rule(
                ErrorCode::ReservationLimitReached,
                format!(
                    "Reservation limit reached ({}/{})",
                    active_count, policy.reservation_limit_per_user
                ),
            ));
        }

        let reservation = sqlx::query_as::<_, Reservation>(
            r#"
            INSERT INTO reservations (user_id, book_id, reservation_date, status)
            VALUES ($1, $2, $3, 'ACTIVE')
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(reservation_id = reservation.id, user_id, book_id, "reservation created");
        Ok(reservation)
    }

    /// Cancel an active reservation.
    ///
    /// Returns false without touching anything when the reservation is
    /// already canceled or expired. On success the book status is
    /// re-derived from the remaining active rentals and reservations.
    pub async fn cancel(&self, reservation_id: i32) -> AppResult<bool> {
        let mut tx = self.pool.begin().await?;

        let reservation = sqlx::query_as::<_, Reservation>(
            "SELECT * FROM reservations WHERE id = $1 FOR UPDATE",
        )
        .bind(reservation_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Reservation with id {} not found", reservation_id))
        })?;

        if reservation.status().is_terminal() {
            return Ok(false);
        }

        sqlx::query(
            "UPDATE reservations SET status = $1, cancel_date = $2 WHERE id = $3",
        )
        .bind(ReservationStatus::Canceled.as_str())
        .bind(Utc::now())
        .bind(reservation_id)
        .execute(&mut *tx)
        .await?;

        let active_rental: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM rentals WHERE book_id = $1 AND NOT is_returned)",
        )
        .bind(reservation.book_id)
        .fetch_one(&mut *tx)
        .await?;

        let active_reservation: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM reservations WHERE book_id = $1 AND status = 'ACTIVE')",
        )
        .bind(reservation.book_id)
        .fetch_one(&mut *tx)
        .await?;

        let status = derive_book_status(active_rental, active_reservation);
        sqlx::query("UPDATE books SET status = $1 WHERE id = $2")
            .bind(status.as_str())
            .bind(reservation.book_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(reservation_id, book_id = reservation.book_id, "reservation canceled");
        Ok(true)
    }

    /// Expire all active reservations whose pickup deadline has passed.
    ///
    /// Eventually-consistent reconciliation: the conditional updates only
    /// touch rows still meeting the overdue predicate, so overlapping or
    /// repeated runs find nothing further to change. Returns the number of
    /// reservations expired.
    pub async fn sweep_expired(&self) -> AppResult<u64> {
        let today = Utc::now().date_naive();

        let expired = sqlx::query(
            "UPDATE reservations SET status = 'EXPIRED' WHERE status = 'ACTIVE' AND due_date < $1",
        )
        .bind(today)
        .execute(&self.pool)
        .await?
        .rows_affected();

        // Reconcile books left RESERVED with no remaining claim
        let freed = sqlx::query(
            r#"
            UPDATE books b SET status = 'AVAILABLE'
            WHERE b.status = 'RESERVED'
              AND NOT EXISTS (SELECT 1 FROM reservations r
                              WHERE r.book_id = b.id AND r.status = 'ACTIVE')
              AND NOT EXISTS (SELECT 1 FROM rentals l
                              WHERE l.book_id = b.id AND NOT l.is_returned)
            "#,
        )
        .execute(&self.pool)
        .await?
        .rows_affected();

        tracing::info!(expired, freed, "reservation expiry sweep complete");
        Ok(expired)
    }

    /// Lazily expire one user's overdue reservations before a read.
    ///
    /// Same predicate as the sweep, scoped to one user; idempotent. Book
    /// reconciliation is left to the periodic sweep.
    pub async fn expire_for_user(&self, user_id: i32) -> AppResult<u64> {
        let today = Utc::now().date_naive();
        let expired = sqlx::query(
            "UPDATE reservations SET status = 'EXPIRED' WHERE user_id = $1 AND status = 'ACTIVE' AND due_date < $2",
        )
        .bind(user_id)
        .bind(today)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(expired)
    }

    /// List reservations for a user, newest first, optionally by status
    pub async fn list_for_user(
        &self,
        user_id: i32,
        status: Option<ReservationStatus>,
    ) -> AppResult<Vec<ReservationDetails>> {
        let rows = sqlx::query(
            r#"
            SELECT r.id, r.reservation_date, r.due_date, r.cancel_date, r.status,
                   b.id as b_id, b.book_code, b.title, b.author, b.publisher,
                   b.status as book_status, b.cover_url
            FROM reservations r
            JOIN books b ON r.book_id = b.id
            WHERE r.user_id = $1
              AND ($2::text IS NULL OR r.status = $2)
            ORDER BY r.reservation_date DESC
            "#,
        )
        .bind(user_id)
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| ReservationDetails {
                id: row.get("id"),
                reservation_date: row.get("reservation_date"),
                due_date: row.get("due_date"),
                cancel_date: row.get("cancel_date"),
                status: row.get("status"),
                book: BookSummary {
                    id: row.get("b_id"),
                    book_code: row.get("book_code"),
                    title: row.get("title"),
                    author: row.get("author"),
                    publisher: row.get("publisher"),
                    status: row.get("book_status"),
                    cover_url: row.get("cover_url"),
                },
            })
            .collect())
    }
}
