//! Rentals repository: borrow/return transactions and penalties
//!
//! Every state-changing operation wraps its reads-then-writes in one
//! transaction. The partial unique index on active rentals is the final
//! arbiter against races; the in-transaction checks exist for early,
//! specific rejection messages.

use chrono::{Duration, NaiveDate, Utc};
use sqlx::{Pool, Postgres, Row};

use crate::{
    config::CirculationConfig,
    error::{AppError, AppResult, ErrorCode},
    models::{
        book::{derive_book_status, Book, BookStatus, BookSummary},
        rental::{next_penalty_until, BorrowPenalty, Rental, RentalDetails, RentalStats},
    },
};

#[derive(Clone)]
pub struct RentalsRepository {
    pool: Pool<Postgres>,
}

impl RentalsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get rental by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Rental> {
        sqlx::query_as::<_, Rental>("SELECT * FROM rentals WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Rental with id {} not found", id)))
    }

    /// Create a rental for the book identified by its registration code.
    ///
    /// Constraints are checked in order; the first violation aborts with
    /// its specific reason code and no partial state is written.
    pub async fn create(
        &self,
        user_id: i32,
        book_code: &str,
        policy: &CirculationConfig,
    ) -> AppResult<Rental> {
        let today = Utc::now().date_naive();
        let mut tx = self.pool.begin().await?;

        // Lock the book row so concurrent borrows of the same copy serialize
        let book = sqlx::query_as::<_, Book>(
            "SELECT * FROM books WHERE book_code = $1 FOR UPDATE",
        )
        .bind(book_code)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No book with code {}", book_code)))?;

        let penalty_until: Option<NaiveDate> = sqlx::query_scalar(
            "SELECT penalty_until FROM borrow_penalties WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(until) = penalty_until {
            if today < until {
                return Err(AppError::rule(
                    ErrorCode::UnderPenalty,
                    format!("Borrowing suspended until {}", until),
                ));
            }
        }

        let has_overdue: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM rentals WHERE user_id = $1 AND NOT is_returned AND due_date < $2)",
        )
        .bind(user_id)
        .bind(today)
        .fetch_one(&mut *tx)
        .await?;

        if has_overdue {
            return Err(AppError::rule(
                ErrorCode::OverdueRentalExists,
                "An overdue rental must be returned first",
            ));
        }

        let active_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM rentals WHERE user_id = $1 AND NOT is_returned",
        )
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        if active_count >= policy.rental_limit_per_user {
            return Err(AppError::rule(
                ErrorCode::RentalLimitReached,
                format!(
                    "Rental limit reached ({}/{})",
                    active_count, policy.rental_limit_per_user
                ),
            ));
        }

        let book_on_loan: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM rentals WHERE book_id = $1 AND NOT is_returned)",
        )
        .bind(book.id)
        .fetch_one(&mut *tx)
        .await?;

        if book_on_loan {
            return Err(AppError::rule(
                ErrorCode::AlreadyRented,
                "Book is already on loan",
            ));
        }

        if book.status() != BookStatus::Available {
            return Err(AppError::rule(
                ErrorCode::BookNotAvailable,
                "Book cannot be borrowed right now",
            ));
        }

        let due_date = today + Duration::days(policy.rental_days);

        let rental = sqlx::query_as::<_, Rental>(
            r#"
            INSERT INTO rentals (user_id, book_id, rental_date, due_date, is_returned)
            VALUES ($1, $2, $3, $4, false)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(book.id)
        .bind(today)
        .bind(due_date)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE books SET status = $1 WHERE id = $2")
            .bind(BookStatus::Rented.as_str())
            .bind(book.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(rental_id = rental.id, user_id, book_code, "rental created");
        Ok(rental)
    }

    /// Return a rental.
    ///
    /// Marks the rental returned, stacks an overdue penalty when the due
    /// date has passed, then either promotes the oldest active reservation
    /// (assigning its pickup deadline) or frees the book. Atomic: any
    /// failure leaves the loan open.
    pub async fn return_rental(
        &self,
        rental_id: i32,
        policy: &CirculationConfig,
    ) -> AppResult<Rental> {
        let today = Utc::now().date_naive();
        let mut tx = self.pool.begin().await?;

        let rental = sqlx::query_as::<_, Rental>(
            "SELECT * FROM rentals WHERE id = $1 FOR UPDATE",
        )
        .bind(rental_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Rental with id {} not found", rental_id)))?;

        if rental.is_returned {
            return Err(AppError::rule(
                ErrorCode::AlreadyReturned,
                "Rental has already been returned",
            ));
        }

        let rental = sqlx::query_as::<_, Rental>(
            r#"
            UPDATE rentals SET is_returned = true, return_date = $1
            WHERE id = $2
            RETURNING *
            "#,
        )
        .bind(today)
        .bind(rental_id)
        .fetch_one(&mut *tx)
        .await?;

        if today > rental.due_date {
            let overdue_days = (today - rental.due_date).num_days();

            let existing: Option<NaiveDate> = sqlx::query_scalar(
                "SELECT penalty_until FROM borrow_penalties WHERE user_id = $1 FOR UPDATE",
            )
            .bind(rental.user_id)
            .fetch_optional(&mut *tx)
            .await?;

            let penalty_until = next_penalty_until(existing, today, overdue_days);

            sqlx::query(
                r#"
                INSERT INTO borrow_penalties (user_id, penalty_until)
                VALUES ($1, $2)
                ON CONFLICT (user_id) DO UPDATE SET penalty_until = EXCLUDED.penalty_until
                "#,
            )
            .bind(rental.user_id)
            .bind(penalty_until)
            .execute(&mut *tx)
            .await?;

            tracing::info!(
                user_id = rental.user_id,
                overdue_days,
                %penalty_until,
                "overdue return, penalty extended"
            );
        }

        // Promote the oldest active reservation (FIFO), or free the book
        let next_reservation: Option<i32> = sqlx::query_scalar(
            r#"
            SELECT id FROM reservations
            WHERE book_id = $1 AND status = 'ACTIVE'
            ORDER BY reservation_date
            LIMIT 1
            FOR UPDATE
            "#,
        )
        .bind(rental.book_id)
        .fetch_optional(&mut *tx)
        .await?;

        let next_status = derive_book_status(false, next_reservation.is_some());

        if let Some(reservation_id) = next_reservation {
            let pickup_due = today + Duration::days(policy.reservation_days);
            sqlx::query("UPDATE reservations SET due_date = $1 WHERE id = $2")
                .bind(pickup_due)
                .bind(reservation_id)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query("UPDATE books SET status = $1 WHERE id = $2")
            .bind(next_status.as_str())
            .bind(rental.book_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(rental_id, book_id = rental.book_id, "rental returned");
        Ok(rental)
    }

    /// List rentals for a user, optionally filtered by returned state
    pub async fn list_for_user(
        &self,
        user_id: i32,
        returned: Option<bool>,
    ) -> AppResult<Vec<RentalDetails>> {
        let rows = sqlx::query(
            r#"
            SELECT r.id, r.user_id, r.rental_date, r.due_date, r.return_date, r.is_returned,
                   b.id as b_id, b.book_code, b.title, b.author, b.publisher, b.status, b.cover_url
            FROM rentals r
            JOIN books b ON r.book_id = b.id
            WHERE r.user_id = $1
              AND ($2::boolean IS NULL OR r.is_returned = $2)
            ORDER BY r.rental_date DESC, r.id DESC
            "#,
        )
        .bind(user_id)
        .bind(returned)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Self::row_to_details).collect())
    }

    /// List currently-overdue rentals for a user
    pub async fn list_overdue_for_user(&self, user_id: i32) -> AppResult<Vec<RentalDetails>> {
        let today = Utc::now().date_naive();
        let rows = sqlx::query(
            r#"
            SELECT r.id, r.user_id, r.rental_date, r.due_date, r.return_date, r.is_returned,
                   b.id as b_id, b.book_code, b.title, b.author, b.publisher, b.status, b.cover_url
            FROM rentals r
            JOIN books b ON r.book_id = b.id
            WHERE r.user_id = $1 AND NOT r.is_returned AND r.due_date < $2
            ORDER BY r.due_date
            "#,
        )
        .bind(user_id)
        .bind(today)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Self::row_to_details).collect())
    }

    fn row_to_details(row: sqlx::postgres::PgRow) -> RentalDetails {
        let today = Utc::now().date_naive();
        let due_date: NaiveDate = row.get("due_date");
        let is_returned: bool = row.get("is_returned");
        let is_overdue = !is_returned && due_date < today;

        RentalDetails {
            id: row.get("id"),
            user_id: row.get("user_id"),
            rental_date: row.get("rental_date"),
            due_date,
            return_date: row.get("return_date"),
            is_returned,
            is_overdue,
            overdue_days: if is_overdue {
                (today - due_date).num_days()
            } else {
                0
            },
            book: BookSummary {
                id: row.get("b_id"),
                book_code: row.get("book_code"),
                title: row.get("title"),
                author: row.get("author"),
                publisher: row.get("publisher"),
                status: row.get("status"),
                cover_url: row.get("cover_url"),
            },
        }
    }

    /// Current borrowing penalty for a user, if any
    pub async fn get_penalty(&self, user_id: i32) -> AppResult<Option<BorrowPenalty>> {
        let penalty = sqlx::query_as::<_, BorrowPenalty>(
            "SELECT * FROM borrow_penalties WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(penalty)
    }

    /// Aggregate rental counters for the staff dashboard
    pub async fn stats(&self) -> AppResult<RentalStats> {
        let today = Utc::now().date_naive();
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) as total,
                   COUNT(*) FILTER (WHERE NOT is_returned) as active,
                   COUNT(*) FILTER (WHERE NOT is_returned AND due_date < $1) as overdue
            FROM rentals
            "#,
        )
        .bind(today)
        .fetch_one(&self.pool)
        .await?;

        Ok(RentalStats {
            total_rentals: row.get("total"),
            active_rentals: row.get("active"),
            overdue_rentals: row.get("overdue"),
        })
    }
}
