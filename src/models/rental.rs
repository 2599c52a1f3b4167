//! Rental (borrow transaction) model and penalty types

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::book::BookSummary;

/// Rental model from database.
///
/// Created on a successful borrow and mutated exactly once on return;
/// `is_returned` is one-way.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Rental {
    pub id: i32,
    pub user_id: i32,
    pub book_id: i32,
    pub rental_date: NaiveDate,
    pub due_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub is_returned: bool,
}

impl Rental {
    /// An open rental past its due date
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.is_returned && self.due_date < today
    }

    pub fn overdue_days(&self, today: NaiveDate) -> i64 {
        if self.is_overdue(today) {
            (today - self.due_date).num_days()
        } else {
            0
        }
    }
}

/// Rental with book summary for list views
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RentalDetails {
    pub id: i32,
    pub user_id: i32,
    pub rental_date: NaiveDate,
    pub due_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub is_returned: bool,
    pub is_overdue: bool,
    pub overdue_days: i64,
    pub book: BookSummary,
}

/// Borrowing suspension after an overdue return (1:1 per user).
///
/// Created lazily on the first overdue return and extended on subsequent
/// ones; `in_penalty` holds while today is before `penalty_until`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BorrowPenalty {
    pub id: i32,
    pub user_id: i32,
    pub penalty_until: NaiveDate,
}

impl BorrowPenalty {
    pub fn in_penalty(&self, today: NaiveDate) -> bool {
        today < self.penalty_until
    }
}

/// Compute the penalty end date after an overdue return.
///
/// Overdue days stack onto whatever penalty is still running: the new
/// suspension extends from the later of today and the existing end date,
/// never resetting time already owed.
pub fn next_penalty_until(
    existing: Option<NaiveDate>,
    today: NaiveDate,
    overdue_days: i64,
) -> NaiveDate {
    let base = match existing {
        Some(until) if until > today => until,
        _ => today,
    };
    base + Duration::days(overdue_days)
}

/// Aggregate counters for the staff dashboard
#[derive(Debug, Serialize, ToSchema)]
pub struct RentalStats {
    pub total_rentals: i64,
    pub active_rentals: i64,
    pub overdue_rentals: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_penalty_from_today_when_none_exists() {
        let today = day(2025, 3, 10);
        assert_eq!(next_penalty_until(None, today, 3), day(2025, 3, 13));
    }

    #[test]
    fn test_penalty_stacks_on_running_penalty() {
        let today = day(2025, 3, 10);
        let existing = Some(day(2025, 3, 15));
        assert_eq!(next_penalty_until(existing, today, 4), day(2025, 3, 19));
    }

    #[test]
    fn test_penalty_ignores_expired_penalty() {
        let today = day(2025, 3, 10);
        let existing = Some(day(2025, 3, 1));
        assert_eq!(next_penalty_until(existing, today, 2), day(2025, 3, 12));
    }

    #[test]
    fn test_overdue_days() {
        let rental = Rental {
            id: 1,
            user_id: 1,
            book_id: 1,
            rental_date: day(2025, 3, 1),
            due_date: day(2025, 3, 15),
            return_date: None,
            is_returned: false,
        };
        assert_eq!(rental.overdue_days(day(2025, 3, 15)), 0);
        assert_eq!(rental.overdue_days(day(2025, 3, 18)), 3);
    }

    #[test]
    fn test_returned_rental_never_overdue() {
        let rental = Rental {
            id: 1,
            user_id: 1,
            book_id: 1,
            rental_date: day(2025, 3, 1),
            due_date: day(2025, 3, 5),
            return_date: Some(day(2025, 3, 20)),
            is_returned: true,
        };
        assert!(!rental.is_overdue(day(2025, 3, 20)));
    }

    #[test]
    fn test_in_penalty_boundary() {
        let penalty = BorrowPenalty {
            id: 1,
            user_id: 1,
            penalty_until: day(2025, 3, 10),
        };
        assert!(penalty.in_penalty(day(2025, 3, 9)));
        // suspension ends on the end date itself
        assert!(!penalty.in_penalty(day(2025, 3, 10)));
    }
}
