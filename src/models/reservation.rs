//! Reservation model and state machine

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::book::BookSummary;

/// Reservation state.
///
/// `Active → Canceled` (user action) and `Active → Expired` (time-based,
/// sweep or lazy check) are the only transitions; both targets are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Active,
    Canceled,
    Expired,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Active => "ACTIVE",
            ReservationStatus::Canceled => "CANCELED",
            ReservationStatus::Expired => "EXPIRED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ReservationStatus::Active)
    }
}

impl From<&str> for ReservationStatus {
    fn from(s: &str) -> Self {
        match s {
            "CANCELED" => ReservationStatus::Canceled,
            "EXPIRED" => ReservationStatus::Expired,
            _ => ReservationStatus::Active,
        }
    }
}

/// Reservation model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Reservation {
    pub id: i32,
    pub user_id: i32,
    pub book_id: i32,
    pub reservation_date: DateTime<Utc>,
    /// Pickup deadline, assigned when the reservation is promoted on a
    /// book return
    pub due_date: Option<NaiveDate>,
    pub cancel_date: Option<DateTime<Utc>>,
    pub status: String,
}

impl Reservation {
    pub fn status(&self) -> ReservationStatus {
        ReservationStatus::from(self.status.as_str())
    }
}

/// Reservation with book summary for list views
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReservationDetails {
    pub id: i32,
    pub reservation_date: DateTime<Utc>,
    pub due_date: Option<NaiveDate>,
    pub cancel_date: Option<DateTime<Utc>>,
    pub status: String,
    pub book: BookSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!ReservationStatus::Active.is_terminal());
        assert!(ReservationStatus::Canceled.is_terminal());
        assert!(ReservationStatus::Expired.is_terminal());
    }

    #[test]
    fn test_status_string_round_trip() {
        for status in [
            ReservationStatus::Active,
            ReservationStatus::Canceled,
            ReservationStatus::Expired,
        ] {
            assert_eq!(ReservationStatus::from(status.as_str()), status);
        }
    }
}
