//! Book (catalog entry) model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

/// Circulation status of a book.
///
/// A cached projection of the active rental/reservation state, recomputed
/// by every mutating circulation path via [`derive_book_status`].
/// `Unavailable` is set only by the catalog (damaged, lost, reference-only
/// holdings) and never derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookStatus {
    Available,
    Rented,
    Reserved,
    Unavailable,
}

impl BookStatus {
    /// Stored string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::Available => "AVAILABLE",
            BookStatus::Rented => "RENTED",
            BookStatus::Reserved => "RESERVED",
            BookStatus::Unavailable => "UNAVAILABLE",
        }
    }
}

impl From<&str> for BookStatus {
    fn from(s: &str) -> Self {
        match s {
            "RENTED" => BookStatus::Rented,
            "RESERVED" => BookStatus::Reserved,
            "UNAVAILABLE" => BookStatus::Unavailable,
            _ => BookStatus::Available,
        }
    }
}

/// Recompute a circulating book's status from what is currently active.
///
/// The single source of the status-projection rule: an active rental wins,
/// then an active reservation, else the book is free. Every path that
/// mutates a rental or reservation must go through this.
pub fn derive_book_status(active_rental: bool, active_reservation: bool) -> BookStatus {
    if active_rental {
        BookStatus::Rented
    } else if active_reservation {
        BookStatus::Reserved
    } else {
        BookStatus::Available
    }
}

/// Book model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    /// Unique holdings registration code
    pub book_code: String,
    pub title: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub isbn: Option<String>,
    pub issn: Option<String>,
    pub callnumber: Option<String>,
    pub location: Option<String>,
    pub edition: Option<String>,
    pub description: Option<String>,
    pub status: String,
    pub cover_url: Option<String>,
}

impl Book {
    pub fn status(&self) -> BookStatus {
        BookStatus::from(self.status.as_str())
    }
}

/// Compact book representation for list views
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookSummary {
    pub id: i32,
    pub book_code: String,
    pub title: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub status: String,
    pub cover_url: Option<String>,
}

/// Book detail with metadata and social counters
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookDetails {
    #[serde(flatten)]
    pub book: Book,
    /// Derived MARC JSON, if a record is attached
    pub marc: Option<serde_json::Value>,
    pub like_count: i64,
    pub review_count: i64,
}

/// Create/update payload for catalog maintenance
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpsertBook {
    pub book_code: String,
    pub title: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub isbn: Option<String>,
    pub issn: Option<String>,
    pub callnumber: Option<String>,
    pub location: Option<String>,
    pub edition: Option<String>,
    pub description: Option<String>,
    pub cover_url: Option<String>,
}

/// Catalog search parameters
#[derive(Debug, Deserialize, IntoParams)]
pub struct BookQuery {
    /// Search term matched against code, ISBN, title, author and publisher
    pub q: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Paginated book listing
#[derive(Debug, Serialize, ToSchema)]
pub struct BookPage {
    pub items: Vec<BookSummary>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_status_rental_wins() {
        assert_eq!(derive_book_status(true, false), BookStatus::Rented);
        assert_eq!(derive_book_status(true, true), BookStatus::Rented);
    }

    #[test]
    fn test_derive_status_reservation_next() {
        assert_eq!(derive_book_status(false, true), BookStatus::Reserved);
    }

    #[test]
    fn test_derive_status_free() {
        assert_eq!(derive_book_status(false, false), BookStatus::Available);
    }

    #[test]
    fn test_status_string_round_trip() {
        for status in [
            BookStatus::Available,
            BookStatus::Rented,
            BookStatus::Reserved,
            BookStatus::Unavailable,
        ] {
            assert_eq!(BookStatus::from(status.as_str()), status);
        }
    }
}
