//! Catalog service

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookDetails, BookPage, BookQuery, BookSummary, UpsertBook},
    repository::Repository,
};

/// Minimum length of a free-text search term
const MIN_SEARCH_LEN: usize = 2;

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
}

impl BooksService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Search the catalog. Short search terms are rejected rather than
    /// silently matching most of the collection.
    pub async fn search(&self, query: &BookQuery) -> AppResult<BookPage> {
        if let Some(q) = query.q.as_deref() {
            let q = q.trim();
            if !q.is_empty() && q.chars().count() < MIN_SEARCH_LEN {
                return Err(AppError::Validation(format!(
                    "Search term must be at least {} characters",
                    MIN_SEARCH_LEN
                )));
            }
        }
        self.repository.books.search(query).await
    }

    /// Book detail with MARC JSON and counters
    pub async fn get_details(&self, book_id: i32) -> AppResult<BookDetails> {
        self.repository.books.get_details(book_id).await
    }

    pub async fn create(&self, book: &UpsertBook) -> AppResult<Book> {
        self.repository.books.create(book).await
    }

    pub async fn update(&self, book_id: i32, book: &UpsertBook) -> AppResult<Book> {
        self.repository.books.update(book_id, book).await
    }

    pub async fn delete(&self, book_id: i32) -> AppResult<()> {
        self.repository.books.delete(book_id).await
    }

    /// Toggle a like; returns true when the like is now set
    pub async fn toggle_like(&self, user_id: i32, book_id: i32) -> AppResult<bool> {
        self.repository.books.toggle_like(user_id, book_id).await
    }

    /// Books liked by the user
    pub async fn liked_books(&self, user_id: i32) -> AppResult<Vec<BookSummary>> {
        self.repository.books.liked_by_user(user_id).await
    }
}
