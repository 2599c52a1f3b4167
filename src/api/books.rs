//! Catalog endpoints: search, detail, maintenance, likes and reserving

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{
        book::{Book, BookDetails, BookPage, BookQuery, BookSummary, UpsertBook},
        reservation::Reservation,
    },
};

use super::AuthenticatedUser;

/// Like toggle response
#[derive(Serialize, ToSchema)]
pub struct LikeResponse {
    /// Whether the like is now set
    pub liked: bool,
}

/// List/search the catalog
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    params(BookQuery),
    responses(
        (status = 200, description = "Paginated book list", body = BookPage),
        (status = 400, description = "Search term too short")
    )
)]
pub async fn list_books(
    State(state): State<crate::AppState>,
    Query(query): Query<BookQuery>,
) -> AppResult<Json<BookPage>> {
    let page = state.services.books.search(&query).await?;
    Ok(Json(page))
}

/// Book detail with MARC metadata and counters
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book detail", body = BookDetails),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<crate::AppState>,
    Path(book_id): Path<i32>,
) -> AppResult<Json<BookDetails>> {
    let details = state.services.books.get_details(book_id).await?;
    Ok(Json(details))
}

/// Create a catalog entry (staff only)
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = UpsertBook,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 409, description = "Registration code already exists")
    )
)]
pub async fn create_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<UpsertBook>,
) -> AppResult<(StatusCode, Json<Book>)> {
    claims.require_staff()?;
    let book = state.services.books.create(&request).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// Update a catalog entry (staff only)
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    request_body = UpsertBook,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 404, description = "Book not found")
    )
)]
pub async fn update_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(book_id): Path<i32>,
    Json(request): Json<UpsertBook>,
) -> AppResult<Json<Book>> {
    claims.require_staff()?;
    let book = state.services.books.update(book_id, &request).await?;
    Ok(Json(book))
}

/// Delete a catalog entry (staff only)
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn delete_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(book_id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_staff()?;
    state.services.books.delete(book_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Toggle a like on a book
#[utoipa::path(
    post,
    path = "/books/{id}/like",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Like toggled", body = LikeResponse),
        (status = 404, description = "Book not found")
    )
)]
pub async fn toggle_like(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(book_id): Path<i32>,
) -> AppResult<Json<LikeResponse>> {
    let liked = state.services.books.toggle_like(claims.user_id, book_id).await?;
    Ok(Json(LikeResponse { liked }))
}

/// Books liked by the current user
#[utoipa::path(
    get,
    path = "/books/liked",
    tag = "books",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Liked books", body = Vec<BookSummary>)
    )
)]
pub async fn liked_books(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<BookSummary>>> {
    let books = state.services.books.liked_books(claims.user_id).await?;
    Ok(Json(books))
}

/// Reserve a borrowed book
#[utoipa::path(
    post,
    path = "/books/{id}/reserve",
    tag = "reservations",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 201, description = "Reservation created", body = Reservation),
        (status = 404, description = "Book not found"),
        (status = 422, description = "Book not reservable, duplicate or limit reached")
    )
)]
pub async fn reserve_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(book_id): Path<i32>,
) -> AppResult<(StatusCode, Json<Reservation>)> {
    let reservation = state
        .services
        .reservations
        .create_reservation(claims.user_id, book_id)
        .await?;
    Ok((StatusCode::CREATED, Json(reservation)))
}
