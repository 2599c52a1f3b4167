//! Review endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::review::{CreateReview, Review, ReviewPage, ReviewQuery, UpdateReview},
};

use super::AuthenticatedUser;

/// List reviews, filterable by book or author
#[utoipa::path(
    get,
    path = "/reviews",
    tag = "reviews",
    params(ReviewQuery),
    responses(
        (status = 200, description = "Paginated reviews, newest first", body = ReviewPage)
    )
)]
pub async fn list_reviews(
    State(state): State<crate::AppState>,
    Query(query): Query<ReviewQuery>,
) -> AppResult<Json<ReviewPage>> {
    let page = state.services.reviews.list(&query).await?;
    Ok(Json(page))
}

/// Post a review for a book
#[utoipa::path(
    post,
    path = "/reviews",
    tag = "reviews",
    security(("bearer_auth" = [])),
    request_body = CreateReview,
    responses(
        (status = 201, description = "Review created", body = Review),
        (status = 404, description = "Book not found"),
        (status = 409, description = "User already reviewed this book")
    )
)]
pub async fn create_review(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateReview>,
) -> AppResult<(StatusCode, Json<Review>)> {
    let review = state.services.reviews.create(claims.user_id, &request).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

/// Edit a review (author or staff)
#[utoipa::path(
    put,
    path = "/reviews/{id}",
    tag = "reviews",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Review ID")),
    request_body = UpdateReview,
    responses(
        (status = 200, description = "Review updated", body = Review),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Review not found")
    )
)]
pub async fn update_review(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(review_id): Path<i32>,
    Json(request): Json<UpdateReview>,
) -> AppResult<Json<Review>> {
    let review = state
        .services
        .reviews
        .update(review_id, &request, claims.user_id, claims.is_staff)
        .await?;
    Ok(Json(review))
}

/// Delete a review (author or staff)
#[utoipa::path(
    delete,
    path = "/reviews/{id}",
    tag = "reviews",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Review ID")),
    responses(
        (status = 204, description = "Review deleted"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Review not found")
    )
)]
pub async fn delete_review(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(review_id): Path<i32>,
) -> AppResult<StatusCode> {
    state
        .services
        .reviews
        .delete(review_id, claims.user_id, claims.is_staff)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
