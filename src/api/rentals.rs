//! Rental lifecycle endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::AppResult,
    models::rental::{BorrowPenalty, Rental, RentalDetails, RentalStats},
};

use super::AuthenticatedUser;

/// Create rental request
#[derive(Deserialize, ToSchema)]
pub struct CreateRentalRequest {
    /// Registration code of the book to borrow
    pub code: String,
}

/// Rental listing filters
#[derive(Deserialize, IntoParams)]
pub struct RentalListQuery {
    /// "active" or "returned"
    pub status: Option<String>,
}

/// Return response
#[derive(Serialize, ToSchema)]
pub struct ReturnResponse {
    pub status: String,
    pub rental: Rental,
}

/// Borrow a book by registration code
#[utoipa::path(
    post,
    path = "/rentals",
    tag = "rentals",
    security(("bearer_auth" = [])),
    request_body = CreateRentalRequest,
    responses(
        (status = 201, description = "Rental created", body = Rental),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Lost the race for the last copy"),
        (status = 422, description = "A circulation rule blocks this borrow")
    )
)]
pub async fn create_rental(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateRentalRequest>,
) -> AppResult<(StatusCode, Json<Rental>)> {
    let rental = state
        .services
        .rentals
        .create_rental(claims.user_id, &request.code)
        .await?;
    Ok((StatusCode::CREATED, Json(rental)))
}

/// Return a borrowed book
#[utoipa::path(
    post,
    path = "/rentals/{id}/return",
    tag = "rentals",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Rental ID")),
    responses(
        (status = 200, description = "Book returned", body = ReturnResponse),
        (status = 404, description = "Rental not found"),
        (status = 422, description = "Already returned")
    )
)]
pub async fn return_rental(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(rental_id): Path<i32>,
) -> AppResult<Json<ReturnResponse>> {
    let rental = state
        .services
        .rentals
        .return_rental(rental_id, claims.user_id, claims.is_staff)
        .await?;

    Ok(Json(ReturnResponse {
        status: "returned".to_string(),
        rental,
    }))
}

/// List the current user's rentals
#[utoipa::path(
    get,
    path = "/rentals",
    tag = "rentals",
    security(("bearer_auth" = [])),
    params(RentalListQuery),
    responses(
        (status = 200, description = "Rentals of the current user", body = Vec<RentalDetails>)
    )
)]
pub async fn list_my_rentals(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<RentalListQuery>,
) -> AppResult<Json<Vec<RentalDetails>>> {
    let rentals = state
        .services
        .rentals
        .list_for_user(claims.user_id, query.status.as_deref())
        .await?;
    Ok(Json(rentals))
}

/// Open rentals of the current user
#[utoipa::path(
    get,
    path = "/rentals/current",
    tag = "rentals",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Open rentals", body = Vec<RentalDetails>)
    )
)]
pub async fn current_rentals(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<RentalDetails>>> {
    let rentals = state.services.rentals.current_for_user(claims.user_id).await?;
    Ok(Json(rentals))
}

/// Overdue rentals of the current user
#[utoipa::path(
    get,
    path = "/rentals/overdue",
    tag = "rentals",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Overdue rentals", body = Vec<RentalDetails>)
    )
)]
pub async fn overdue_rentals(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<RentalDetails>>> {
    let rentals = state.services.rentals.overdue_for_user(claims.user_id).await?;
    Ok(Json(rentals))
}

/// Current user's borrowing penalty, if any
#[utoipa::path(
    get,
    path = "/rentals/penalty",
    tag = "rentals",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Penalty, or null when not penalized", body = Option<BorrowPenalty>)
    )
)]
pub async fn my_penalty(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Option<BorrowPenalty>>> {
    let penalty = state.services.rentals.penalty_for_user(claims.user_id).await?;
    Ok(Json(penalty))
}

/// Rental statistics (staff only)
#[utoipa::path(
    get,
    path = "/rentals/stats",
    tag = "rentals",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Rental counters", body = RentalStats),
        (status = 403, description = "Staff privileges required")
    )
)]
pub async fn rental_stats(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<RentalStats>> {
    claims.require_staff()?;
    let stats = state.services.rentals.stats().await?;
    Ok(Json(stats))
}
