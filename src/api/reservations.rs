//! Reservation endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::AppResult,
    models::reservation::{ReservationDetails, ReservationStatus},
};

use super::AuthenticatedUser;

/// Reservation listing filters
#[derive(Deserialize, IntoParams)]
pub struct ReservationListQuery {
    /// ACTIVE, CANCELED or EXPIRED
    pub status: Option<String>,
}

/// Cancel response
#[derive(Serialize, ToSchema)]
pub struct CancelResponse {
    /// False when the reservation was already canceled or expired
    pub changed: bool,
    pub status: String,
}

/// Sweep response (staff only)
#[derive(Serialize, ToSchema)]
pub struct SweepResponse {
    /// Number of reservations moved to EXPIRED
    pub expired: u64,
}

/// List the current user's reservations
#[utoipa::path(
    get,
    path = "/reservations",
    tag = "reservations",
    security(("bearer_auth" = [])),
    params(ReservationListQuery),
    responses(
        (status = 200, description = "Reservations of the current user", body = Vec<ReservationDetails>)
    )
)]
pub async fn list_my_reservations(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<ReservationListQuery>,
) -> AppResult<Json<Vec<ReservationDetails>>> {
    let status = query
        .status
        .as_deref()
        .map(|s| ReservationStatus::from(s.to_uppercase().as_str()));
    let reservations = state
        .services
        .reservations
        .list_for_user(claims.user_id, status)
        .await?;
    Ok(Json(reservations))
}

/// Cancel a reservation
#[utoipa::path(
    post,
    path = "/reservations/{id}/cancel",
    tag = "reservations",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Reservation ID")),
    responses(
        (status = 200, description = "Cancel outcome; repeat calls are harmless", body = CancelResponse),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Reservation not found")
    )
)]
pub async fn cancel_reservation(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(reservation_id): Path<i32>,
) -> AppResult<Json<CancelResponse>> {
    let changed = state
        .services
        .reservations
        .cancel_reservation(reservation_id, claims.user_id, claims.is_staff)
        .await?;

    Ok(Json(CancelResponse {
        changed,
        status: if changed { "canceled" } else { "unchanged" }.to_string(),
    }))
}

/// Expire all overdue reservations (staff only)
#[utoipa::path(
    post,
    path = "/reservations/sweep",
    tag = "reservations",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Sweep complete", body = SweepResponse),
        (status = 403, description = "Staff privileges required")
    )
)]
pub async fn sweep_reservations(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<SweepResponse>> {
    claims.require_staff()?;
    let expired = state.services.reservations.sweep_expired().await?;
    Ok(Json(SweepResponse { expired }))
}
