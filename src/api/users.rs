//! Account endpoints: signup, login, current user

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::user::{SignupRequest, UserInfo},
};

use super::AuthenticatedUser;

/// Login request
#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response with bearer token
#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserInfo,
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/users/signup",
    tag = "users",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = UserInfo),
        (status = 409, description = "Username already taken"),
        (status = 422, description = "Validation failed")
    )
)]
pub async fn signup(
    State(state): State<crate::AppState>,
    Json(request): Json<SignupRequest>,
) -> AppResult<(StatusCode, Json<UserInfo>)> {
    let user = state.services.users.signup(&request).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Authenticate and obtain a JWT
#[utoipa::path(
    post,
    path = "/users/login",
    tag = "users",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<crate::AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let (token, user) = state
        .services
        .users
        .authenticate(&request.username, &request.password)
        .await?;
    Ok(Json(LoginResponse {
        token,
        user: user.into(),
    }))
}

/// Current authenticated user
#[utoipa::path(
    get,
    path = "/users/me",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = UserInfo),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn me(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<UserInfo>> {
    let user = state.services.users.get_by_id(claims.user_id).await?;
    Ok(Json(user.into()))
}
