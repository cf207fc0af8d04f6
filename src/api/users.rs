//! User endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::auth::Identity;
use super::error::{ApiError, ApiJson};
use crate::db::{AdminUpdateUserRequest, CreateUserRequest, UpdateUserRequest, UserResponse, UserStats};
use crate::AppState;

/// GET /api/v1/users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = state.facade.get_all_users().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// POST /api/v1/users - public registration, never grants admin
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    ApiJson(mut req): ApiJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    req.is_admin = false;
    let user = state.facade.create_user(req).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// GET /api/v1/users/:id
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .facade
        .get_user(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(user.into()))
}

/// PUT /api/v1/users/:id
///
/// Users edit their own profile; editing anyone else goes through the
/// admin-gated path.
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    identity: Identity,
    ApiJson(req): ApiJson<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = if identity.id == id {
        state.facade.update_user(&id, req).await?
    } else {
        state
            .facade
            .admin_update_user(
                &identity.id,
                &id,
                AdminUpdateUserRequest {
                    user: req,
                    is_admin: None,
                },
            )
            .await?
    };
    Ok(Json(user.into()))
}

/// GET /api/v1/users/:id/stats
pub async fn get_user_stats(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<UserStats>, ApiError> {
    Ok(Json(state.facade.get_user_stats(&id).await?))
}
