//! Administrator endpoints.
//!
//! Each handler passes the caller's id to an `admin_*` facade method, which
//! checks the stored admin flag before touching anything.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::auth::Identity;
use super::error::{ApiError, ApiJson};
use crate::db::{
    AdminStats, AdminUpdateUserRequest, Amenity, CreateAmenityRequest, CreateUserRequest, Place,
    Review, UpdateAmenityRequest, UpdatePlaceRequest, UpdateReviewRequest, UserResponse,
};
use crate::AppState;

fn deleted_or_not_found(removed: bool, entity: &str) -> Result<StatusCode, ApiError> {
    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(format!("{} not found", entity)))
    }
}

/// POST /api/v1/admin/users - may create other admins
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    ApiJson(req): ApiJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let user = state.facade.admin_create_user(&identity.id, req).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// PUT /api/v1/admin/users/:id
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    identity: Identity,
    ApiJson(req): ApiJson<AdminUpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .facade
        .admin_update_user(&identity.id, &id, req)
        .await?;
    Ok(Json(user.into()))
}

/// DELETE /api/v1/admin/users/:id
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    identity: Identity,
) -> Result<StatusCode, ApiError> {
    let removed = state.facade.admin_delete_user(&identity.id, &id).await?;
    deleted_or_not_found(removed, "User")
}

/// PUT /api/v1/admin/places/:id
pub async fn update_place(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    identity: Identity,
    ApiJson(req): ApiJson<UpdatePlaceRequest>,
) -> Result<Json<Place>, ApiError> {
    let place = state
        .facade
        .admin_update_place(&identity.id, &id, req)
        .await?;
    Ok(Json(place))
}

/// DELETE /api/v1/admin/places/:id
pub async fn delete_place(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    identity: Identity,
) -> Result<StatusCode, ApiError> {
    let removed = state.facade.admin_delete_place(&identity.id, &id).await?;
    deleted_or_not_found(removed, "Place")
}

/// POST /api/v1/admin/places/:id/amenities/:amenity_id
pub async fn add_place_amenity(
    State(state): State<Arc<AppState>>,
    Path((id, amenity_id)): Path<(String, String)>,
    identity: Identity,
) -> Result<StatusCode, ApiError> {
    state
        .facade
        .admin_add_place_amenity(&identity.id, &id, &amenity_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/admin/places/:id/amenities/:amenity_id
pub async fn remove_place_amenity(
    State(state): State<Arc<AppState>>,
    Path((id, amenity_id)): Path<(String, String)>,
    identity: Identity,
) -> Result<StatusCode, ApiError> {
    let removed = state
        .facade
        .admin_remove_place_amenity(&identity.id, &id, &amenity_id)
        .await?;
    deleted_or_not_found(removed, "Amenity link")
}

/// POST /api/v1/admin/amenities
pub async fn create_amenity(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    ApiJson(req): ApiJson<CreateAmenityRequest>,
) -> Result<(StatusCode, Json<Amenity>), ApiError> {
    let amenity = state.facade.admin_create_amenity(&identity.id, req).await?;
    Ok((StatusCode::CREATED, Json(amenity)))
}

/// PUT /api/v1/admin/amenities/:id
pub async fn update_amenity(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    identity: Identity,
    ApiJson(req): ApiJson<UpdateAmenityRequest>,
) -> Result<Json<Amenity>, ApiError> {
    let amenity = state
        .facade
        .admin_update_amenity(&identity.id, &id, req)
        .await?;
    Ok(Json(amenity))
}

/// DELETE /api/v1/admin/amenities/:id
pub async fn delete_amenity(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    identity: Identity,
) -> Result<StatusCode, ApiError> {
    let removed = state.facade.admin_delete_amenity(&identity.id, &id).await?;
    deleted_or_not_found(removed, "Amenity")
}

/// PUT /api/v1/admin/reviews/:id
pub async fn update_review(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    identity: Identity,
    ApiJson(req): ApiJson<UpdateReviewRequest>,
) -> Result<Json<Review>, ApiError> {
    let review = state
        .facade
        .admin_update_review(&identity.id, &id, req)
        .await?;
    Ok(Json(review))
}

/// DELETE /api/v1/admin/reviews/:id
pub async fn delete_review(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    identity: Identity,
) -> Result<StatusCode, ApiError> {
    let removed = state.facade.admin_delete_review(&identity.id, &id).await?;
    deleted_or_not_found(removed, "Review")
}

/// GET /api/v1/admin/stats
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<Json<AdminStats>, ApiError> {
    Ok(Json(state.facade.admin_get_stats(&identity.id).await?))
}
