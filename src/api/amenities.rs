//! Amenity endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::auth::Identity;
use super::error::{ApiError, ApiJson};
use crate::db::{Amenity, CreateAmenityRequest, UpdateAmenityRequest};
use crate::AppState;

/// GET /api/v1/amenities
pub async fn list_amenities(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Amenity>>, ApiError> {
    Ok(Json(state.facade.get_all_amenities().await?))
}

/// POST /api/v1/amenities - any authenticated user
pub async fn create_amenity(
    State(state): State<Arc<AppState>>,
    _identity: Identity,
    ApiJson(req): ApiJson<CreateAmenityRequest>,
) -> Result<(StatusCode, Json<Amenity>), ApiError> {
    let amenity = state.facade.create_amenity(req).await?;
    Ok((StatusCode::CREATED, Json(amenity)))
}

/// GET /api/v1/amenities/:id
pub async fn get_amenity(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Amenity>, ApiError> {
    let amenity = state
        .facade
        .get_amenity(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Amenity not found"))?;
    Ok(Json(amenity))
}

/// PUT /api/v1/amenities/:id - admins only
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
