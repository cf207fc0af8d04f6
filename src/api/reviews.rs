//! Review endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::auth::Identity;
use super::error::{ApiError, ApiJson};
use crate::db::{CreateReviewRequest, Review, UpdateReviewRequest};
use crate::AppState;

/// GET /api/v1/reviews
pub async fn list_reviews(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Review>>, ApiError> {
    Ok(Json(state.facade.get_all_reviews().await?))
}

/// POST /api/v1/reviews - the caller is the author
pub async fn create_review(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    ApiJson(req): ApiJson<CreateReviewRequest>,
) -> Result<(StatusCode, Json<Review>), ApiError> {
    let review = state.facade.create_review(req, &identity.id).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

/// GET /api/v1/reviews/:id
pub async fn get_review(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Review>, ApiError> {
    let review = state
        .facade
        .get_review(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Review not found"))?;
    Ok(Json(review))
}

/// PUT /api/v1/reviews/:id - author only
pub async fn update_review(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    identity: Identity,
    ApiJson(req): ApiJson<UpdateReviewRequest>,
) -> Result<Json<Review>, ApiError> {
    let review = state
        .facade
        .update_review(&id, req, Some(&identity.id))
        .await?;
    Ok(Json(review))
}

/// DELETE /api/v1/reviews/:id - author only
pub async fn delete_review(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    identity: Identity,
) -> Result<StatusCode, ApiError> {
    if !state.facade.delete_review(&id, Some(&identity.id)).await? {
        return Err(ApiError::not_found("Review not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}
