//! Place endpoints, including amenity links and per-place reviews.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::Identity;
use super::error::{ApiError, ApiJson, ApiQuery};
use crate::db::{
    Amenity, CreatePlaceRequest, Place, PlaceDetails, PlaceFilters, PlaceStats, Review,
    UpdatePlaceRequest,
};
use crate::AppState;

/// Query string for GET /places. `amenities` is a comma-separated id list;
/// `latitude`, `longitude` and `radius` select a bounding box.
#[derive(Debug, Default, Deserialize)]
pub struct PlaceQuery {
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub amenities: Option<String>,
    pub rating_min: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub radius: Option<f64>,
}

impl From<PlaceQuery> for PlaceFilters {
    fn from(query: PlaceQuery) -> Self {
        let amenities = query
            .amenities
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            price_min: query.price_min,
            price_max: query.price_max,
            amenities,
            rating_min: query.rating_min,
            latitude: query.latitude,
            longitude: query.longitude,
            radius: query.radius,
        }
    }
}

/// GET /api/v1/places
pub async fn list_places(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<PlaceQuery>,
) -> Result<Json<Vec<Place>>, ApiError> {
    let filters = PlaceFilters::from(query);
    Ok(Json(state.facade.search_places(&filters).await?))
}

/// POST /api/v1/places - the caller becomes the owner
pub async fn create_place(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    ApiJson(req): ApiJson<CreatePlaceRequest>,
) -> Result<(StatusCode, Json<Place>), ApiError> {
    let place = state.facade.create_place(req, &identity.id).await?;
    Ok((StatusCode::CREATED, Json(place)))
}

/// GET /api/v1/places/:id
pub async fn get_place(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PlaceDetails>, ApiError> {
    let details = state
        .facade
        .get_place_details(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Place not found"))?;
    Ok(Json(details))
}

/// PUT /api/v1/places/:id - owner only
pub async fn update_place(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    identity: Identity,
    ApiJson(req): ApiJson<UpdatePlaceRequest>,
) -> Result<Json<Place>, ApiError> {
    let place = state
        .facade
        .update_place(&id, req, Some(&identity.id))
        .await?;
    Ok(Json(place))
}

/// DELETE /api/v1/places/:id - owner only
pub async fn delete_place(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    identity: Identity,
) -> Result<StatusCode, ApiError> {
    if !state.facade.delete_place(&id, Some(&identity.id)).await? {
        return Err(ApiError::not_found("Place not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/places/:id/reviews
pub async fn list_place_reviews(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Review>>, ApiError> {
    Ok(Json(state.facade.get_place_reviews(&id).await?))
}

/// GET /api/v1/places/:id/stats
pub async fn get_place_stats(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PlaceStats>, ApiError> {
    Ok(Json(state.facade.get_place_stats(&id).await?))
}

/// GET /api/v1/places/:id/amenities
pub async fn list_place_amenities(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Amenity>>, ApiError> {
    Ok(Json(state.facade.get_place_amenities(&id).await?))
}

/// POST /api/v1/places/:id/amenities/:amenity_id - owner only
pub async fn add_place_amenity(
    State(state): State<Arc<AppState>>,
    Path((id, amenity_id)): Path<(String, String)>,
    identity: Identity,
) -> Result<Json<Vec<Amenity>>, ApiError> {
    state
        .facade
        .add_place_amenity(&id, &amenity_id, Some(&identity.id))
        .await?;
    Ok(Json(state.facade.get_place_amenities(&id).await?))
}

/// DELETE /api/v1/places/:id/amenities/:amenity_id - owner only
pub async fn remove_place_amenity(
    State(state): State<Arc<AppState>>,
    Path((id, amenity_id)): Path<(String, String)>,
    identity: Identity,
) -> Result<StatusCode, ApiError> {
    if !state
        .facade
        .remove_place_amenity(&id, &amenity_id, Some(&identity.id))
        .await?
    {
        return Err(ApiError::not_found("Amenity is not linked to this place"));
    }
    Ok(StatusCode::NO_CONTENT)
}
