//! Place (listing) models and DTOs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection};

use super::amenity::Amenity;
use super::common::{nullable, require_in_range, require_non_blank, Record, ValidationError};
use super::review::Review;
use super::user::UserResponse;
use crate::db::Entity;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Place {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub record: Record,
    pub title: String,
    pub description: Option<String>,
    pub price: f64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub owner_id: String,
}

impl Place {
    /// Build a validated place owned by `owner_id`
    pub fn new(req: &CreatePlaceRequest, owner_id: &str) -> Result<Self, ValidationError> {
        let place = Self {
            record: Record::new(),
            title: req.title.trim().to_string(),
            description: req.description.clone(),
            price: req.price,
            latitude: req.latitude,
            longitude: req.longitude,
            owner_id: owner_id.to_string(),
        };
        place.validate()?;
        Ok(place)
    }

    pub async fn count_by_owner(
        conn: &mut SqliteConnection,
        owner_id: &str,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM places WHERE owner_id = ?")
            .bind(owner_id)
            .fetch_one(conn)
            .await
    }

    pub async fn find_by_owner(
        conn: &mut SqliteConnection,
        owner_id: &str,
    ) -> Result<Vec<Place>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM places WHERE owner_id = ? ORDER BY created_at, rowid")
            .bind(owner_id)
            .fetch_all(conn)
            .await
    }

    /// Link an amenity. Returns false if the link already existed.
    pub async fn link_amenity(
        conn: &mut SqliteConnection,
        place_id: &str,
        amenity_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("INSERT OR IGNORE INTO place_amenities (place_id, amenity_id) VALUES (?, ?)")
                .bind(place_id)
                .bind(amenity_id)
                .execute(conn)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Unlink an amenity. Returns false if there was no link.
    pub async fn unlink_amenity(
        conn: &mut SqliteConnection,
        place_id: &str,
        amenity_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM place_amenities WHERE place_id = ? AND amenity_id = ?")
            .bind(place_id)
            .bind(amenity_id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn clear_amenities(
        conn: &mut SqliteConnection,
        place_id: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM place_amenities WHERE place_id = ?")
            .bind(place_id)
            .execute(conn)
            .await?;
        Ok(())
    }
}

/// Allow-listed scalar place mutations. `id` and `owner_id` never change.
/// For the optional columns `Some(None)` clears the stored value.
#[derive(Debug, Default, Clone)]
pub struct PlaceChanges {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub price: Option<f64>,
    pub latitude: Option<Option<f64>>,
    pub longitude: Option<Option<f64>>,
}

#[async_trait]
impl Entity for Place {
    const TABLE: &'static str = "places";
    const NAME: &'static str = "Place";

    type Changes = PlaceChanges;

    fn record(&self) -> &Record {
        &self.record
    }

    fn record_mut(&mut self) -> &mut Record {
        &mut self.record
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank("title", &self.title)?;
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(ValidationError::new("price", "price must be a non-negative number"));
        }
        if let Some(latitude) = self.latitude {
            require_in_range("latitude", latitude, -90.0, 90.0)?;
        }
        if let Some(longitude) = self.longitude {
            require_in_range("longitude", longitude, -180.0, 180.0)?;
        }
        Ok(())
    }

    fn apply(&mut self, changes: PlaceChanges) {
        if let Some(title) = changes.title {
            self.title = title.trim().to_string();
        }
        if let Some(description) = changes.description {
            self.description = description;
        }
        if let Some(price) = changes.price {
            self.price = price;
        }
        if let Some(latitude) = changes.latitude {
            self.latitude = latitude;
        }
        if let Some(longitude) = changes.longitude {
            self.longitude = longitude;
        }
    }

    async fn insert(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO places (id, title, description, price, latitude, longitude, owner_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&self.record.id)
        .bind(&self.title)
        .bind(&self.description)
        .bind(self.price)
        .bind(self.latitude)
        .bind(self.longitude)
        .bind(&self.owner_id)
        .bind(&self.record.created_at)
        .bind(&self.record.updated_at)
        .execute(conn)
        .await?;
        Ok(())
    }

    async fn save(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE places SET
                title = ?,
                description = ?,
                price = ?,
                latitude = ?,
                longitude = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&self.title)
        .bind(&self.description)
        .bind(self.price)
        .bind(self.latitude)
        .bind(self.longitude)
        .bind(&self.record.updated_at)
        .bind(&self.record.id)
        .execute(conn)
        .await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePlaceRequest {
    pub title: String,
    pub description: Option<String>,
    pub price: f64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub amenity_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePlaceRequest {
    pub title: Option<String>,
    /// `null` clears the description
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "nullable")]
    pub latitude: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub longitude: Option<Option<f64>>,
    /// Replaces the whole amenity set when present
    pub amenity_ids: Option<Vec<String>>,
}

impl UpdatePlaceRequest {
    /// Split into scalar changes and the optional amenity replacement list
    pub fn into_parts(self) -> (PlaceChanges, Option<Vec<String>>) {
        (
            PlaceChanges {
                title: self.title,
                description: self.description,
                price: self.price,
                latitude: self.latitude,
                longitude: self.longitude,
            },
            self.amenity_ids,
        )
    }
}

/// Search filters; absent filters impose no constraint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaceFilters {
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    /// A place matches if it has at least one of these amenities
    #[serde(default)]
    pub amenities: Vec<String>,
    /// Minimum average review rating
    pub rating_min: Option<f64>,
    /// Bounding box centre and half-width in degrees. All three or none.
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub radius: Option<f64>,
}

impl PlaceFilters {
    /// `(latitude, longitude, radius)` when a location filter is requested
    pub fn location(&self) -> Result<Option<(f64, f64, f64)>, ValidationError> {
        match (self.latitude, self.longitude, self.radius) {
            (None, None, None) => Ok(None),
            (Some(latitude), Some(longitude), Some(radius)) => {
                require_in_range("latitude", latitude, -90.0, 90.0)?;
                require_in_range("longitude", longitude, -180.0, 180.0)?;
                require_in_range("radius", radius, 0.0, 360.0)?;
                Ok(Some((latitude, longitude, radius)))
            }
            _ => Err(ValidationError::new(
                "radius",
                "latitude, longitude and radius must be given together",
            )),
        }
    }
}

/// Place with its owner, amenities and reviews for detail views
#[derive(Debug, Clone, Serialize)]
pub struct PlaceDetails {
    #[serde(flatten)]
    pub place: Place,
    pub owner: Option<UserResponse>,
    pub amenities: Vec<Amenity>,
    pub reviews: Vec<Review>,
}
