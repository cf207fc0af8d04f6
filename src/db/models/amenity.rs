//! Amenity models and DTOs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection};

use super::common::{require_non_blank, Record, ValidationError};
use crate::db::Entity;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Amenity {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub record: Record,
    pub name: String,
}

impl Amenity {
    pub fn new(name: &str) -> Result<Self, ValidationError> {
        let amenity = Self {
            record: Record::new(),
            name: name.trim().to_string(),
        };
        amenity.validate()?;
        Ok(amenity)
    }

    pub async fn find_by_name(
        conn: &mut SqliteConnection,
        name: &str,
    ) -> Result<Option<Amenity>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM amenities WHERE name = ?")
            .bind(name)
            .fetch_optional(conn)
            .await
    }

    /// Amenities linked to a place, in name order
    pub async fn find_for_place(
        conn: &mut SqliteConnection,
        place_id: &str,
    ) -> Result<Vec<Amenity>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT a.* FROM amenities a
            JOIN place_amenities pa ON pa.amenity_id = a.id
            WHERE pa.place_id = ?
            ORDER BY a.name ASC
            "#,
        )
        .bind(place_id)
        .fetch_all(conn)
        .await
    }
}

#[async_trait]
impl Entity for Amenity {
    const TABLE: &'static str = "amenities";
    const NAME: &'static str = "Amenity";

    type Changes = UpdateAmenityRequest;

    fn record(&self) -> &Record {
        &self.record
    }

    fn record_mut(&mut self) -> &mut Record {
        &mut self.record
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank("name", &self.name)
    }

    fn apply(&mut self, changes: UpdateAmenityRequest) {
        if let Some(name) = changes.name {
            self.name = name.trim().to_string();
        }
    }

    async fn insert(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO amenities (id, name, created_at, updated_at) VALUES (?, ?, ?, ?)")
            .bind(&self.record.id)
            .bind(&self.name)
            .bind(&self.record.created_at)
            .bind(&self.record.updated_at)
            .execute(conn)
            .await?;
        Ok(())
    }

    async fn save(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE amenities SET name = ?, updated_at = ? WHERE id = ?")
            .bind(&self.name)
            .bind(&self.record.updated_at)
            .bind(&self.record.id)
            .execute(conn)
            .await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateAmenityRequest {
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateAmenityRequest {
    pub name: Option<String>,
}
