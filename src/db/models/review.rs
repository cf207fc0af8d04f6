//! Review models and DTOs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection};

use super::common::{require_non_blank, Record, ValidationError};
use crate::db::Entity;

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Review {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub record: Record,
    pub text: String,
    pub rating: i64,
    pub user_id: String,
    pub place_id: String,
}

impl Review {
    /// Build a validated review authored by `user_id`
    pub fn new(req: &CreateReviewRequest, user_id: &str) -> Result<Self, ValidationError> {
        let review = Self {
            record: Record::new(),
            text: req.text.trim().to_string(),
            rating: req.rating,
            user_id: user_id.to_string(),
            place_id: req.place_id.clone(),
        };
        review.validate()?;
        Ok(review)
    }

    pub async fn find_by_place(
        conn: &mut SqliteConnection,
        place_id: &str,
    ) -> Result<Vec<Review>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM reviews WHERE place_id = ? ORDER BY created_at, rowid")
            .bind(place_id)
            .fetch_all(conn)
            .await
    }

    pub async fn count_by_user(
        conn: &mut SqliteConnection,
        user_id: &str,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(conn)
            .await
    }

    pub async fn find_by_user(
        conn: &mut SqliteConnection,
        user_id: &str,
    ) -> Result<Vec<Review>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM reviews WHERE user_id = ? ORDER BY created_at, rowid")
            .bind(user_id)
            .fetch_all(conn)
            .await
    }

    pub async fn find_by_user_and_place(
        conn: &mut SqliteConnection,
        user_id: &str,
        place_id: &str,
    ) -> Result<Option<Review>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM reviews WHERE user_id = ? AND place_id = ?")
            .bind(user_id)
            .bind(place_id)
            .fetch_optional(conn)
            .await
    }
}

#[async_trait]
impl Entity for Review {
    const TABLE: &'static str = "reviews";
    const NAME: &'static str = "Review";

    type Changes = UpdateReviewRequest;

    fn record(&self) -> &Record {
        &self.record
    }

    fn record_mut(&mut self) -> &mut Record {
        &mut self.record
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank("text", &self.text)?;
        if !(MIN_RATING..=MAX_RATING).contains(&self.rating) {
            return Err(ValidationError::new(
                "rating",
                format!("rating must be between {} and {}", MIN_RATING, MAX_RATING),
            ));
        }
        Ok(())
    }

    fn apply(&mut self, changes: UpdateReviewRequest) {
        if let Some(text) = changes.text {
            self.text = text.trim().to_string();
        }
        if let Some(rating) = changes.rating {
            self.rating = rating;
        }
    }

    async fn insert(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO reviews (id, text, rating, user_id, place_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&self.record.id)
        .bind(&self.text)
        .bind(self.rating)
        .bind(&self.user_id)
        .bind(&self.place_id)
        .bind(&self.record.created_at)
        .bind(&self.record.updated_at)
        .execute(conn)
        .await?;
        Ok(())
    }

    async fn save(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE reviews SET text = ?, rating = ?, updated_at = ? WHERE id = ?")
            .bind(&self.text)
            .bind(self.rating)
            .bind(&self.record.updated_at)
            .bind(&self.record.id)
            .execute(conn)
            .await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateReviewRequest {
    pub text: String,
    pub rating: i64,
    pub place_id: String,
}

/// Only text and rating are mutable; place and author are fixed at creation
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateReviewRequest {
    pub text: Option<String>,
    pub rating: Option<i64>,
}
