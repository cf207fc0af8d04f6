//! Aggregate statistics returned by the stats endpoints.
//!
//! Averages are `0.0` when there is nothing to average.

use serde::Serialize;
use sqlx::{FromRow, SqliteConnection};

/// Per-user activity summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserStats {
    pub user_id: String,
    pub places_count: i64,
    pub reviews_count: i64,
    /// Mean rating this user has given
    pub average_rating: f64,
}

/// Count of reviews per star value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RatingDistribution {
    #[serde(rename = "1")]
    pub one: i64,
    #[serde(rename = "2")]
    pub two: i64,
    #[serde(rename = "3")]
    pub three: i64,
    #[serde(rename = "4")]
    pub four: i64,
    #[serde(rename = "5")]
    pub five: i64,
}

impl RatingDistribution {
    pub fn record(&mut self, rating: i64, count: i64) {
        match rating {
            1 => self.one += count,
            2 => self.two += count,
            3 => self.three += count,
            4 => self.four += count,
            5 => self.five += count,
            _ => {}
        }
    }

    pub fn total(&self) -> i64 {
        self.one + self.two + self.three + self.four + self.five
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaceStats {
    pub place_id: String,
    pub review_count: i64,
    pub average_rating: f64,
    pub rating_distribution: RatingDistribution,
    pub amenities_count: i64,
}

/// Average rating of one reviewed place
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct PlaceRating {
    pub place_id: String,
    pub title: String,
    pub review_count: i64,
    pub average_rating: f64,
}

/// System-wide summary for administrators
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminStats {
    pub users_count: i64,
    pub admins_count: i64,
    pub places_count: i64,
    pub reviews_count: i64,
    pub amenities_count: i64,
    pub average_rating: f64,
    pub place_ratings: Vec<PlaceRating>,
}

/// Mean of all ratings matching `filter` (a column name) = `value`, or over
/// every review when `filter` is `None`.
pub async fn average_rating(
    conn: &mut SqliteConnection,
    filter: Option<(&str, &str)>,
) -> Result<f64, sqlx::Error> {
    let avg: Option<f64> = match filter {
        Some((column, value)) => {
            let sql = format!("SELECT AVG(rating) FROM reviews WHERE {} = ?", column);
            sqlx::query_scalar(&sql).bind(value).fetch_one(conn).await?
        }
        None => {
            sqlx::query_scalar("SELECT AVG(rating) FROM reviews")
                .fetch_one(conn)
                .await?
        }
    };
    Ok(avg.unwrap_or(0.0))
}

pub async fn rating_distribution(
    conn: &mut SqliteConnection,
    place_id: &str,
) -> Result<RatingDistribution, sqlx::Error> {
    let rows: Vec<(i64, i64)> = sqlx::query_as(
        "SELECT rating, COUNT(*) FROM reviews WHERE place_id = ? GROUP BY rating",
    )
    .bind(place_id)
    .fetch_all(conn)
    .await?;

    let mut distribution = RatingDistribution::default();
    for (rating, count) in rows {
        distribution.record(rating, count);
    }
    Ok(distribution)
}

/// Per-place averages, best rated first. Places without reviews are omitted.
pub async fn place_ratings(conn: &mut SqliteConnection) -> Result<Vec<PlaceRating>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT p.id AS place_id, p.title AS title,
               COUNT(r.id) AS review_count,
               CAST(AVG(r.rating) AS REAL) AS average_rating
        FROM places p
        JOIN reviews r ON r.place_id = p.id
        GROUP BY p.id, p.title
        ORDER BY average_rating DESC, p.created_at ASC
        "#,
    )
    .fetch_all(conn)
    .await
}
