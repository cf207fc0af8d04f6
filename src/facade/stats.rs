use super::{Facade, FacadeError, FacadeResult};
use crate::db::{
    average_rating, place_ratings, rating_distribution, AdminStats, Amenity, Entity, Place,
    PlaceStats, Review, User, UserStats,
};

impl Facade {
    pub async fn get_user_stats(&self, user_id: &str) -> FacadeResult<UserStats> {
        let mut conn = self.db.acquire().await?;
        if User::find(&mut *conn, user_id).await?.is_none() {
            return Err(FacadeError::not_found("User"));
        }

        let places_count = Place::count_by_owner(&mut *conn, user_id).await?;
        let reviews_count = Review::count_by_user(&mut *conn, user_id).await?;
        let average_rating = average_rating(&mut *conn, Some(("user_id", user_id))).await?;

        Ok(UserStats {
            user_id: user_id.to_string(),
            places_count,
            reviews_count,
            average_rating,
        })
    }

    pub async fn get_place_stats(&self, place_id: &str) -> FacadeResult<PlaceStats> {
        let mut conn = self.db.acquire().await?;
        if Place::find(&mut *conn, place_id).await?.is_none() {
            return Err(FacadeError::not_found("Place"));
        }

        let rating_distribution = rating_distribution(&mut *conn, place_id).await?;
        let average_rating = average_rating(&mut *conn, Some(("place_id", place_id))).await?;
        let amenities_count = Amenity::find_for_place(&mut *conn, place_id).await?.len() as i64;

        Ok(PlaceStats {
            place_id: place_id.to_string(),
            review_count: rating_distribution.total(),
            average_rating,
            rating_distribution,
            amenities_count,
        })
    }

    pub async fn admin_get_stats(&self, admin_id: &str) -> FacadeResult<AdminStats> {
        self.require_admin(admin_id, "get_stats").await?;

        let mut conn = self.db.acquire().await?;
        let admins_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE is_admin = 1")
            .fetch_one(&mut *conn)
            .await?;

        Ok(AdminStats {
            users_count: User::count(&mut *conn).await?,
            admins_count,
            places_count: Place::count(&mut *conn).await?,
            reviews_count: Review::count(&mut *conn).await?,
            amenities_count: Amenity::count(&mut *conn).await?,
            average_rating: average_rating(&mut *conn, None).await?,
            place_ratings: place_ratings(&mut *conn).await?,
        })
    }
}
