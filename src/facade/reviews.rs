use tracing::info;

use super::{check_owner, Facade, FacadeError, FacadeResult};
use crate::db::{
    begin_write, CreateReviewRequest, Entity, Place, Review, UpdateReviewRequest, User,
    ValidationError,
};

const NOT_AUTHOR: &str = "Unauthorized: not the author";

impl Facade {
    pub async fn get_review(&self, id: &str) -> FacadeResult<Option<Review>> {
        Ok(self.reviews.get(id).await?)
    }

    pub async fn get_all_reviews(&self) -> FacadeResult<Vec<Review>> {
        Ok(self.reviews.get_all().await?)
    }

    pub async fn get_place_reviews(&self, place_id: &str) -> FacadeResult<Vec<Review>> {
        let mut conn = self.db.acquire().await?;
        if Place::find(&mut *conn, place_id).await?.is_none() {
            return Err(FacadeError::not_found("Place"));
        }
        Ok(Review::find_by_place(&mut *conn, place_id).await?)
    }

    pub async fn get_user_reviews(&self, user_id: &str) -> FacadeResult<Vec<Review>> {
        let mut conn = self.db.acquire().await?;
        Ok(Review::find_by_user(&mut *conn, user_id).await?)
    }

    pub async fn get_user_review_for_place(
        &self,
        user_id: &str,
        place_id: &str,
    ) -> FacadeResult<Option<Review>> {
        let mut conn = self.db.acquire().await?;
        Ok(Review::find_by_user_and_place(&mut *conn, user_id, place_id).await?)
    }

    /// Review a place as `user_id`. Owners cannot review their own places and
    /// each user reviews a place at most once.
    pub async fn create_review(&self, req: CreateReviewRequest, user_id: &str) -> FacadeResult<Review> {
        let review = Review::new(&req, user_id)?;

        let mut tx = begin_write(&self.db).await?;
        let place = Place::find(&mut *tx, &review.place_id)
            .await?
            .ok_or_else(|| FacadeError::not_found("Place"))?;

        if place.owner_id == user_id {
            return Err(ValidationError::new("place_id", "Cannot review your own place").into());
        }
        if Review::find_by_user_and_place(&mut *tx, user_id, &review.place_id)
            .await?
            .is_some()
        {
            return Err(FacadeError::Duplicate("Already reviewed this place".to_string()));
        }
        if User::find(&mut *tx, user_id).await?.is_none() {
            return Err(FacadeError::not_found("User"));
        }

        review.insert(&mut *tx).await?;
        tx.commit().await?;

        info!(review_id = %review.id(), place_id = %review.place_id, "Review created");
        Ok(review)
    }

    /// Update text or rating. With `user_id` set, only the author may do so.
    pub async fn update_review(
        &self,
        id: &str,
        req: UpdateReviewRequest,
        user_id: Option<&str>,
    ) -> FacadeResult<Review> {
        let mut tx = begin_write(&self.db).await?;
        let mut review = Review::find(&mut *tx, id)
            .await?
            .ok_or_else(|| FacadeError::not_found("Review"))?;
        check_owner(&review.user_id, user_id, NOT_AUTHOR)?;

        review.apply(req);
        review.touch();
        review.validate()?;
        review.save(&mut *tx).await?;
        tx.commit().await?;

        info!(review_id = %id, "Review updated");
        Ok(review)
    }

    pub async fn delete_review(&self, id: &str, user_id: Option<&str>) -> FacadeResult<bool> {
        let mut tx = begin_write(&self.db).await?;
        let Some(review) = Review::find(&mut *tx, id).await? else {
            return Ok(false);
        };
        check_owner(&review.user_id, user_id, NOT_AUTHOR)?;

        let removed = Review::remove(&mut *tx, id).await?;
        tx.commit().await?;

        info!(review_id = %id, "Review deleted");
        Ok(removed)
    }

    pub async fn admin_update_review(
        &self,
        admin_id: &str,
        id: &str,
        req: UpdateReviewRequest,
    ) -> FacadeResult<Review> {
        self.require_admin(admin_id, "update_review").await?;
        self.update_review(id, req, None).await
    }

    pub async fn admin_delete_review(&self, admin_id: &str, id: &str) -> FacadeResult<bool> {
        self.require_admin(admin_id, "delete_review").await?;
        self.delete_review(id, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;

    fn review_request(place: &Place, rating: i64) -> CreateReviewRequest {
        CreateReviewRequest {
            text: "nice".to_string(),
            rating,
            place_id: place.id().to_string(),
        }
    }

    #[tokio::test]
    async fn test_review_scenario() {
        let facade = facade().await;
        let a = user(&facade, "a@x.com").await;
        let p = place(&facade, &a, 100.0).await;
        let b = user(&facade, "b@x.com").await;

        let review = facade
            .create_review(review_request(&p, 4), b.id())
            .await
            .unwrap();
        assert_eq!(review.user_id, b.id());
        assert_eq!(review.place_id, p.id());

        let err = facade
            .create_review(review_request(&p, 5), b.id())
            .await
            .unwrap_err();
        assert!(matches!(err, FacadeError::Duplicate(_)));

        let err = facade
            .create_review(review_request(&p, 5), a.id())
            .await
            .unwrap_err();
        assert!(matches!(err, FacadeError::Validation(_)));

        assert_eq!(facade.get_place_reviews(p.id()).await.unwrap().len(), 1);
        assert_eq!(facade.get_all_reviews().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_own_place_rejected_for_any_rating() {
        let facade = facade().await;
        let a = user(&facade, "a@x.com").await;
        let p = place(&facade, &a, 100.0).await;

        for rating in 1..=5 {
            let err = facade
                .create_review(review_request(&p, rating), a.id())
                .await
                .unwrap_err();
            assert!(matches!(err, FacadeError::Validation(_)));
        }
        assert!(facade.get_all_reviews().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_review_missing_place() {
        let facade = facade().await;
        let b = user(&facade, "b@x.com").await;
        let err = facade
            .create_review(
                CreateReviewRequest {
                    text: "?".to_string(),
                    rating: 3,
                    place_id: "missing".to_string(),
                },
                b.id(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, FacadeError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_review_author_only() {
        let facade = facade().await;
        let a = user(&facade, "a@x.com").await;
        let b = user(&facade, "b@x.com").await;
        let c = user(&facade, "c@x.com").await;
        let p = place(&facade, &a, 100.0).await;
        let review = facade
            .create_review(review_request(&p, 4), b.id())
            .await
            .unwrap();

        let err = facade
            .update_review(
                review.id(),
                UpdateReviewRequest {
                    rating: Some(1),
                    ..Default::default()
                },
                Some(c.id()),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, FacadeError::Authorization(_)));

        let err = facade
            .update_review(
                review.id(),
                UpdateReviewRequest {
                    rating: Some(9),
                    ..Default::default()
                },
                Some(b.id()),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, FacadeError::Validation(_)));

        let updated = facade
            .update_review(
                review.id(),
                UpdateReviewRequest {
                    text: Some("even better".to_string()),
                    rating: Some(5),
                },
                Some(b.id()),
            )
            .await
            .unwrap();
        assert_eq!(updated.rating, 5);
        assert_eq!(updated.text, "even better");
        assert_eq!(updated.place_id, p.id());
        assert_eq!(updated.user_id, b.id());
    }

    #[tokio::test]
    async fn test_delete_review() {
        let facade = facade().await;
        let a = user(&facade, "a@x.com").await;
        let b = user(&facade, "b@x.com").await;
        let p = place(&facade, &a, 100.0).await;
        let review = facade
            .create_review(review_request(&p, 4), b.id())
            .await
            .unwrap();

        let err = facade
            .delete_review(review.id(), Some(a.id()))
            .await
            .unwrap_err();
        assert!(matches!(err, FacadeError::Authorization(_)));

        assert!(facade.delete_review(review.id(), Some(b.id())).await.unwrap());
        assert!(!facade.delete_review(review.id(), Some(b.id())).await.unwrap());

        // Deleted review frees the (user, place) pair
        assert!(facade
            .create_review(review_request(&p, 2), b.id())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_user_review_lookups() {
        let facade = facade().await;
        let a = user(&facade, "a@x.com").await;
        let b = user(&facade, "b@x.com").await;
        let p = place(&facade, &a, 100.0).await;
        let q = place(&facade, &a, 60.0).await;
        facade.create_review(review_request(&p, 4), b.id()).await.unwrap();
        facade.create_review(review_request(&q, 2), b.id()).await.unwrap();

        assert_eq!(facade.get_user_reviews(b.id()).await.unwrap().len(), 2);
        let found = facade
            .get_user_review_for_place(b.id(), q.id())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.rating, 2);
        assert!(facade
            .get_user_review_for_place(a.id(), p.id())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_admin_review_operations() {
        let facade = facade().await;
        let root = admin(&facade, "root@x.com").await;
        let a = user(&facade, "a@x.com").await;
        let b = user(&facade, "b@x.com").await;
        let p = place(&facade, &a, 100.0).await;
        let review = facade
            .create_review(review_request(&p, 4), b.id())
            .await
            .unwrap();

        let err = facade
            .admin_delete_review(a.id(), review.id())
            .await
            .unwrap_err();
        assert!(matches!(err, FacadeError::Authorization(_)));

        let moderated = facade
            .admin_update_review(
                root.id(),
                review.id(),
                UpdateReviewRequest {
                    text: Some("[edited]".to_string()),
                    rating: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(moderated.text, "[edited]");
        assert_eq!(moderated.user_id, b.id());

        assert!(facade.admin_delete_review(root.id(), review.id()).await.unwrap());
    }
}
