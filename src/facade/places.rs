use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use tracing::info;

use super::{check_owner, Facade, FacadeError, FacadeResult};
use crate::db::{
    begin_write, Amenity, CreatePlaceRequest, Entity, Place, PlaceDetails, PlaceFilters, Review,
    UpdatePlaceRequest, User, UserResponse, ValidationError,
};

const NOT_OWNER: &str = "Unauthorized: not the owner";

/// Fail unless every id names an existing amenity
async fn resolve_amenities(conn: &mut SqliteConnection, ids: &[String]) -> FacadeResult<()> {
    for id in ids {
        if Amenity::find(&mut *conn, id).await?.is_none() {
            return Err(ValidationError::new("amenity_ids", "One or more amenities not found").into());
        }
    }
    Ok(())
}

impl Facade {
    pub async fn get_place(&self, id: &str) -> FacadeResult<Option<Place>> {
        Ok(self.places.get(id).await?)
    }

    pub async fn get_all_places(&self) -> FacadeResult<Vec<Place>> {
        Ok(self.places.get_all().await?)
    }

    pub async fn get_user_places(&self, owner_id: &str) -> FacadeResult<Vec<Place>> {
        let mut conn = self.db.acquire().await?;
        Ok(Place::find_by_owner(&mut *conn, owner_id).await?)
    }

    /// Place with owner, amenities and reviews
    pub async fn get_place_details(&self, id: &str) -> FacadeResult<Option<PlaceDetails>> {
        let mut conn = self.db.acquire().await?;
        let Some(place) = Place::find(&mut *conn, id).await? else {
            return Ok(None);
        };

        let owner = User::find(&mut *conn, &place.owner_id)
            .await?
            .map(UserResponse::from);
        let amenities = Amenity::find_for_place(&mut *conn, id).await?;
        let reviews = Review::find_by_place(&mut *conn, id).await?;

        Ok(Some(PlaceDetails {
            place,
            owner,
            amenities,
            reviews,
        }))
    }

    pub async fn get_place_amenities(&self, place_id: &str) -> FacadeResult<Vec<Amenity>> {
        let mut conn = self.db.acquire().await?;
        if Place::find(&mut *conn, place_id).await?.is_none() {
            return Err(FacadeError::not_found("Place"));
        }
        Ok(Amenity::find_for_place(&mut *conn, place_id).await?)
    }

    /// Create a place owned by `owner_id`, attaching `amenity_ids` if given.
    /// Nothing is stored unless every amenity resolves.
    pub async fn create_place(&self, req: CreatePlaceRequest, owner_id: &str) -> FacadeResult<Place> {
        let place = Place::new(&req, owner_id)?;
        let amenity_ids = req.amenity_ids.unwrap_or_default();

        let mut tx = begin_write(&self.db).await?;
        if User::find(&mut *tx, owner_id).await?.is_none() {
            return Err(FacadeError::not_found("User"));
        }
        resolve_amenities(&mut *tx, &amenity_ids).await?;

        place.insert(&mut *tx).await?;
        for amenity_id in &amenity_ids {
            Place::link_amenity(&mut *tx, place.id(), amenity_id).await?;
        }
        tx.commit().await?;

        info!(place_id = %place.id(), owner_id = %owner_id, "Place created");
        Ok(place)
    }

    /// Update a place. With `owner_id` set, only that owner may do so.
    /// A supplied amenity list replaces the current set as a whole.
    pub async fn update_place(
        &self,
        id: &str,
        req: UpdatePlaceRequest,
        owner_id: Option<&str>,
    ) -> FacadeResult<Place> {
        let (changes, amenity_ids) = req.into_parts();

        let mut tx = begin_write(&self.db).await?;
        let mut place = Place::find(&mut *tx, id)
            .await?
            .ok_or_else(|| FacadeError::not_found("Place"))?;
        check_owner(&place.owner_id, owner_id, NOT_OWNER)?;

        place.apply(changes);
        place.touch();
        place.validate()?;
        place.save(&mut *tx).await?;

        if let Some(amenity_ids) = amenity_ids {
            resolve_amenities(&mut *tx, &amenity_ids).await?;
            Place::clear_amenities(&mut *tx, id).await?;
            for amenity_id in &amenity_ids {
                Place::link_amenity(&mut *tx, id, amenity_id).await?;
            }
        }
        tx.commit().await?;

        info!(place_id = %id, "Place updated");
        Ok(place)
    }

    pub async fn delete_place(&self, id: &str, owner_id: Option<&str>) -> FacadeResult<bool> {
        let mut tx = begin_write(&self.db).await?;
        let Some(place) = Place::find(&mut *tx, id).await? else {
            return Ok(false);
        };
        check_owner(&place.owner_id, owner_id, NOT_OWNER)?;

        let removed = Place::remove(&mut *tx, id).await?;
        tx.commit().await?;

        info!(place_id = %id, "Place deleted");
        Ok(removed)
    }

    /// Link an amenity to a place. Returns false if it was already linked.
    pub async fn add_place_amenity(
        &self,
        place_id: &str,
        amenity_id: &str,
        owner_id: Option<&str>,
    ) -> FacadeResult<bool> {
        let mut tx = begin_write(&self.db).await?;
        let place = Place::find(&mut *tx, place_id)
            .await?
            .ok_or_else(|| FacadeError::not_found("Place"))?;
        check_owner(&place.owner_id, owner_id, NOT_OWNER)?;
        if Amenity::find(&mut *tx, amenity_id).await?.is_none() {
            return Err(FacadeError::not_found("Amenity"));
        }

        let linked = Place::link_amenity(&mut *tx, place_id, amenity_id).await?;
        tx.commit().await?;
        Ok(linked)
    }

    /// Unlink an amenity from a place. Returns false if it was not linked.
    pub async fn remove_place_amenity(
        &self,
        place_id: &str,
        amenity_id: &str,
        owner_id: Option<&str>,
    ) -> FacadeResult<bool> {
        let mut tx = begin_write(&self.db).await?;
        let place = Place::find(&mut *tx, place_id)
            .await?
            .ok_or_else(|| FacadeError::not_found("Place"))?;
        check_owner(&place.owner_id, owner_id, NOT_OWNER)?;

        let unlinked = Place::unlink_amenity(&mut *tx, place_id, amenity_id).await?;
        tx.commit().await?;
        Ok(unlinked)
    }

    /// Places matching every given filter, in creation order
    pub async fn search_places(&self, filters: &PlaceFilters) -> FacadeResult<Vec<Place>> {
        if let (Some(min), Some(max)) = (filters.price_min, filters.price_max) {
            if min > max {
                return Err(ValidationError::new(
                    "price_min",
                    "price_min cannot be greater than price_max",
                )
                .into());
            }
        }

        let location = filters.location()?;

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT p.* FROM places p WHERE 1 = 1");

        if let Some(min) = filters.price_min {
            query.push(" AND p.price >= ").push_bind(min);
        }
        if let Some(max) = filters.price_max {
            query.push(" AND p.price <= ").push_bind(max);
        }
        if !filters.amenities.is_empty() {
            query.push(
                " AND EXISTS (SELECT 1 FROM place_amenities pa \
                 WHERE pa.place_id = p.id AND pa.amenity_id IN (",
            );
            let mut ids = query.separated(", ");
            for amenity_id in &filters.amenities {
                ids.push_bind(amenity_id.clone());
            }
            ids.push_unseparated("))");
        }
        if let Some(rating) = filters.rating_min {
            query
                .push(" AND (SELECT AVG(r.rating) FROM reviews r WHERE r.place_id = p.id) >= ")
                .push_bind(rating);
        }
        if let Some((latitude, longitude, radius)) = location {
            query
                .push(" AND p.latitude BETWEEN ")
                .push_bind(latitude - radius)
                .push(" AND ")
                .push_bind(latitude + radius)
                .push(" AND p.longitude BETWEEN ")
                .push_bind(longitude - radius)
                .push(" AND ")
                .push_bind(longitude + radius);
        }
        query.push(" ORDER BY p.created_at, p.rowid");

        let mut conn = self.db.acquire().await?;
        Ok(query.build_query_as::<Place>().fetch_all(&mut *conn).await?)
    }

    pub async fn admin_update_place(
        &self,
        admin_id: &str,
        id: &str,
        req: UpdatePlaceRequest,
    ) -> FacadeResult<Place> {
        self.require_admin(admin_id, "update_place").await?;
        self.update_place(id, req, None).await
    }

    pub async fn admin_delete_place(&self, admin_id: &str, id: &str) -> FacadeResult<bool> {
        self.require_admin(admin_id, "delete_place").await?;
        self.delete_place(id, None).await
    }

    pub async fn admin_add_place_amenity(
        &self,
        admin_id: &str,
        place_id: &str,
        amenity_id: &str,
    ) -> FacadeResult<bool> {
        self.require_admin(admin_id, "add_place_amenity").await?;
        self.add_place_amenity(place_id, amenity_id, None).await
    }

    pub async fn admin_remove_place_amenity(
        &self,
        admin_id: &str,
        place_id: &str,
        amenity_id: &str,
    ) -> FacadeResult<bool> {
        self.require_admin(admin_id, "remove_place_amenity").await?;
        self.remove_place_amenity(place_id, amenity_id, None).await
    }
}
