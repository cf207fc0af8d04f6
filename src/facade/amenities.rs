use tracing::info;

use super::{Facade, FacadeError, FacadeResult};
use crate::db::{begin_write, Amenity, CreateAmenityRequest, Entity, UpdateAmenityRequest};

impl Facade {
    pub async fn get_amenity(&self, id: &str) -> FacadeResult<Option<Amenity>> {
        Ok(self.amenities.get(id).await?)
    }

    pub async fn get_all_amenities(&self) -> FacadeResult<Vec<Amenity>> {
        Ok(self.amenities.get_all().await?)
    }

    pub async fn create_amenity(&self, req: CreateAmenityRequest) -> FacadeResult<Amenity> {
        let amenity = Amenity::new(&req.name)?;

        let mut tx = begin_write(&self.db).await?;
        if Amenity::find_by_name(&mut *tx, &amenity.name).await?.is_some() {
            return Err(FacadeError::Duplicate("Amenity already exists".to_string()));
        }
        amenity.insert(&mut *tx).await?;
        tx.commit().await?;

        info!(amenity_id = %amenity.id(), name = %amenity.name, "Amenity created");
        Ok(amenity)
    }

    pub async fn update_amenity(&self, id: &str, req: UpdateAmenityRequest) -> FacadeResult<Amenity> {
        let mut tx = begin_write(&self.db).await?;
        let mut amenity = Amenity::find(&mut *tx, id)
            .await?
            .ok_or_else(|| FacadeError::not_found("Amenity"))?;

        if let Some(name) = req.name.as_deref() {
            if let Some(existing) = Amenity::find_by_name(&mut *tx, name.trim()).await? {
                if existing.id() != id {
                    return Err(FacadeError::Duplicate("Amenity already exists".to_string()));
                }
            }
        }

        amenity.apply(req);
        amenity.touch();
        amenity.validate()?;
        amenity.save(&mut *tx).await?;
        tx.commit().await?;

        info!(amenity_id = %id, "Amenity updated");
        Ok(amenity)
    }

    /// Delete an amenity; places keep existing, only their links go
    pub async fn delete_amenity(&self, id: &str) -> FacadeResult<bool> {
        let removed = self.amenities.delete(id).await?;
        if removed {
            info!(amenity_id = %id, "Amenity deleted");
        }
        Ok(removed)
    }

    pub async fn admin_create_amenity(
        &self,
        admin_id: &str,
        req: CreateAmenityRequest,
    ) -> FacadeResult<Amenity> {
        self.require_admin(admin_id, "create_amenity").await?;
        self.create_amenity(req).await
    }

    pub async fn admin_update_amenity(
        &self,
        admin_id: &str,
        id: &str,
        req: UpdateAmenityRequest,
    ) -> FacadeResult<Amenity> {
        self.require_admin(admin_id, "update_amenity").await?;
        self.update_amenity(id, req).await
    }

    pub async fn admin_delete_amenity(&self, admin_id: &str, id: &str) -> FacadeResult<bool> {
        self.require_admin(admin_id, "delete_amenity").await?;
        self.delete_amenity(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let facade = facade().await;
        amenity(&facade, "WiFi").await;

        let err = facade
            .create_amenity(CreateAmenityRequest {
                name: " WiFi ".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, FacadeError::Duplicate(_)));
        assert_eq!(facade.get_all_amenities().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let facade = facade().await;
        let err = facade
            .create_amenity(CreateAmenityRequest {
                name: String::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, FacadeError::Validation(_)));
    }

    #[tokio::test]
    async fn test_rename_conflict() {
        let facade = facade().await;
        amenity(&facade, "WiFi").await;
        let pool = amenity(&facade, "Pool").await;

        let err = facade
            .update_amenity(
                pool.id(),
                UpdateAmenityRequest {
                    name: Some("WiFi".to_string()),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, FacadeError::Duplicate(_)));

        let renamed = facade
            .update_amenity(
                pool.id(),
                UpdateAmenityRequest {
                    name: Some("Swimming pool".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.name, "Swimming pool");
    }

    #[tokio::test]
    async fn test_admin_amenity_gate() {
        let facade = facade().await;
        let root = admin(&facade, "root@x.com").await;
        let plain = user(&facade, "plain@x.com").await;

        let err = facade
            .admin_create_amenity(
                plain.id(),
                CreateAmenityRequest {
                    name: "Gym".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, FacadeError::Authorization(_)));
        assert!(facade.get_all_amenities().await.unwrap().is_empty());

        let gym = facade
            .admin_create_amenity(
                root.id(),
                CreateAmenityRequest {
                    name: "Gym".to_string(),
                },
            )
            .await
            .unwrap();

        let err = facade
            .admin_update_amenity(
                plain.id(),
                gym.id(),
                UpdateAmenityRequest {
                    name: Some("Spa".to_string()),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, FacadeError::Authorization(_)));
        assert_eq!(facade.get_amenity(gym.id()).await.unwrap().unwrap().name, "Gym");

        let err = facade
            .admin_delete_amenity("ghost", gym.id())
            .await
            .unwrap_err();
        assert!(matches!(err, FacadeError::Authorization(_)));

        assert!(facade.admin_delete_amenity(root.id(), gym.id()).await.unwrap());
        assert!(facade.get_amenity(gym.id()).await.unwrap().is_none());
    }
}
