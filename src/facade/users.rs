use tracing::info;

use super::{Facade, FacadeError, FacadeResult};
use crate::crypto::{hash_password, verify_dummy, verify_password};
use crate::db::{
    begin_write, normalize_email, validate_password, AdminUpdateUserRequest, CreateUserRequest,
    Entity, UpdateUserRequest, User, UserChanges,
};

impl Facade {
    pub async fn get_user(&self, id: &str) -> FacadeResult<Option<User>> {
        Ok(self.users.get(id).await?)
    }

    pub async fn get_user_by_email(&self, email: &str) -> FacadeResult<Option<User>> {
        let mut conn = self.db.acquire().await?;
        Ok(User::find_by_email(&mut *conn, email).await?)
    }

    pub async fn get_all_users(&self) -> FacadeResult<Vec<User>> {
        Ok(self.users.get_all().await?)
    }

    /// Register a user. The plaintext password is hashed before storage.
    pub async fn create_user(&self, req: CreateUserRequest) -> FacadeResult<User> {
        validate_password(&req.password)?;
        let password_hash = hash_password(&req.password)?;
        let user = User::new(
            &req.email,
            password_hash,
            &req.first_name,
            &req.last_name,
            req.is_admin,
        )?;

        let mut tx = begin_write(&self.db).await?;
        if User::find_by_email(&mut *tx, &user.email).await?.is_some() {
            return Err(FacadeError::Duplicate("Email already registered".to_string()));
        }
        user.insert(&mut *tx).await?;
        tx.commit().await?;

        info!(user_id = %user.id(), "User created");
        Ok(user)
    }

    pub async fn update_user(&self, id: &str, req: UpdateUserRequest) -> FacadeResult<User> {
        self.apply_user_update(id, req, None).await
    }

    async fn apply_user_update(
        &self,
        id: &str,
        req: UpdateUserRequest,
        is_admin: Option<bool>,
    ) -> FacadeResult<User> {
        let password_hash = match req.password.as_deref() {
            Some(password) => {
                validate_password(password)?;
                Some(hash_password(password)?)
            }
            None => None,
        };

        let mut tx = begin_write(&self.db).await?;
        let mut user = User::find(&mut *tx, id)
            .await?
            .ok_or_else(|| FacadeError::not_found("User"))?;

        if let Some(email) = req.email.as_deref() {
            if let Some(existing) = User::find_by_email(&mut *tx, email).await? {
                if existing.id() != id {
                    return Err(FacadeError::Duplicate("Email already registered".to_string()));
                }
            }
        }

        user.apply(UserChanges {
            email: req.email,
            password_hash,
            first_name: req.first_name,
            last_name: req.last_name,
            is_admin,
        });
        user.touch();
        user.validate()?;
        user.save(&mut *tx).await?;
        tx.commit().await?;

        info!(user_id = %id, "User updated");
        Ok(user)
    }

    /// Delete a user together with their places and reviews
    pub async fn delete_user(&self, id: &str) -> FacadeResult<bool> {
        let removed = self.users.delete(id).await?;
        if removed {
            info!(user_id = %id, "User deleted");
        }
        Ok(removed)
    }

    /// The user with these credentials, or `None`. Unknown emails and wrong
    /// passwords are indistinguishable to the caller.
    pub async fn authenticate_user(&self, email: &str, password: &str) -> FacadeResult<Option<User>> {
        let user = self.get_user_by_email(email).await?;
        match user {
            Some(user) if verify_password(password, &user.password_hash) => Ok(Some(user)),
            Some(_) => Ok(None),
            None => {
                verify_dummy(password);
                Ok(None)
            }
        }
    }

    /// Make sure an admin account exists for `email`, creating or promoting it.
    pub async fn ensure_admin_user(&self, email: &str, password: &str) -> FacadeResult<User> {
        match self.get_user_by_email(email).await? {
            Some(user) if user.is_admin => Ok(user),
            Some(user) => {
                info!(email = %normalize_email(email), "Promoting existing user to admin");
                self.apply_user_update(user.id(), UpdateUserRequest::default(), Some(true))
                    .await
            }
            None => {
                info!(email = %normalize_email(email), "Creating bootstrap admin user");
                self.create_user(CreateUserRequest {
                    email: email.to_string(),
                    password: password.to_string(),
                    first_name: "Admin".to_string(),
                    last_name: "User".to_string(),
                    is_admin: true,
                })
                .await
            }
        }
    }

    pub async fn admin_create_user(
        &self,
        admin_id: &str,
        req: CreateUserRequest,
    ) -> FacadeResult<User> {
        self.require_admin(admin_id, "create_user").await?;
        self.create_user(req).await
    }

    /// Update any user, optionally changing their admin flag
    pub async fn admin_update_user(
        &self,
        admin_id: &str,
        id: &str,
        req: AdminUpdateUserRequest,
    ) -> FacadeResult<User> {
        self.require_admin(admin_id, "update_user").await?;
        self.apply_user_update(id, req.user, req.is_admin).await
    }

    pub async fn admin_delete_user(&self, admin_id: &str, id: &str) -> FacadeResult<bool> {
        self.require_admin(admin_id, "delete_user").await?;
        self.delete_user(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::db::{CreateReviewRequest, Place, Review};

    #[tokio::test]
    async fn test_create_then_get_matches() {
        let facade = facade().await;
        let created = user(&facade, "a@x.com").await;

        let fetched = facade.get_user(created.id()).await.unwrap().unwrap();
        assert_eq!(fetched.email, "a@x.com");
        assert_eq!(fetched.first_name, created.first_name);
        assert_eq!(fetched.last_name, created.last_name);
        assert_eq!(fetched.record, created.record);
        assert_ne!(fetched.password_hash, "password");
        assert!(verify_password("password", &fetched.password_hash));
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let facade = facade().await;
        user(&facade, "a@x.com").await;

        let err = facade.create_user(user_request("a@x.com")).await.unwrap_err();
        assert!(matches!(err, FacadeError::Duplicate(_)));
        assert_eq!(facade.get_all_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_user_not_persisted() {
        let facade = facade().await;
        let err = facade
            .create_user(user_request("no-at-sign"))
            .await
            .unwrap_err();
        assert!(matches!(err, FacadeError::Validation(_)));

        let mut req = user_request("b@x.com");
        req.password = String::new();
        assert!(matches!(
            facade.create_user(req).await.unwrap_err(),
            FacadeError::Validation(_)
        ));
        assert!(facade.get_all_users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_user_rehashes_password() {
        let facade = facade().await;
        let created = user(&facade, "a@x.com").await;

        let updated = facade
            .update_user(
                created.id(),
                UpdateUserRequest {
                    password: Some("new-secret".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_ne!(updated.password_hash, "new-secret");
        assert!(verify_password("new-secret", &updated.password_hash));
        assert!(facade
            .authenticate_user("a@x.com", "new-secret")
            .await
            .unwrap()
            .is_some());
        assert!(facade
            .authenticate_user("a@x.com", "password")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_update_user_email_conflict() {
        let facade = facade().await;
        user(&facade, "a@x.com").await;
        let b = user(&facade, "b@x.com").await;

        let err = facade
            .update_user(
                b.id(),
                UpdateUserRequest {
                    email: Some("a@x.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, FacadeError::Duplicate(_)));

        // Re-submitting your own email is fine
        let same = facade
            .update_user(
                b.id(),
                UpdateUserRequest {
                    email: Some("b@x.com".to_string()),
                    first_name: Some("Bea".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(same.first_name, "Bea");
    }

    #[tokio::test]
    async fn test_update_user_invalid_leaves_row() {
        let facade = facade().await;
        let created = user(&facade, "a@x.com").await;

        let err = facade
            .update_user(
                created.id(),
                UpdateUserRequest {
                    email: Some("broken".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, FacadeError::Validation(_)));

        let stored = facade.get_user(created.id()).await.unwrap().unwrap();
        assert_eq!(stored.email, "a@x.com");
        assert_eq!(stored.record.updated_at, created.record.updated_at);
    }

    #[tokio::test]
    async fn test_update_missing_user() {
        let facade = facade().await;
        let err = facade
            .update_user("nope", UpdateUserRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, FacadeError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_user_cascades() {
        let facade = facade().await;
        let owner = user(&facade, "owner@x.com").await;
        let guest = user(&facade, "guest@x.com").await;
        let owned: Place = place(&facade, &owner, 50.0).await;
        let other: Place = place(&facade, &guest, 80.0).await;

        let review_on_owned: Review = facade
            .create_review(
                CreateReviewRequest {
                    text: "great".to_string(),
                    rating: 5,
                    place_id: owned.id().to_string(),
                },
                guest.id(),
            )
            .await
            .unwrap();
        let review_by_owner: Review = facade
            .create_review(
                CreateReviewRequest {
                    text: "fine".to_string(),
                    rating: 3,
                    place_id: other.id().to_string(),
                },
                owner.id(),
            )
            .await
            .unwrap();

        assert!(facade.delete_user(owner.id()).await.unwrap());

        assert!(facade.get_place(owned.id()).await.unwrap().is_none());
        assert!(facade.get_review(review_on_owned.id()).await.unwrap().is_none());
        assert!(facade.get_review(review_by_owner.id()).await.unwrap().is_none());
        assert!(facade.get_place(other.id()).await.unwrap().is_some());

        assert!(!facade.delete_user(owner.id()).await.unwrap());
    }

    #[tokio::test]
    async fn test_authenticate_unknown_email() {
        let facade = facade().await;
        user(&facade, "a@x.com").await;
        assert!(facade
            .authenticate_user("ghost@x.com", "password")
            .await
            .unwrap()
            .is_none());
        let found = facade
            .authenticate_user("a@x.com", "password")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.email, "a@x.com");
    }

    #[tokio::test]
    async fn test_ensure_admin_user_is_idempotent() {
        let facade = facade().await;
        let first = facade.ensure_admin_user("root@x.com", "pw").await.unwrap();
        let second = facade.ensure_admin_user("root@x.com", "pw").await.unwrap();
        assert!(first.is_admin);
        assert_eq!(first.id(), second.id());
        assert_eq!(facade.get_all_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_ensure_admin_user_promotes() {
        let facade = facade().await;
        let existing = user(&facade, "root@x.com").await;
        let promoted = facade.ensure_admin_user("root@x.com", "pw").await.unwrap();
        assert_eq!(promoted.id(), existing.id());
        assert!(promoted.is_admin);
    }

    #[tokio::test]
    async fn test_admin_user_operations_gated() {
        let facade = facade().await;
        let root = admin(&facade, "root@x.com").await;
        let plain = user(&facade, "plain@x.com").await;

        let err = facade
            .admin_create_user(plain.id(), user_request("new@x.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, FacadeError::Authorization(_)));
        assert!(facade.get_user_by_email("new@x.com").await.unwrap().is_none());

        let err = facade
            .admin_delete_user(plain.id(), root.id())
            .await
            .unwrap_err();
        assert!(matches!(err, FacadeError::Authorization(_)));
        assert!(facade.get_user(root.id()).await.unwrap().is_some());

        let promoted = facade
            .admin_update_user(
                root.id(),
                plain.id(),
                AdminUpdateUserRequest {
                    is_admin: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(promoted.is_admin);
        assert!(facade.admin_delete_user(root.id(), "missing").await.is_ok());
    }
}
