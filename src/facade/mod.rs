//! Business-rule layer between the HTTP handlers and storage.
//!
//! Every mutating operation runs inside one SQLite transaction. The sqlx
//! `Transaction` rolls back when dropped, so any early return (including `?`)
//! or a cancelled future leaves storage untouched.
//!
//! Admin-only operations are the `admin_*` methods. Each takes the caller's
//! id and checks the stored `is_admin` flag before doing anything else.

mod amenities;
mod places;
mod reviews;
mod stats;
mod users;

use thiserror::Error;
use tracing::{error, warn};

use crate::db::{
    Amenity, DbPool, Entity, Place, Repository, RepositoryError, Review, User, ValidationError,
};

#[derive(Debug, Error)]
pub enum FacadeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Duplicate(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Authorization(String),

    #[error("Database error: {0}")]
    Storage(sqlx::Error),

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),
}

impl FacadeError {
    pub fn not_found(entity: &str) -> Self {
        Self::NotFound(format!("{} not found", entity))
    }
}

impl From<sqlx::Error> for FacadeError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return Self::Duplicate(format!("Duplicate value: {}", db_err.message()));
            }
            if db_err.is_foreign_key_violation() {
                return Self::NotFound("Referenced entity not found".to_string());
            }
        }
        error!(error = %err, "Storage operation failed");
        Self::Storage(err)
    }
}

impl From<RepositoryError> for FacadeError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Validation(e) => Self::Validation(e),
            RepositoryError::Storage(e) => e.into(),
        }
    }
}

impl From<argon2::password_hash::Error> for FacadeError {
    fn from(err: argon2::password_hash::Error) -> Self {
        error!(error = %err, "Password hashing failed");
        Self::PasswordHash(err.to_string())
    }
}

pub type FacadeResult<T> = Result<T, FacadeError>;

/// The HBnB service object. Cheap to clone; every clone shares the pool.
#[derive(Clone)]
pub struct Facade {
    db: DbPool,
    users: Repository<User>,
    places: Repository<Place>,
    reviews: Repository<Review>,
    amenities: Repository<Amenity>,
}

impl Facade {
    pub fn new(db: DbPool) -> Self {
        Self {
            users: Repository::new(db.clone()),
            places: Repository::new(db.clone()),
            reviews: Repository::new(db.clone()),
            amenities: Repository::new(db.clone()),
            db,
        }
    }

    pub fn pool(&self) -> &DbPool {
        &self.db
    }

    /// Stored admin flag for `user_id`. Unknown ids are not admins.
    pub async fn is_admin(&self, user_id: &str) -> FacadeResult<bool> {
        let mut conn = self.db.acquire().await?;
        Ok(User::find(&mut *conn, user_id)
            .await?
            .map(|user| user.is_admin)
            .unwrap_or(false))
    }

    async fn require_admin(&self, caller_id: &str, action: &str) -> FacadeResult<()> {
        if self.is_admin(caller_id).await? {
            return Ok(());
        }
        warn!(caller_id = %caller_id, action = %action, "Admin privileges required");
        Err(FacadeError::Authorization(
            "Admin privileges required".to_string(),
        ))
    }
}

/// `Ok` when no owner restriction applies or `owner` matches `expected`
fn check_owner(expected: &str, owner: Option<&str>, message: &str) -> FacadeResult<()> {
    match owner {
        Some(owner) if owner != expected => {
            warn!(expected = %expected, caller = %owner, "{}", message);
            Err(FacadeError::Authorization(message.to_string()))
        }
        _ => Ok(()),
    }
}
