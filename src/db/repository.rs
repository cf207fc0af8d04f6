//! Generic persistence adapter over the entity types.
//!
//! [`Entity`] exposes the storage primitives on an open connection so the
//! facade can compose several of them inside one transaction. [`Repository`]
//! wraps the same primitives in a write transaction of their own for
//! single-entity operations.

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, SqliteConnection};
use std::marker::PhantomData;
use thiserror::Error;

use super::models::{Record, ValidationError};
use super::{begin_write, DbPool};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Storage(#[from] sqlx::Error),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[async_trait]
pub trait Entity: for<'r> FromRow<'r, SqliteRow> + Send + Sync + Unpin + 'static {
    /// Backing table name
    const TABLE: &'static str;
    /// Human-readable name used in error messages
    const NAME: &'static str;

    /// Allow-listed set of mutable fields accepted by [`Entity::apply`]
    type Changes: Send + 'static;

    fn record(&self) -> &Record;
    fn record_mut(&mut self) -> &mut Record;

    fn validate(&self) -> Result<(), ValidationError>;

    /// Apply changes in memory. Callers must `validate()` before persisting.
    fn apply(&mut self, changes: Self::Changes);

    async fn insert(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error>;

    /// Write every mutable column back to storage
    async fn save(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error>;

    fn id(&self) -> &str {
        &self.record().id
    }

    fn touch(&mut self) {
        self.record_mut().touch();
    }

    async fn find(conn: &mut SqliteConnection, id: &str) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("SELECT * FROM {} WHERE id = ?", Self::TABLE);
        sqlx::query_as::<_, Self>(&sql)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    async fn list(conn: &mut SqliteConnection) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!("SELECT * FROM {} ORDER BY created_at, rowid", Self::TABLE);
        sqlx::query_as::<_, Self>(&sql).fetch_all(conn).await
    }

    async fn count(conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
        let sql = format!("SELECT COUNT(*) FROM {}", Self::TABLE);
        sqlx::query_scalar::<_, i64>(&sql).fetch_one(conn).await
    }

    async fn remove(conn: &mut SqliteConnection, id: &str) -> Result<bool, sqlx::Error> {
        let sql = format!("DELETE FROM {} WHERE id = ?", Self::TABLE);
        let result = sqlx::query(&sql).bind(id).execute(conn).await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Transactional CRUD over a single entity type.
pub struct Repository<E> {
    pool: DbPool,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for Repository<E> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> Repository<E> {
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            _entity: PhantomData,
        }
    }

    pub async fn get(&self, id: &str) -> RepositoryResult<Option<E>> {
        let mut conn = self.pool.acquire().await?;
        Ok(E::find(&mut *conn, id).await?)
    }

    /// All rows in insertion order
    pub async fn get_all(&self) -> RepositoryResult<Vec<E>> {
        let mut conn = self.pool.acquire().await?;
        Ok(E::list(&mut *conn).await?)
    }

    pub async fn count(&self) -> RepositoryResult<i64> {
        let mut conn = self.pool.acquire().await?;
        Ok(E::count(&mut *conn).await?)
    }

    pub async fn add(&self, entity: &E) -> RepositoryResult<()> {
        entity.validate()?;

        let mut tx = begin_write(&self.pool).await?;
        entity.insert(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Apply `changes` to the row with `id`. Returns `None` when no such row exists.
    pub async fn update(&self, id: &str, changes: E::Changes) -> RepositoryResult<Option<E>> {
        let mut tx = begin_write(&self.pool).await?;

        let Some(mut entity) = E::find(&mut *tx, id).await? else {
            return Ok(None);
        };

        entity.apply(changes);
        entity.touch();
        entity.validate()?;
        entity.save(&mut *tx).await?;

        tx.commit().await?;
        Ok(Some(entity))
    }

    pub async fn delete(&self, id: &str) -> RepositoryResult<bool> {
        let mut tx = begin_write(&self.pool).await?;
        let removed = E::remove(&mut *tx, id).await?;
        tx.commit().await?;
        Ok(removed)
    }
}
