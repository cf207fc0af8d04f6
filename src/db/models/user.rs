//! User models and DTOs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection};

use super::common::{require_non_blank, Record, ValidationError};
use crate::db::Entity;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub record: Record,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub is_admin: bool,
}

impl User {
    /// Build a validated user. `password_hash` must already be hashed.
    pub fn new(
        email: &str,
        password_hash: String,
        first_name: &str,
        last_name: &str,
        is_admin: bool,
    ) -> Result<Self, ValidationError> {
        let user = Self {
            record: Record::new(),
            email: normalize_email(email),
            password_hash,
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
            is_admin,
        };
        user.validate()?;
        Ok(user)
    }

    pub async fn find_by_email(
        conn: &mut SqliteConnection,
        email: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM users WHERE email = ?")
            .bind(normalize_email(email))
            .fetch_optional(conn)
            .await
    }
}

/// Emails are compared and stored trimmed
pub fn normalize_email(email: &str) -> String {
    email.trim().to_string()
}

/// Validate a plaintext password before it is hashed
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::new("password", "password cannot be empty"));
    }
    Ok(())
}

/// Allow-listed user mutations. The password arrives here already hashed.
#[derive(Debug, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_admin: Option<bool>,
}

#[async_trait]
impl Entity for User {
    const TABLE: &'static str = "users";
    const NAME: &'static str = "User";

    type Changes = UserChanges;

    fn record(&self) -> &Record {
        &self.record
    }

    fn record_mut(&mut self) -> &mut Record {
        &mut self.record
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.email.is_empty() || !self.email.contains('@') {
            return Err(ValidationError::new("email", "Invalid email format"));
        }
        require_non_blank("first_name", &self.first_name)?;
        require_non_blank("last_name", &self.last_name)?;
        if self.password_hash.is_empty() {
            return Err(ValidationError::new("password", "password cannot be empty"));
        }
        Ok(())
    }

    fn apply(&mut self, changes: UserChanges) {
        if let Some(email) = changes.email {
            self.email = normalize_email(&email);
        }
        if let Some(password_hash) = changes.password_hash {
            self.password_hash = password_hash;
        }
        if let Some(first_name) = changes.first_name {
            self.first_name = first_name.trim().to_string();
        }
        if let Some(last_name) = changes.last_name {
            self.last_name = last_name.trim().to_string();
        }
        if let Some(is_admin) = changes.is_admin {
            self.is_admin = is_admin;
        }
    }

    async fn insert(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, first_name, last_name, is_admin, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&self.record.id)
        .bind(&self.email)
        .bind(&self.password_hash)
        .bind(&self.first_name)
        .bind(&self.last_name)
        .bind(self.is_admin)
        .bind(&self.record.created_at)
        .bind(&self.record.updated_at)
        .execute(conn)
        .await?;
        Ok(())
    }

    async fn save(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE users SET
                email = ?,
                password_hash = ?,
                first_name = ?,
                last_name = ?,
                is_admin = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&self.email)
        .bind(&self.password_hash)
        .bind(&self.first_name)
        .bind(&self.last_name)
        .bind(self.is_admin)
        .bind(&self.record.updated_at)
        .bind(&self.record.id)
        .execute(conn)
        .await?;
        Ok(())
    }
}

/// Public user representation (never carries the password hash)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_admin: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.record.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            is_admin: user.is_admin,
            created_at: user.record.created_at,
            updated_at: user.record.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Admin-only update: may additionally toggle the admin flag
#[derive(Debug, Default, Deserialize)]
pub struct AdminUpdateUserRequest {
    #[serde(flatten)]
    pub user: UpdateUserRequest,
    pub is_admin: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: UserResponse,
}
