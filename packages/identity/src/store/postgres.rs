//! PostgreSQL-backed IdentityStore over the `users` table.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{IdentityStore, StoreError};
use crate::models::{normalize_email, Identity, NewIdentity, ProfileUpdate, Provider};

const SELECT_IDENTITY: &str = r#"
    SELECT id, email, display_name, first_name, last_name, avatar_url, password_hash,
           linked_local, linked_discord, linked_github, linked_google,
           created_at, updated_at
    FROM users
"#;

/// IdentityStore backed by a shared connection pool.
#[derive(Clone, Debug)]
pub struct PgIdentityStore {
    pool: PgPool,
}

impl PgIdentityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Map the `users_email_key` violation to the domain duplicate signal.
fn map_insert_error(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::DuplicateEmail,
        _ => StoreError::Database(e),
    }
}

#[async_trait]
impl IdentityStore for PgIdentityStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, StoreError> {
        let identity = sqlx::query_as(&format!("{SELECT_IDENTITY} WHERE email = $1"))
            .bind(normalize_email(email))
            .fetch_optional(&self.pool)
            .await?;
        Ok(identity)
    }

    async fn create_identity(&self, new: NewIdentity) -> Result<Identity, StoreError> {
        new.validate().map_err(StoreError::Invalid)?;

        // The provider flag is written in the same statement as the row.
        let identity: Identity = sqlx::query_as(
            r#"
            INSERT INTO users (
                email, display_name, first_name, last_name, avatar_url, password_hash,
                linked_local, linked_discord, linked_github, linked_google
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, email, display_name, first_name, last_name, avatar_url, password_hash,
                      linked_local, linked_discord, linked_github, linked_google,
                      created_at, updated_at
            "#,
        )
        .bind(&new.email)
        .bind(&new.display_name)
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.avatar_url)
        .bind(&new.password_hash)
        .bind(new.provider == Provider::Local)
        .bind(new.provider == Provider::Discord)
        .bind(new.provider == Provider::Github)
        .bind(new.provider == Provider::Google)
        .fetch_one(&self.pool)
        .await
        .map_err(map_insert_error)?;

        Ok(identity)
    }

    async fn update_linked_providers(
        &self,
        id: Uuid,
        provider: Provider,
    ) -> Result<(), StoreError> {
        let query = match provider {
            Provider::Local => {
                "UPDATE users SET linked_local = TRUE, updated_at = NOW() WHERE id = $1"
            }
            Provider::Discord => {
                "UPDATE users SET linked_discord = TRUE, updated_at = NOW() WHERE id = $1"
            }
            Provider::Github => {
                "UPDATE users SET linked_github = TRUE, updated_at = NOW() WHERE id = $1"
            }
            Provider::Google => {
                "UPDATE users SET linked_google = TRUE, updated_at = NOW() WHERE id = $1"
            }
        };

        sqlx::query(query).bind(id).execute(&self.pool).await?;
        Ok(())
    }

    async fn update_profile(
        &self,
        id: Uuid,
        update: ProfileUpdate,
    ) -> Result<Option<Identity>, StoreError> {
        update.validate().map_err(StoreError::Invalid)?;

        let identity = sqlx::query_as(
            r#"
            UPDATE users SET
                display_name = COALESCE($2, display_name),
                first_name = COALESCE($3, first_name),
                last_name = COALESCE($4, last_name),
                avatar_url = COALESCE($5, avatar_url),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, display_name, first_name, last_name, avatar_url, password_hash,
                      linked_local, linked_discord, linked_github, linked_google,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(update.display_name)
        .bind(update.first_name)
        .bind(update.last_name)
        .bind(update.avatar_url)
        .fetch_optional(&self.pool)
        .await?;
        Ok(identity)
    }

    async fn exists(&self, id: Uuid) -> Result<bool, StoreError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Identity>, StoreError> {
        let identity = sqlx::query_as(&format!("{SELECT_IDENTITY} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(identity)
    }
}
