/// License key model and database operations
///
/// License keys are single-use credentials that gate registration. A key
/// is consumed in the same transaction that creates the registering user,
/// so a key can never be double-spent even under concurrent registration.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE license_keys (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     key VARCHAR(19) NOT NULL UNIQUE,
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     used_at TIMESTAMPTZ,
///     used_by_user_id UUID REFERENCES users(id) ON DELETE SET NULL
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::license::{generate_license_key, MAX_GENERATION_ATTEMPTS};

/// License key model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LicenseKey {
    /// Unique key ID (UUID v4)
    pub id: Uuid,

    /// Key string in format AAAA-BBBB-CCCC-DDDD (unique)
    pub key: String,

    /// Whether the key can still be used for registration
    pub is_active: bool,

    /// When the key was created
    pub created_at: DateTime<Utc>,

    /// When the key was consumed by a registration (None if unused)
    pub used_at: Option<DateTime<Utc>>,

    /// Which user consumed the key (None if unused)
    pub used_by_user_id: Option<Uuid>,
}

/// Error type for license key generation
#[derive(Debug, thiserror::Error)]
pub enum KeyGenerationError {
    /// No unique key found within the attempt bound
    ///
    /// Signals an operational problem such as a near-saturated key space;
    /// the generator never silently returns a duplicate.
    #[error("Failed to generate a unique license key after {0} attempts")]
    Exhausted(usize),

    /// Database error
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

impl LicenseKey {
    /// Inserts a license key with the given key string
    ///
    /// # Errors
    ///
    /// Returns an error on a unique-constraint violation (key already
    /// exists) or database failure.
    pub async fn insert(executor: impl PgExecutor<'_>, key: &str) -> Result<Self, sqlx::Error> {
        let license_key = sqlx::query_as::<_, LicenseKey>(
            r#"
            INSERT INTO license_keys (key)
            VALUES ($1)
            RETURNING id, key, is_active, created_at, used_at, used_by_user_id
            "#,
        )
        .bind(key)
        .fetch_one(executor)
        .await?;

        Ok(license_key)
    }

    /// Generates and inserts a new random license key
    ///
    /// Relies on the UNIQUE constraint on the key column rather than a
    /// check-then-insert: each attempt inserts directly, and a constraint
    /// violation triggers a retry with a fresh key, bounded at
    /// [`MAX_GENERATION_ATTEMPTS`].
    ///
    /// # Errors
    ///
    /// Returns `KeyGenerationError::Exhausted` when every attempt collided,
    /// or `KeyGenerationError::DatabaseError` on any other failure.
    pub async fn generate(pool: &PgPool) -> Result<Self, KeyGenerationError> {
        for attempt in 1..=MAX_GENERATION_ATTEMPTS {
            let key = generate_license_key();

            match Self::insert(pool, &key).await {
                Ok(license_key) => return Ok(license_key),
                Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                    tracing::warn!(attempt, "License key collision, retrying");
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(KeyGenerationError::Exhausted(MAX_GENERATION_ATTEMPTS))
    }

    /// Finds a license key by its key string
    pub async fn find_by_key(
        executor: impl PgExecutor<'_>,
        key: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let license_key = sqlx::query_as::<_, LicenseKey>(
            r#"
            SELECT id, key, is_active, created_at, used_at, used_by_user_id
            FROM license_keys
            WHERE key = $1
            "#,
        )
        .bind(key)
        .fetch_optional(executor)
        .await?;

        Ok(license_key)
    }

    /// Lists license keys with pagination, newest first
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        let keys = sqlx::query_as::<_, LicenseKey>(
            r#"
            SELECT id, key, is_active, created_at, used_at, used_by_user_id
            FROM license_keys
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(keys)
    }

    /// Sets a key's active flag
    ///
    /// # Returns
    ///
    /// The updated key if found, None otherwise
    pub async fn set_active(
        pool: &PgPool,
        key: &str,
        is_active: bool,
    ) -> Result<Option<Self>, sqlx::Error> {
        let license_key = sqlx::query_as::<_, LicenseKey>(
            r#"
            UPDATE license_keys
            SET is_active = $2
            WHERE key = $1
            RETURNING id, key, is_active, created_at, used_at, used_by_user_id
            "#,
        )
        .bind(key)
        .bind(is_active)
        .fetch_optional(pool)
        .await?;

        Ok(license_key)
    }

    /// Deletes a license key
    ///
    /// # Returns
    ///
    /// True if the key was deleted, false if it didn't exist
    pub async fn delete(pool: &PgPool, key: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM license_keys WHERE key = $1")
            .bind(key)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Marks a key as consumed by a newly registered user
    ///
    /// The WHERE clause re-checks that the key is still active and unused,
    /// so one of two racing registrations sees zero rows affected and can
    /// roll back. Runs on any executor so registration can include it in
    /// its transaction.
    ///
    /// # Returns
    ///
    /// True if the key was consumed, false if it was already spent or
    /// deactivated
    pub async fn consume(
        executor: impl PgExecutor<'_>,
        key: &str,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE license_keys
            SET is_active = FALSE, used_at = NOW(), used_by_user_id = $2
            WHERE key = $1 AND is_active = TRUE AND used_by_user_id IS NULL
            "#,
        )
        .bind(key)
        .bind(user_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Whether the key can still be used for registration
    pub fn is_usable(&self) -> bool {
        self.is_active && self.used_by_user_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_key(is_active: bool, used_by: Option<Uuid>) -> LicenseKey {
        LicenseKey {
            id: Uuid::new_v4(),
            key: "ABCD-1234-WXYZ-5678".to_string(),
            is_active,
            created_at: Utc::now(),
            used_at: used_by.map(|_| Utc::now()),
            used_by_user_id: used_by,
        }
    }

    #[test]
    fn test_is_usable() {
        assert!(sample_key(true, None).is_usable());
        assert!(!sample_key(false, None).is_usable());
        assert!(!sample_key(true, Some(Uuid::new_v4())).is_usable());
        assert!(!sample_key(false, Some(Uuid::new_v4())).is_usable());
    }

    #[test]
    fn test_exhausted_error_message() {
        let err = KeyGenerationError::Exhausted(10);
        assert!(err.to_string().contains("10 attempts"));
    }
}
