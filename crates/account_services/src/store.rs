use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::config::LockoutPolicy;
use crate::types::{
    AccountError, Identity, IdentityError, IdentityResult, normalize_email, normalize_role_name,
};

/// Persistence contract for identity records and role memberships.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Finds an identity by email, ignoring case and surrounding whitespace.
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, AccountError>;

    /// Finds an identity by id.
    async fn find_by_id(&self, id: &str) -> Result<Option<Identity>, AccountError>;

    /// Stores a new identity, failing with `DuplicateEmail` if the email is taken.
    async fn insert(&self, identity: &Identity) -> Result<IdentityResult, AccountError>;

    /// Adds the identity to the named role. Existing membership is a success;
    /// an unknown identity or role is a structured failure.
    async fn add_to_role(
        &self,
        identity_id: &str,
        role_name: &str,
    ) -> Result<IdentityResult, AccountError>;

    /// Names of the roles the identity belongs to, sorted.
    async fn roles(&self, identity_id: &str) -> Result<Vec<String>, AccountError>;

    /// Counts a failed sign-in, locking the identity once the policy threshold is hit.
    /// Returns the updated identity.
    async fn record_access_failure(
        &self,
        identity_id: &str,
        policy: &LockoutPolicy,
    ) -> Result<Option<Identity>, AccountError>;

    /// Clears the failed sign-in counter.
    async fn reset_access_failures(&self, identity_id: &str) -> Result<(), AccountError>;
}

const IDENTITY_COLUMNS: &str = r#"
    id, user_name, email, normalized_email, password_hash,
    access_failed_count, lockout_end, two_factor_enabled, created_at
"#;

/// A credential store backed by the `identities`, `roles` and `identity_roles` tables.
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    /// Creates a new instance of `PgCredentialStore` with the provided database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_identity(row: &PgRow) -> Identity {
        Identity {
            id: row.get("id"),
            user_name: row.get("user_name"),
            email: row.get("email"),
            normalized_email: row.get("normalized_email"),
            password_hash: row.get("password_hash"),
            access_failed_count: row.get("access_failed_count"),
            lockout_end: row.get("lockout_end"),
            two_factor_enabled: row.get("two_factor_enabled"),
            created_at: row.get("created_at"),
        }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, AccountError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM identities WHERE normalized_email = $1",
            IDENTITY_COLUMNS
        ))
        .bind(normalize_email(email))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(Self::row_to_identity))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Identity>, AccountError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM identities WHERE id = $1",
            IDENTITY_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(Self::row_to_identity))
    }

    async fn insert(&self, identity: &Identity) -> Result<IdentityResult, AccountError> {
        // Unique index on normalized_email settles concurrent registrations
        let result = sqlx::query(
            r#"
            INSERT INTO identities (
                id, user_name, email, normalized_email, password_hash,
                access_failed_count, lockout_end, two_factor_enabled, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (normalized_email) DO NOTHING
            "#,
        )
        .bind(&identity.id)
        .bind(&identity.user_name)
        .bind(&identity.email)
        .bind(&identity.normalized_email)
        .bind(&identity.password_hash)
        .bind(identity.access_failed_count)
        .bind(identity.lockout_end)
        .bind(identity.two_factor_enabled)
        .bind(identity.created_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(IdentityResult::Failed(vec![IdentityError::duplicate_email(
                &identity.email,
            )]));
        }

        Ok(IdentityResult::Succeeded(()))
    }

    async fn add_to_role(
        &self,
        identity_id: &str,
        role_name: &str,
    ) -> Result<IdentityResult, AccountError> {
        let identity = sqlx::query("SELECT id FROM identities WHERE id = $1")
            .bind(identity_id)
            .fetch_optional(&self.pool)
            .await?;
        if identity.is_none() {
            return Ok(IdentityResult::Failed(vec![
                IdentityError::identity_not_found(identity_id),
            ]));
        }

        let role = sqlx::query("SELECT id FROM roles WHERE normalized_name = $1")
            .bind(normalize_role_name(role_name))
            .fetch_optional(&self.pool)
            .await?;

        let Some(role) = role else {
            return Ok(IdentityResult::Failed(vec![IdentityError::role_not_found(
                role_name,
            )]));
        };
        let role_id: i32 = role.get("id");

        sqlx::query(
            r#"
            INSERT INTO identity_roles (identity_id, role_id)
            VALUES ($1, $2)
            ON CONFLICT (identity_id, role_id) DO NOTHING
            "#,
        )
        .bind(identity_id)
        .bind(role_id)
        .execute(&self.pool)
        .await?;

        Ok(IdentityResult::Succeeded(()))
    }

    async fn roles(&self, identity_id: &str) -> Result<Vec<String>, AccountError> {
        let rows = sqlx::query(
            r#"
            SELECT r.name
            FROM identity_roles ir
            JOIN roles r ON ir.role_id = r.id
            WHERE ir.identity_id = $1
            ORDER BY r.name
            "#,
        )
        .bind(identity_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(|row| row.get("name")).collect())
    }

    async fn record_access_failure(
        &self,
        identity_id: &str,
        policy: &LockoutPolicy,
    ) -> Result<Option<Identity>, AccountError> {
        let lockout_end = Utc::now() + policy.lockout_duration;

        let row = sqlx::query(&format!(
            r#"
            UPDATE identities
            SET access_failed_count = CASE
                    WHEN access_failed_count + 1 >= $2 THEN 0
                    ELSE access_failed_count + 1
                END,
                lockout_end = CASE
                    WHEN access_failed_count + 1 >= $2 THEN $3
                    ELSE lockout_end
                END
            WHERE id = $1
            RETURNING {}
            "#,
            IDENTITY_COLUMNS
        ))
        .bind(identity_id)
        .bind(policy.max_failed_access_attempts)
        .bind(lockout_end)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(Self::row_to_identity))
    }

    async fn reset_access_failures(&self, identity_id: &str) -> Result<(), AccountError> {
        sqlx::query("UPDATE identities SET access_failed_count = 0 WHERE id = $1")
            .bind(identity_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
