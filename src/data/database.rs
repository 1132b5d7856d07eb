//! SQLite database operations
//!
//! All database access goes through this module.

use chrono::Utc;
use sqlx::{Pool, Sqlite, SqlitePool};
use std::path::Path;

use super::models::*;
use crate::error::AppError;

/// Database connection pool wrapper.
pub struct Database {
    pool: Pool<Sqlite>,
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}

impl Database {
    /// Connect to the SQLite database and run migrations.
    ///
    /// Creates parent directories and the database file if missing.
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        // Create connection string
        let connection_string = format!("sqlite:{}?mode=rwc", path.display());

        // Create connection pool
        let pool = SqlitePool::connect(&connection_string).await?;

        // Run migrations
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!("Database connected and migrated successfully");

        Ok(Self { pool })
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Get a user by lowercased email.
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Get a user by id.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Get or create the user for an email address.
    ///
    /// The insert ignores conflicts so that two concurrent first logins
    /// for the same address resolve to the same row.
    pub async fn upsert_user_by_email(&self, email: &str) -> Result<User, AppError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, created_at)
            VALUES (?, ?, ?)
            ON CONFLICT (email) DO NOTHING
            "#,
        )
        .bind(EntityId::new().0)
        .bind(email)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        self.get_user_by_email(email)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("user row missing after upsert")))
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    /// Get the account for a user.
    pub async fn get_account_for_user(&self, user_id: &str) -> Result<Option<Account>, AppError> {
        let account =
            sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE user_id = ? LIMIT 1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(account)
    }

    /// Get the existing account for a user, or create a default one.
    ///
    /// The insert is atomic at the SQL statement level and prevents races
    /// where two concurrent requests both try to create the first account.
    pub async fn ensure_account_for_user(&self, user_id: &str) -> Result<Account, AppError> {
        if let Some(account) = self.get_account_for_user(user_id).await? {
            return Ok(account);
        }

        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO accounts (id, user_id, name, kit_api_key, kit_tag_label, created_at, updated_at)
            SELECT ?, ?, ?, NULL, ?, ?, ?
            WHERE NOT EXISTS (SELECT 1 FROM accounts WHERE user_id = ?)
            "#,
        )
        .bind(EntityId::new().0)
        .bind(user_id)
        .bind("New Account")
        .bind(DEFAULT_TAG_LABEL)
        .bind(now)
        .bind(now)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        self.get_account_for_user(user_id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("account row missing after insert")))
    }

    /// Update account settings for a user.
    ///
    /// An empty tag label falls back to the default literal.
    pub async fn update_account_settings(
        &self,
        user_id: &str,
        name: &str,
        kit_api_key: Option<&str>,
        kit_tag_label: &str,
    ) -> Result<Account, AppError> {
        let tag_label = if kit_tag_label.trim().is_empty() {
            DEFAULT_TAG_LABEL
        } else {
            kit_tag_label.trim()
        };

        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET name = ?, kit_api_key = ?, kit_tag_label = ?, updated_at = ?
            WHERE user_id = ?
            "#,
        )
        .bind(name)
        .bind(kit_api_key)
        .bind(tag_label)
        .bind(Utc::now())
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }

        self.get_account_for_user(user_id)
            .await?
            .ok_or(AppError::NotFound)
    }

    // =========================================================================
    // Keywords
    // =========================================================================

    /// List keywords for an account, newest first.
    pub async fn list_keywords(&self, account_id: &str) -> Result<Vec<Keyword>, AppError> {
        let keywords = sqlx::query_as::<_, Keyword>(
            "SELECT * FROM keywords WHERE account_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(keywords)
    }

    /// Insert a keyword.
    ///
    /// The (account_id, label) uniqueness constraint is mapped to a
    /// friendly validation error.
    pub async fn insert_keyword(&self, account_id: &str, label: &str) -> Result<Keyword, AppError> {
        let keyword = Keyword {
            id: EntityId::new().0,
            account_id: account_id.to_string(),
            label: label.to_string(),
            created_at: Utc::now(),
        };

        let result = sqlx::query(
            "INSERT INTO keywords (id, account_id, label, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&keyword.id)
        .bind(&keyword.account_id)
        .bind(&keyword.label)
        .bind(keyword.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(keyword),
            Err(error) if is_unique_violation(&error) => Err(AppError::Validation(
                "Keyword already exists. Keywords must be unique.".to_string(),
            )),
            Err(error) => Err(error.into()),
        }
    }

    /// Delete a keyword scoped to an account.
    ///
    /// # Returns
    /// `true` if a row was deleted, `false` if the keyword did not exist
    /// (or belonged to another account).
    pub async fn delete_keyword(&self, account_id: &str, keyword_id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM keywords WHERE id = ? AND account_id = ?")
            .bind(keyword_id)
            .bind(account_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
