use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;

use crate::repository::{Cookie, CookieJar, StorageError};

use super::SqliteRepository;

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl CookieJar for SqliteRepository {
    async fn get(&self, name: &str, now: DateTime<Utc>) -> Result<Option<String>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT value, expires_at
            FROM client_cookies
            WHERE name = ?1
            ",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let expires_at: Option<DateTime<Utc>> = row.try_get("expires_at").map_err(ser)?;
        if expires_at.is_some_and(|at| at <= now) {
            self.remove(name).await?;
            return Ok(None);
        }

        let value: String = row.try_get("value").map_err(ser)?;
        Ok(Some(value))
    }

    async fn set(&self, cookie: &Cookie, now: DateTime<Utc>) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO client_cookies (name, value, path, expires_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(name) DO UPDATE SET
                value = excluded.value,
                path = excluded.path,
                expires_at = excluded.expires_at,
                updated_at = excluded.updated_at
            ",
        )
        .bind(&cookie.name)
        .bind(&cookie.value)
        .bind(&cookie.path)
        .bind(cookie.expires_at(now))
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn remove(&self, name: &str) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM client_cookies WHERE name = ?1")
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(())
    }
}
