use async_trait::async_trait;
use sqlx::{Pool, Sqlite};

use crate::error::StoreError;

/// String keys to string values, scoped to this device.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// `kv_store` table in the local SQLite file.
#[derive(Clone)]
pub struct SqliteKvStore {
    pool: Pool<Sqlite>,
}

impl SqliteKvStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

#[async_trait]
impl KeyValueStore for SqliteKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value)
            VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::db::{connection, migrate};

    async fn store() -> SqliteKvStore {
        let pool = connection::memory_pool().await.unwrap();
        migrate::run_migrations(&pool).await.unwrap();
        SqliteKvStore::new(pool)
    }

    #[tokio::test]
    async fn set_overwrites_and_remove_is_idempotent() {
        let kv = store().await;
        assert_eq!(kv.get("a").await.unwrap(), None);

        kv.set("a", "1").await.unwrap();
        kv.set("a", "2").await.unwrap();
        assert_eq!(kv.get("a").await.unwrap().as_deref(), Some("2"));

        kv.remove("a").await.unwrap();
        kv.remove("a").await.unwrap();
        assert_eq!(kv.get("a").await.unwrap(), None);
    }
}
