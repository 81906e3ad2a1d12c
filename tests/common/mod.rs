#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use budget_snapshots::database::db::connection::memory_pool;
use budget_snapshots::database::db::documents::SqliteDocumentStore;
use budget_snapshots::database::db::kv::SqliteKvStore;
use budget_snapshots::database::db::migrate;
use budget_snapshots::error::StoreError;
use budget_snapshots::store::documents::{ConfigFeed, ItemsFeed};
use budget_snapshots::store::{Document, DocumentStore, LocalBackend};
use serde_json::Value;

/// A guest device and a document store sharing one in-memory database.
pub async fn stores() -> (LocalBackend, Arc<SqliteDocumentStore>) {
    let pool = memory_pool().await.unwrap();
    migrate::run_migrations(&pool).await.unwrap();
    let local = LocalBackend::new(Arc::new(SqliteKvStore::new(pool.clone())));
    (local, Arc::new(SqliteDocumentStore::new(pool)))
}

/// Fails every item write whose key is in `failing`; everything else goes to
/// the inner store.
pub struct FlakyDocumentStore {
    inner: Arc<SqliteDocumentStore>,
    failing: Mutex<Vec<String>>,
}

impl FlakyDocumentStore {
    pub fn new(inner: Arc<SqliteDocumentStore>, failing: &[&str]) -> Self {
        Self {
            inner,
            failing: Mutex::new(failing.iter().map(|k| k.to_string()).collect()),
        }
    }

    /// Let every later write through.
    pub fn recover(&self) {
        self.failing.lock().unwrap().clear();
    }
}

#[async_trait]
impl DocumentStore for FlakyDocumentStore {
    async fn put_item(&self, owner: &str, key: &str, data: Value) -> Result<(), StoreError> {
        if self.failing.lock().unwrap().iter().any(|k| k == key) {
            return Err(StoreError::Status {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        self.inner.put_item(owner, key, data).await
    }

    async fn delete_item(&self, owner: &str, key: &str) -> Result<(), StoreError> {
        self.inner.delete_item(owner, key).await
    }

    async fn list_items(&self, owner: &str) -> Result<Vec<Document>, StoreError> {
        self.inner.list_items(owner).await
    }

    async fn get_config(&self, owner: &str) -> Result<Option<Value>, StoreError> {
        self.inner.get_config(owner).await
    }

    async fn put_config(&self, owner: &str, data: Value, merge: bool) -> Result<(), StoreError> {
        self.inner.put_config(owner, data, merge).await
    }

    async fn watch_items(&self, owner: &str) -> ItemsFeed {
        self.inner.watch_items(owner).await
    }

    async fn watch_config(&self, owner: &str) -> ConfigFeed {
        self.inner.watch_config(owner).await
    }
}
