//! Contract of the remote document store.
//!
//! Documents live under `budgets/{owner}/items/{key}` (one per saved month)
//! and `budgets/{owner}/config` (fixed planning). Writes are last-write-wins.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;

use super::subscription::Subscription;
use crate::error::StoreError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

/// Which part of an owner's namespace changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Items,
    Config,
}

#[derive(Debug, Clone)]
pub struct ChangeNotice {
    pub owner: String,
    pub scope: Scope,
}

pub type ItemsFeed = Subscription<Result<Vec<Document>, StoreError>>;
pub type ConfigFeed = Subscription<Result<Option<Value>, StoreError>>;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Replace the document at `items/{key}`.
    async fn put_item(&self, owner: &str, key: &str, data: Value) -> Result<(), StoreError>;

    /// Remove `items/{key}`; absent documents are not an error.
    async fn delete_item(&self, owner: &str, key: &str) -> Result<(), StoreError>;

    /// All item documents in insertion order.
    async fn list_items(&self, owner: &str) -> Result<Vec<Document>, StoreError>;

    async fn get_config(&self, owner: &str) -> Result<Option<Value>, StoreError>;

    /// Write the config document; with `merge` the fields are merged into
    /// the existing document instead of replacing it.
    async fn put_config(&self, owner: &str, data: Value, merge: bool) -> Result<(), StoreError>;

    /// Current items, then the full set again after every change.
    async fn watch_items(&self, owner: &str) -> ItemsFeed;

    /// Current config, then again after every change.
    async fn watch_config(&self, owner: &str) -> ConfigFeed;
}

/// Merge `patch` into `target`: objects merge key by key, recursively; any
/// other value replaces what was there.
pub fn merge_json(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(existing), Value::Object(incoming)) => {
            for (key, value) in incoming {
                match existing.get_mut(&key) {
                    Some(slot) => merge_json(slot, value),
                    None => {
                        existing.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

/// Fan-out of change notices to every open feed.
#[derive(Clone)]
pub struct ChangeHub {
    tx: broadcast::Sender<ChangeNotice>,
}

impl ChangeHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(256);
        Self { tx }
    }

    pub fn notify(&self, owner: &str, scope: Scope) {
        // no receivers is fine
        let _ = self.tx.send(ChangeNotice {
            owner: owner.to_string(),
            scope,
        });
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeNotice> {
        self.tx.subscribe()
    }
}

impl Default for ChangeHub {
    fn default() -> Self {
        Self::new()
    }
}
