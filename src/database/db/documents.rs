use async_trait::async_trait;
use serde_json::Value;
use sqlx::{Pool, Row, Sqlite};
use tokio::sync::broadcast::error::RecvError;

use crate::error::StoreError;
use crate::store::documents::{
    merge_json, ChangeHub, ConfigFeed, Document, DocumentStore, ItemsFeed, Scope,
};
use crate::store::subscription::Subscription;

/*
Document store backed by the `documents` table. This is what the sync
server serves; tests also use it directly as the remote store.
 */

const ITEMS: &str = "items";
const CONFIG: &str = "config";

#[derive(Clone)]
pub struct SqliteDocumentStore {
    pool: Pool<Sqlite>,
    hub: ChangeHub,
}

impl SqliteDocumentStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self {
            pool,
            hub: ChangeHub::new(),
        }
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    async fn upsert(
        &self,
        owner: &str,
        collection: &str,
        doc_id: &str,
        body: &Value,
    ) -> Result<(), StoreError> {
        // seq is assigned on first insert only, which keeps listing order
        // stable across overwrites
        sqlx::query(
            r#"
            INSERT INTO documents (owner, collection, doc_id, body, updated_at, seq)
            VALUES (?, ?, ?, ?, strftime('%Y-%m-%dT%H:%M:%fZ','now'),
                    (SELECT COALESCE(MAX(seq), 0) + 1 FROM documents))
            ON CONFLICT(owner, collection, doc_id) DO UPDATE SET
                body = excluded.body,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(owner)
        .bind(collection)
        .bind(doc_id)
        .bind(serde_json::to_string(body)?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn put_item(&self, owner: &str, key: &str, data: Value) -> Result<(), StoreError> {
        self.upsert(owner, ITEMS, key, &data).await?;
        tracing::debug!(owner, key, "item document written");
        self.hub.notify(owner, Scope::Items);
        Ok(())
    }

    async fn delete_item(&self, owner: &str, key: &str) -> Result<(), StoreError> {
        let result = sqlx::query(
            "DELETE FROM documents WHERE owner = ? AND collection = ? AND doc_id = ?",
        )
        .bind(owner)
        .bind(ITEMS)
        .bind(key)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            tracing::debug!(owner, key, "item document deleted");
            self.hub.notify(owner, Scope::Items);
        }
        Ok(())
    }

    async fn list_items(&self, owner: &str) -> Result<Vec<Document>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT doc_id, body
            FROM documents
            WHERE owner = ? AND collection = ?
            ORDER BY seq ASC
            "#,
        )
        .bind(owner)
        .bind(ITEMS)
        .fetch_all(&self.pool)
        .await?;

        let mut docs = Vec::with_capacity(rows.len());
        for row in rows {
            let id: String = row.try_get("doc_id")?;
            let body: String = row.try_get("body")?;
            docs.push(Document {
                id,
                data: serde_json::from_str(&body)?,
            });
        }
        Ok(docs)
    }

    async fn get_config(&self, owner: &str) -> Result<Option<Value>, StoreError> {
        let body: Option<String> = sqlx::query_scalar(
            "SELECT body FROM documents WHERE owner = ? AND collection = ? AND doc_id = ?",
        )
        .bind(owner)
        .bind(CONFIG)
        .bind(CONFIG)
        .fetch_optional(&self.pool)
        .await?;

        body.map(|b| serde_json::from_str(&b))
            .transpose()
            .map_err(StoreError::from)
    }

    async fn put_config(&self, owner: &str, data: Value, merge: bool) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        let body = if merge {
            let existing: Option<String> = sqlx::query_scalar(
                "SELECT body FROM documents WHERE owner = ? AND collection = ? AND doc_id = ?",
            )
            .bind(owner)
            .bind(CONFIG)
            .bind(CONFIG)
            .fetch_optional(&mut *tx)
            .await?;

            let mut current = match existing {
                Some(b) => serde_json::from_str(&b)?,
                None => Value::Object(Default::default()),
            };
            merge_json(&mut current, data);
            current
        } else {
            data
        };

        sqlx::query(
            r#"
            INSERT INTO documents (owner, collection, doc_id, body, updated_at, seq)
            VALUES (?, ?, ?, ?, strftime('%Y-%m-%dT%H:%M:%fZ','now'),
                    (SELECT COALESCE(MAX(seq), 0) + 1 FROM documents))
            ON CONFLICT(owner, collection, doc_id) DO UPDATE SET
                body = excluded.body,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(owner)
        .bind(CONFIG)
        .bind(CONFIG)
        .bind(serde_json::to_string(&body)?)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::debug!(owner, merge, "config document written");
        self.hub.notify(owner, Scope::Config);
        Ok(())
    }

    async fn watch_items(&self, owner: &str) -> ItemsFeed {
        let store = self.clone();
        let owner = owner.to_string();
        // subscribe before the first read so no change can slip in between
        let mut changes = self.hub.subscribe();

        Subscription::spawn(move |tx| async move {
            if tx.send(store.list_items(&owner).await).is_err() {
                return;
            }
            loop {
                match changes.recv().await {
                    Ok(notice) if notice.owner == owner && notice.scope == Scope::Items => {}
                    Ok(_) => continue,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(owner, skipped, "items feed lagged, resending snapshot");
                    }
                    Err(RecvError::Closed) => break,
                }
                if tx.send(store.list_items(&owner).await).is_err() {
                    break;
                }
            }
        })
    }

    async fn watch_config(&self, owner: &str) -> ConfigFeed {
        let store = self.clone();
        let owner = owner.to_string();
        let mut changes = self.hub.subscribe();

        Subscription::spawn(move |tx| async move {
            if tx.send(store.get_config(&owner).await).is_err() {
                return;
            }
            loop {
                match changes.recv().await {
                    Ok(notice) if notice.owner == owner && notice.scope == Scope::Config => {}
                    Ok(_) => continue,
                    Err(RecvError::Lagged(_)) => {}
                    Err(RecvError::Closed) => break,
                }
                if tx.send(store.get_config(&owner).await).is_err() {
                    break;
                }
            }
        })
    }
}
