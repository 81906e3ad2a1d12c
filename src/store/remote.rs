use std::sync::Arc;

use async_trait::async_trait;

use super::documents::{Document, DocumentStore};
use super::{BudgetSnapshot, BudgetStore, StorageMode, Subscription};
use crate::database::models::{BudgetRecord, FixedPlanningConfig, StoredBudget};
use crate::error::PersistenceError;

pub const LOAD_FAILED_MESSAGE: &str = "Could not load your budgets. Check your permissions.";

/// Signed-in storage: `budgets/{owner}/items/{key}` and
/// `budgets/{owner}/config` in the document store.
#[derive(Clone)]
pub struct RemoteBackend {
    documents: Arc<dyn DocumentStore>,
    owner: String,
}

impl RemoteBackend {
    pub fn new(documents: Arc<dyn DocumentStore>, owner: impl Into<String>) -> Self {
        Self {
            documents,
            owner: owner.into(),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }
}

fn decode_budgets(docs: Vec<Document>) -> Vec<StoredBudget> {
    docs.into_iter()
        .filter_map(|doc| match serde_json::from_value::<BudgetRecord>(doc.data) {
            Ok(record) => Some(StoredBudget { id: doc.id, record }),
            Err(e) => {
                tracing::warn!(id = %doc.id, "skipping unreadable budget document: {}", e);
                None
            }
        })
        .collect()
}

#[async_trait]
impl BudgetStore for RemoteBackend {
    fn mode(&self) -> StorageMode {
        StorageMode::Remote
    }

    async fn try_save_budget(&self, record: &BudgetRecord) -> Result<(), PersistenceError> {
        let data = serde_json::to_value(record)?;
        self.documents
            .put_item(&self.owner, &record.key(), data)
            .await
            .map_err(PersistenceError::Remote)
    }

    async fn try_delete_budget(&self, key: &str) -> Result<(), PersistenceError> {
        self.documents
            .delete_item(&self.owner, key)
            .await
            .map_err(PersistenceError::Remote)
    }

    async fn try_save_fixed_data(
        &self,
        config: &FixedPlanningConfig,
    ) -> Result<(), PersistenceError> {
        let data = serde_json::to_value(config)?;
        self.documents
            .put_config(&self.owner, data, true)
            .await
            .map_err(PersistenceError::Remote)
    }

    async fn load_budgets(&self) -> Subscription<BudgetSnapshot> {
        let owner = self.owner.clone();
        self.documents
            .watch_items(&self.owner)
            .await
            .map(move |delivery| match delivery {
                Ok(docs) => BudgetSnapshot::ok(decode_budgets(docs)),
                Err(e) => {
                    tracing::error!(owner = %owner, "budget feed error: {}", e);
                    BudgetSnapshot::failed(LOAD_FAILED_MESSAGE)
                }
            })
    }

    async fn load_fixed_data(&self) -> Subscription<Option<FixedPlanningConfig>> {
        let owner = self.owner.clone();
        self.documents
            .watch_config(&self.owner)
            .await
            .map(move |delivery| {
                delivery
                    .map_err(|e| e.to_string())
                    .and_then(|cfg| {
                        cfg.map(serde_json::from_value::<FixedPlanningConfig>)
                            .transpose()
                            .map_err(|e| e.to_string())
                    })
                    .unwrap_or_else(|message| {
                        tracing::error!(owner = %owner, "fixed planning feed error: {}", message);
                        None
                    })
            })
    }
}
