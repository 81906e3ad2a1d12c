//! Budget storage: one contract, a local and a remote implementation.

pub mod documents;
pub mod http;
pub mod local;
pub mod remote;
pub mod subscription;

use async_trait::async_trait;

use crate::database::models::{BudgetRecord, FixedPlanningConfig, StoredBudget};
use crate::error::PersistenceError;

pub use documents::{Document, DocumentStore};
pub use local::LocalBackend;
pub use remote::RemoteBackend;
pub use subscription::Subscription;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    Local,
    Remote,
}

/// One delivery of the saved months. On failure `budgets` is empty and
/// `error` says why.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BudgetSnapshot {
    pub budgets: Vec<StoredBudget>,
    pub error: Option<String>,
}

impl BudgetSnapshot {
    pub fn ok(budgets: Vec<StoredBudget>) -> Self {
        Self { budgets, error: None }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            budgets: Vec::new(),
            error: Some(message.into()),
        }
    }
}

#[async_trait]
pub trait BudgetStore: Send + Sync {
    fn mode(&self) -> StorageMode;

    /// Insert or replace the record stored under `record.month_name`.
    async fn try_save_budget(&self, record: &BudgetRecord) -> Result<(), PersistenceError>;

    /// Remove the record stored under `key`. Absent keys are not an error.
    async fn try_delete_budget(&self, key: &str) -> Result<(), PersistenceError>;

    async fn try_save_fixed_data(
        &self,
        config: &FixedPlanningConfig,
    ) -> Result<(), PersistenceError>;

    /// Current saved months; the remote store keeps delivering after every
    /// change until the subscription is released.
    async fn load_budgets(&self) -> Subscription<BudgetSnapshot>;

    async fn load_fixed_data(&self) -> Subscription<Option<FixedPlanningConfig>>;

    async fn save_budget(&self, record: &BudgetRecord) -> bool {
        match self.try_save_budget(record).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    month = %record.month_name,
                    mode = ?self.mode(),
                    "saving budget failed: {}",
                    e
                );
                false
            }
        }
    }

    async fn delete_budget(&self, key: &str) {
        if let Err(e) = self.try_delete_budget(key).await {
            tracing::warn!(key, mode = ?self.mode(), "deleting budget failed: {}", e);
        }
    }

    async fn save_fixed_data(&self, config: &FixedPlanningConfig) -> bool {
        match self.try_save_fixed_data(config).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(mode = ?self.mode(), "saving fixed planning failed: {}", e);
                false
            }
        }
    }
}
