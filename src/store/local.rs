use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::{BudgetSnapshot, BudgetStore, StorageMode, Subscription};
use crate::database::db::kv::KeyValueStore;
use crate::database::models::{month_key, BudgetRecord, FixedPlanningConfig, StoredBudget};
use crate::error::PersistenceError;

pub const BUDGETS_KEY: &str = "anonymousBudgets";
pub const FIXED_DATA_KEY: &str = "anonymousFixedData";

/// Everything a guest session has stored on this device.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocalSnapshot {
    pub budgets: Vec<BudgetRecord>,
    pub fixed: Option<FixedPlanningConfig>,
}

impl LocalSnapshot {
    pub fn is_empty(&self) -> bool {
        self.budgets.is_empty() && self.fixed.is_none()
    }
}

/// Guest storage: the whole list of months as one JSON value, the fixed
/// planning as another. Not namespaced by user; only one guest exists per
/// device at a time.
#[derive(Clone)]
pub struct LocalBackend {
    kv: Arc<dyn KeyValueStore>,
}

impl LocalBackend {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// The stored list as raw entries. Only a value that is not a list at
    /// all is an error; single entries are checked when decoded.
    async fn read_entries(&self) -> Result<Vec<Value>, PersistenceError> {
        match self.kv.get(BUDGETS_KEY).await.map_err(PersistenceError::Local)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    async fn read_budgets(&self) -> Result<Vec<BudgetRecord>, PersistenceError> {
        Ok(decode_entries(self.read_entries().await?))
    }

    async fn write_entries(&self, entries: &[Value]) -> Result<(), PersistenceError> {
        let raw = serde_json::to_string(entries)?;
        self.kv.set(BUDGETS_KEY, &raw).await.map_err(PersistenceError::Local)
    }

    async fn read_fixed(&self) -> Result<Option<FixedPlanningConfig>, PersistenceError> {
        match self.kv.get(FIXED_DATA_KEY).await.map_err(PersistenceError::Local)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Whether a guest left anything behind that should be migrated.
    pub async fn has_data(&self) -> Result<bool, PersistenceError> {
        let budgets = self.kv.get(BUDGETS_KEY).await.map_err(PersistenceError::Local)?;
        let fixed = self.kv.get(FIXED_DATA_KEY).await.map_err(PersistenceError::Local)?;
        Ok(budgets.is_some() || fixed.is_some())
    }

    pub async fn take_snapshot(&self) -> Result<LocalSnapshot, PersistenceError> {
        Ok(LocalSnapshot {
            budgets: self.read_budgets().await?,
            fixed: self.read_fixed().await?,
        })
    }

    /// Drop both stored values.
    pub async fn clear(&self) -> Result<(), PersistenceError> {
        self.kv.remove(BUDGETS_KEY).await.map_err(PersistenceError::Local)?;
        self.kv.remove(FIXED_DATA_KEY).await.map_err(PersistenceError::Local)
    }
}

fn entry_month(entry: &Value) -> Option<&str> {
    entry.get("monthName").and_then(Value::as_str)
}

/// Unreadable entries are left in storage untouched but not listed.
fn decode_entries(entries: Vec<Value>) -> Vec<BudgetRecord> {
    entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<BudgetRecord>(entry) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("skipping unreadable local budget: {}", e);
                None
            }
        })
        .collect()
}

#[async_trait]
impl BudgetStore for LocalBackend {
    fn mode(&self) -> StorageMode {
        StorageMode::Local
    }

    async fn try_save_budget(&self, record: &BudgetRecord) -> Result<(), PersistenceError> {
        let mut entries = self.read_entries().await?;
        let value = serde_json::to_value(record)?;
        match entries
            .iter_mut()
            .find(|e| entry_month(e) == Some(record.month_name.as_str()))
        {
            Some(existing) => *existing = value,
            None => entries.push(value),
        }
        self.write_entries(&entries).await?;
        tracing::debug!(month = %record.month_name, "budget saved locally");
        Ok(())
    }

    async fn try_delete_budget(&self, key: &str) -> Result<(), PersistenceError> {
        let entries = self.read_entries().await?;
        let before = entries.len();
        let kept: Vec<Value> = entries
            .into_iter()
            .filter(|e| entry_month(e).map(month_key).as_deref() != Some(key))
            .collect();
        if kept.len() != before {
            self.write_entries(&kept).await?;
            tracing::debug!(key, "budget deleted locally");
        }
        Ok(())
    }

    async fn try_save_fixed_data(
        &self,
        config: &FixedPlanningConfig,
    ) -> Result<(), PersistenceError> {
        let raw = serde_json::to_string(config)?;
        self.kv.set(FIXED_DATA_KEY, &raw).await.map_err(PersistenceError::Local)
    }

    async fn load_budgets(&self) -> Subscription<BudgetSnapshot> {
        let snapshot = match self.read_budgets().await {
            Ok(budgets) => {
                BudgetSnapshot::ok(budgets.into_iter().map(StoredBudget::from).collect())
            }
            Err(e) => {
                tracing::warn!("reading local budgets failed: {}", e);
                BudgetSnapshot::failed("Could not read the budgets saved on this device.")
            }
        };
        Subscription::ready(snapshot)
    }

    async fn load_fixed_data(&self) -> Subscription<Option<FixedPlanningConfig>> {
        let fixed = self.read_fixed().await.unwrap_or_else(|e| {
            tracing::warn!("reading local fixed planning failed: {}", e);
            None
        });
        Subscription::ready(fixed)
    }
}
