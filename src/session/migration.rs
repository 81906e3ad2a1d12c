use futures::future::{join_all, BoxFuture};

use crate::error::{MigrationError, PersistenceError};
use crate::store::{BudgetStore, LocalBackend, RemoteBackend};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub budgets: usize,
    pub fixed_data: bool,
}

/// Copy everything a guest stored on this device into `remote`, then clear
/// the device. All writes run concurrently; the device is cleared only if
/// every one of them succeeded. Remote writes that did succeed are not
/// rolled back.
pub async fn migrate_local_data(
    local: &LocalBackend,
    remote: &RemoteBackend,
) -> Result<MigrationReport, MigrationError> {
    let snapshot = local.take_snapshot().await.map_err(MigrationError::Read)?;

    let mut writes: Vec<BoxFuture<'_, Result<(), PersistenceError>>> = snapshot
        .budgets
        .iter()
        .map(|record| remote.try_save_budget(record))
        .collect();
    if let Some(fixed) = &snapshot.fixed {
        writes.push(remote.try_save_fixed_data(fixed));
    }

    let attempted = writes.len();
    let failed = join_all(writes)
        .await
        .into_iter()
        .filter_map(Result::err)
        .inspect(|e| tracing::warn!(user = remote.owner(), "migration write failed: {}", e))
        .count();

    if failed > 0 {
        return Err(MigrationError::Partial { failed, attempted });
    }

    local.clear().await.map_err(MigrationError::Clear)?;

    let report = MigrationReport {
        budgets: snapshot.budgets.len(),
        fixed_data: snapshot.fixed.is_some(),
    };
    tracing::info!(
        user = remote.owner(),
        budgets = report.budgets,
        fixed_data = report.fixed_data,
        "guest data migrated"
    );
    Ok(report)
}
