//! Application context: owns the current identity, picks the storage
//! backend for it, migrates guest data on sign-in and forwards the live
//! record set to the presentation layer as [`AppEvent`]s.

pub mod draft;
pub mod migration;

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::database::models::{FixedPlanningConfig, StoredBudget};
use crate::identity::Identity;
use crate::store::{
    BudgetSnapshot, BudgetStore, DocumentStore, LocalBackend, RemoteBackend, StorageMode,
    Subscription,
};

pub use draft::{BudgetDraft, DraftError, Field, ListKind, NewItem};
pub use migration::{migrate_local_data, MigrationReport};

#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    IdentityChanged(Option<Identity>),
    Budgets(BudgetSnapshot),
    FixedData(Option<FixedPlanningConfig>),
    Migrated(MigrationReport),
    MigrationFailed(String),
    Notice(String),
    DraftReset,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Draft(#[from] DraftError),

    #[error("sign in or continue as a guest first")]
    NoSession,

    #[error("could not save; try again")]
    SaveFailed,
}

#[derive(Default)]
struct Feeds {
    budgets: Option<JoinHandle<()>>,
    fixed: Option<JoinHandle<()>>,
}

impl Feeds {
    fn release_budgets(&mut self) {
        if let Some(task) = self.budgets.take() {
            task.abort();
        }
    }

    fn release_fixed(&mut self) {
        if let Some(task) = self.fixed.take() {
            task.abort();
        }
    }

    fn release_all(&mut self) {
        self.release_budgets();
        self.release_fixed();
    }
}

pub struct AppContext {
    local: LocalBackend,
    documents: Arc<dyn DocumentStore>,
    identity: Option<Identity>,
    backend: Option<Arc<dyn BudgetStore>>,
    feeds: Feeds,
    events: mpsc::UnboundedSender<AppEvent>,
    draft: BudgetDraft,
    /// Guest data is still on the device after a failed migration.
    migration_pending: bool,
}

impl AppContext {
    pub fn new(
        local: LocalBackend,
        documents: Arc<dyn DocumentStore>,
    ) -> (Self, mpsc::UnboundedReceiver<AppEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let ctx = Self {
            local,
            documents,
            identity: None,
            backend: None,
            feeds: Feeds::default(),
            events,
            draft: BudgetDraft::default(),
            migration_pending: false,
        };
        (ctx, rx)
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn mode(&self) -> Option<StorageMode> {
        self.backend.as_ref().map(|b| b.mode())
    }

    pub fn migration_pending(&self) -> bool {
        self.migration_pending
    }

    pub fn draft(&self) -> &BudgetDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut BudgetDraft {
        &mut self.draft
    }

    fn emit(&self, event: AppEvent) {
        // the receiver goes away only on shutdown
        let _ = self.events.send(event);
    }

    fn notice(&self, message: impl Into<String>) {
        self.emit(AppEvent::Notice(message.into()));
    }

    /// React to an identity change from the provider. Transitions are
    /// applied one at a time; a migration finishes before the new backend is
    /// bound. If it fails, the account keeps working on the device store
    /// until a retry succeeds.
    pub async fn apply_identity(&mut self, next: Option<Identity>) {
        let settled = self.backend.is_some() && !self.migration_pending;
        if next == self.identity && (next.is_none() || settled) {
            return;
        }

        self.feeds.release_all();
        self.backend = None;

        self.migration_pending = false;
        let backend = match &next {
            None => None,
            Some(identity) if identity.is_anonymous() => {
                Some(Arc::new(self.local.clone()) as Arc<dyn BudgetStore>)
            }
            Some(identity) => {
                let remote = RemoteBackend::new(self.documents.clone(), identity.id.clone());
                if self.migrate_if_needed(&remote).await {
                    Some(Arc::new(remote) as Arc<dyn BudgetStore>)
                } else {
                    self.migration_pending = true;
                    Some(Arc::new(self.local.clone()) as Arc<dyn BudgetStore>)
                }
            }
        };
        self.backend = backend;

        tracing::info!(
            user = next.as_ref().map(|i| i.id.as_str()).unwrap_or("-"),
            mode = ?self.mode(),
            "identity changed"
        );
        self.identity = next.clone();
        self.emit(AppEvent::IdentityChanged(next));

        if self.identity.is_none() {
            self.draft.reset();
            self.emit(AppEvent::DraftReset);
            return;
        }

        self.subscribe_budgets().await;
        self.subscribe_fixed().await;
    }

    /// Returns false when guest data is left on the device.
    async fn migrate_if_needed(&self, remote: &RemoteBackend) -> bool {
        match self.local.has_data().await {
            Ok(false) => true,
            Ok(true) => match migrate_local_data(&self.local, remote).await {
                Ok(report) => {
                    self.emit(AppEvent::Migrated(report));
                    true
                }
                Err(e) => {
                    tracing::warn!(user = remote.owner(), "migration failed: {}", e);
                    self.emit(AppEvent::MigrationFailed(e.to_string()));
                    false
                }
            },
            Err(e) => {
                tracing::warn!("could not inspect local data before migration: {}", e);
                self.emit(AppEvent::MigrationFailed(e.to_string()));
                false
            }
        }
    }

    /// Try again to move guest data into the signed-in account.
    pub async fn retry_migration(&mut self) -> Result<(), SessionError> {
        if !self.migration_pending {
            return Ok(());
        }
        let current = self.identity.clone();
        if current.is_none() {
            return Err(SessionError::NoSession);
        }
        self.apply_identity(current).await;
        Ok(())
    }

    async fn subscribe_budgets(&mut self) {
        self.feeds.release_budgets();
        if let Some(backend) = &self.backend {
            let feed = backend.load_budgets().await;
            self.feeds.budgets = Some(forward(feed, self.events.clone(), AppEvent::Budgets));
        }
    }

    async fn subscribe_fixed(&mut self) {
        self.feeds.release_fixed();
        if let Some(backend) = &self.backend {
            let feed = backend.load_fixed_data().await;
            self.feeds.fixed = Some(forward(feed, self.events.clone(), AppEvent::FixedData));
        }
    }

    fn active_backend(&self) -> Result<Arc<dyn BudgetStore>, SessionError> {
        self.backend.clone().ok_or(SessionError::NoSession)
    }

    /// Save the draft under its month name.
    pub async fn save_draft(&mut self) -> Result<(), SessionError> {
        let backend = self.active_backend()?;
        let author = self.identity.as_ref().map(|i| i.id.clone());
        let record = self.draft.to_record(author, Utc::now())?;

        if !backend.save_budget(&record).await {
            self.notice(format!("There was an error saving {}.", record.month_name));
            return Err(SessionError::SaveFailed);
        }

        match backend.mode() {
            StorageMode::Local => {
                self.notice("Saved locally!");
                // the local store has no change feed; deliver the new list
                self.subscribe_budgets().await;
            }
            StorageMode::Remote => self.notice("Saved!"),
        }
        Ok(())
    }

    pub async fn delete_budget(&mut self, key: &str) -> Result<(), SessionError> {
        let backend = self.active_backend()?;
        backend.delete_budget(key).await;
        if backend.mode() == StorageMode::Local {
            self.subscribe_budgets().await;
        }
        Ok(())
    }

    pub async fn save_fixed_data(
        &mut self,
        config: &FixedPlanningConfig,
    ) -> Result<(), SessionError> {
        let backend = self.active_backend()?;
        if !backend.save_fixed_data(config).await {
            self.notice("There was an error saving the fixed planning.");
            return Err(SessionError::SaveFailed);
        }
        if backend.mode() == StorageMode::Local {
            self.subscribe_fixed().await;
        }
        Ok(())
    }

    /// Load a saved month into the draft for editing.
    pub fn open_budget(&mut self, budget: &StoredBudget) {
        self.draft.load(&budget.record);
    }

    /// Release every standing subscription.
    pub fn shutdown(&mut self) {
        self.feeds.release_all();
        self.backend = None;
    }
}

impl Drop for AppContext {
    fn drop(&mut self) {
        self.feeds.release_all();
    }
}

fn forward<T, F>(
    mut feed: Subscription<T>,
    events: mpsc::UnboundedSender<AppEvent>,
    wrap: F,
) -> JoinHandle<()>
where
    T: Send + 'static,
    F: Fn(T) -> AppEvent + Send + 'static,
{
    tokio::spawn(async move {
        while let Some(value) = feed.recv().await {
            if events.send(wrap(value)).is_err() {
                break;
            }
        }
    })
}
