mod common;

use std::sync::Arc;
use std::time::Duration;

use budget_snapshots::database::models::FixedPlanningConfig;
use budget_snapshots::identity::{
    Identity, IdentityProvider, LocalIdentityProvider, SignInRequest,
};
use budget_snapshots::session::{
    AppContext, AppEvent, BudgetDraft, Field, ListKind, MigrationReport, SessionError,
};
use budget_snapshots::store::{BudgetSnapshot, BudgetStore, DocumentStore, StorageMode};
use common::{stores, FlakyDocumentStore};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use serde_json::json;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::timeout;

/// Skip events until one matches, failing after a second.
async fn wait_for<F>(events: &mut UnboundedReceiver<AppEvent>, mut pred: F) -> AppEvent
where
    F: FnMut(&AppEvent) -> bool,
{
    timeout(Duration::from_secs(1), async {
        loop {
            let event = events.recv().await.expect("event channel closed");
            if pred(&event) {
                return event;
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}

async fn budgets(events: &mut UnboundedReceiver<AppEvent>) -> BudgetSnapshot {
    match wait_for(events, |e| matches!(e, AppEvent::Budgets(_))).await {
        AppEvent::Budgets(snapshot) => snapshot,
        _ => unreachable!(),
    }
}

fn months(snapshot: &BudgetSnapshot) -> Vec<String> {
    let mut names: Vec<String> = snapshot
        .budgets
        .iter()
        .map(|b| b.record.month_name.clone())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn nothing_is_saved_without_a_session() {
    let (local, docs) = stores().await;
    let (mut ctx, _events) = AppContext::new(local, docs);
    ctx.draft_mut().month_name = "March".into();

    assert!(matches!(ctx.save_draft().await, Err(SessionError::NoSession)));
    assert_eq!(ctx.mode(), None);
}

#[tokio::test]
async fn guest_saves_locally_then_sign_in_migrates_and_binds_remote() {
    let (local, docs) = stores().await;
    let (mut ctx, mut events) = AppContext::new(local.clone(), docs.clone());

    ctx.apply_identity(Some(Identity::anonymous("guest-1"))).await;
    assert_eq!(ctx.mode(), Some(StorageMode::Local));
    assert!(budgets(&mut events).await.budgets.is_empty());

    ctx.draft_mut().month_name = "March 2024".into();
    ctx.draft_mut().set_field(ListKind::Assets, 0, Field::Amount, "2500");
    ctx.save_draft().await.unwrap();
    assert_eq!(
        wait_for(&mut events, |e| matches!(e, AppEvent::Notice(_))).await,
        AppEvent::Notice("Saved locally!".into())
    );
    assert_eq!(months(&budgets(&mut events).await), ["March 2024"]);

    let ana = Identity::authenticated("ana", Some("Ana".into()), None);
    ctx.apply_identity(Some(ana.clone())).await;
    assert_eq!(ctx.mode(), Some(StorageMode::Remote));
    assert_eq!(
        wait_for(&mut events, |e| matches!(e, AppEvent::Migrated(_))).await,
        AppEvent::Migrated(MigrationReport {
            budgets: 1,
            fixed_data: false
        })
    );
    assert_eq!(
        wait_for(&mut events, |e| matches!(e, AppEvent::IdentityChanged(_))).await,
        AppEvent::IdentityChanged(Some(ana))
    );

    let remote = budgets(&mut events).await;
    assert_eq!(months(&remote), ["March 2024"]);
    assert_eq!(remote.budgets[0].id, "March-2024");
    assert_eq!(remote.budgets[0].record.net_worth, Decimal::from(2500));
    assert!(!local.has_data().await.unwrap());
}

#[tokio::test]
async fn remote_feed_redelivers_on_every_change() {
    let (local, docs) = stores().await;
    let (mut ctx, mut events) = AppContext::new(local, docs.clone());

    ctx.apply_identity(Some(Identity::authenticated("ana", None, None))).await;
    assert!(budgets(&mut events).await.budgets.is_empty());

    ctx.draft_mut().month_name = "May".into();
    ctx.save_draft().await.unwrap();
    assert_eq!(months(&budgets(&mut events).await), ["May"]);

    // a write from another device shows up without asking
    let mut other = ctx.draft().to_record(Some("ana".into()), chrono::Utc::now()).unwrap();
    other.month_name = "June".into();
    docs.put_item("ana", "June", serde_json::to_value(&other).unwrap())
        .await
        .unwrap();
    assert_eq!(months(&budgets(&mut events).await), ["June", "May"]);

    ctx.delete_budget("May").await.unwrap();
    assert_eq!(months(&budgets(&mut events).await), ["June"]);
}

#[tokio::test]
async fn fixed_planning_follows_the_active_backend() {
    let (local, docs) = stores().await;
    let (mut ctx, mut events) = AppContext::new(local, docs.clone());
    ctx.apply_identity(Some(Identity::anonymous("guest-1"))).await;

    let fixed = FixedPlanningConfig {
        income_q1: Decimal::from(800),
        ..Default::default()
    };
    ctx.save_fixed_data(&fixed).await.unwrap();
    let delivered = wait_for(&mut events, |e| matches!(e, AppEvent::FixedData(Some(_)))).await;
    assert_eq!(delivered, AppEvent::FixedData(Some(fixed)));

    ctx.apply_identity(Some(Identity::authenticated("ana", None, None))).await;
    let config = docs.get_config("ana").await.unwrap().unwrap();
    assert_eq!(config["incomeQ1"], json!(800));
}

#[tokio::test]
async fn signing_out_resets_the_draft_and_stops_delivery() {
    let (local, docs) = stores().await;
    let (mut ctx, mut events) = AppContext::new(local, docs.clone());
    ctx.apply_identity(Some(Identity::authenticated("ana", None, None))).await;
    budgets(&mut events).await;

    ctx.draft_mut().month_name = "July".into();
    ctx.apply_identity(None).await;
    wait_for(&mut events, |e| matches!(e, AppEvent::DraftReset)).await;
    assert_eq!(ctx.draft().month_name, "");
    assert_eq!(ctx.mode(), None);

    docs.put_item("ana", "Aug", json!({"monthName": "Aug"})).await.unwrap();
    let late = timeout(Duration::from_millis(200), async {
        loop {
            if let Some(AppEvent::Budgets(_)) = events.recv().await {
                return;
            }
        }
    })
    .await;
    assert!(late.is_err(), "a released feed kept delivering");
}

#[tokio::test]
async fn provider_changes_drive_the_context() {
    let (local, docs) = stores().await;
    let (mut ctx, mut events) = AppContext::new(local, docs);
    let provider = LocalIdentityProvider::new();
    let mut identities = provider.subscribe();

    provider.sign_in_anonymously().await.unwrap();
    identities.changed().await.unwrap();
    ctx.apply_identity(identities.borrow_and_update().clone()).await;
    assert_eq!(ctx.mode(), Some(StorageMode::Local));

    provider
        .sign_in(SignInRequest {
            id: "ana".into(),
            display_name: None,
            email: Some("ana@example.com".into()),
        })
        .await
        .unwrap();
    identities.changed().await.unwrap();
    ctx.apply_identity(identities.borrow_and_update().clone()).await;
    assert_eq!(ctx.mode(), Some(StorageMode::Remote));
    assert_eq!(ctx.identity().map(|i| i.id.as_str()), Some("ana"));

    wait_for(&mut events, |e| {
        matches!(e, AppEvent::IdentityChanged(Some(i)) if !i.is_anonymous())
    })
    .await;
}

#[tokio::test]
async fn failed_migration_keeps_the_account_on_the_device_until_retried() {
    let (local, docs) = stores().await;
    let mut draft = BudgetDraft::default();
    draft.month_name = "March".into();
    let record = draft.to_record(None, chrono::Utc::now()).unwrap();
    assert!(local.save_budget(&record).await);

    let flaky = Arc::new(FlakyDocumentStore::new(docs.clone(), &["March"]));
    let (mut ctx, mut events) = AppContext::new(local.clone(), flaky.clone());
    let ana = Identity::authenticated("ana", None, None);
    ctx.apply_identity(Some(ana.clone())).await;

    let failed = wait_for(&mut events, |e| matches!(e, AppEvent::MigrationFailed(_))).await;
    assert!(matches!(failed, AppEvent::MigrationFailed(message) if message.contains("1 of 1")));
    assert_eq!(ctx.identity(), Some(&ana));
    assert_eq!(ctx.mode(), Some(StorageMode::Local));
    assert!(ctx.migration_pending());
    assert!(local.has_data().await.unwrap());
    assert!(docs.list_items("ana").await.unwrap().is_empty());

    // the account still sees and edits its guest months
    assert_eq!(months(&budgets(&mut events).await), ["March"]);
    ctx.draft_mut().month_name = "April".into();
    ctx.save_draft().await.unwrap();
    assert_eq!(months(&budgets(&mut events).await), ["April", "March"]);

    // the same identity again counts as a retry, not a no-op
    ctx.apply_identity(Some(ana.clone())).await;
    wait_for(&mut events, |e| matches!(e, AppEvent::MigrationFailed(_))).await;
    assert_eq!(ctx.mode(), Some(StorageMode::Local));

    flaky.recover();
    ctx.retry_migration().await.unwrap();
    assert_eq!(
        wait_for(&mut events, |e| matches!(e, AppEvent::Migrated(_))).await,
        AppEvent::Migrated(MigrationReport {
            budgets: 2,
            fixed_data: false
        })
    );
    assert_eq!(ctx.mode(), Some(StorageMode::Remote));
    assert!(!ctx.migration_pending());
    assert!(!local.has_data().await.unwrap());
    assert_eq!(months(&budgets(&mut events).await), ["April", "March"]);
}

#[tokio::test]
async fn retry_without_a_pending_migration_changes_nothing() {
    let (local, docs) = stores().await;
    let (mut ctx, mut events) = AppContext::new(local, docs);
    ctx.apply_identity(Some(Identity::authenticated("ana", None, None))).await;
    budgets(&mut events).await;

    ctx.retry_migration().await.unwrap();
    assert_eq!(ctx.mode(), Some(StorageMode::Remote));
    let reapplied = timeout(Duration::from_millis(200), async {
        loop {
            if let Some(AppEvent::IdentityChanged(_)) = events.recv().await {
                return;
            }
        }
    })
    .await;
    assert!(reapplied.is_err(), "an idle retry re-applied the session");
}
