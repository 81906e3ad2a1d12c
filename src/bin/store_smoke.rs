use std::sync::Arc;

use budget_snapshots::database::db::connection::get_db_pool;
use budget_snapshots::database::db::documents::SqliteDocumentStore;
use budget_snapshots::database::db::kv::SqliteKvStore;
use budget_snapshots::database::db::migrate;
use budget_snapshots::database::models::{month_key, BudgetItem, FixedPlanningConfig};
use budget_snapshots::session::{migrate_local_data, BudgetDraft, Field, ListKind};
use budget_snapshots::store::{BudgetStore, DocumentStore, LocalBackend, RemoteBackend};
use budget_snapshots::telemetry;
use chrono::Utc;
use dotenvy::dotenv;
use rust_decimal::Decimal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    telemetry::init();

    /* ==========Testing========== */
    let db_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://./store_smoke.db?mode=rwc".to_string());
    let pool = get_db_pool(&db_url).await?;

    migrate::run_migrations(&pool).await?;
    println!("Migrations ran successfully!");

    // ----------------------------------------------------
    // TEST: LOCAL SAVE
    // ----------------------------------------------------
    println!("\n--- Testing: local save_budget ---");
    let local = LocalBackend::new(Arc::new(SqliteKvStore::new(pool.clone())));
    local.clear().await?;

    let mut draft = BudgetDraft::default();
    draft.month_name = "Smoke Month".to_string();
    draft.set_field(ListKind::Assets, 0, Field::Amount, "1500000");
    draft.set_field(ListKind::Liabilities, 0, Field::Total, "400000");
    draft.set_field(ListKind::Liabilities, 0, Field::Minimum, "40000");
    let record = draft.to_record(None, Utc::now())?;

    assert!(local.save_budget(&record).await, "local save failed");
    assert!(local.save_budget(&record).await, "second local save failed");
    let mut feed = local.load_budgets().await;
    let snapshot = feed.recv().await.unwrap_or_default();
    println!("   > Saved months: {}", snapshot.budgets.len());
    assert_eq!(snapshot.budgets.len(), 1, "saving the same month twice must upsert");
    assert_eq!(snapshot.budgets[0].id, month_key("Smoke Month"));

    println!("\n--- Testing: local save_fixed_data ---");
    let fixed = FixedPlanningConfig {
        income_q1: Decimal::from(2_000_000),
        fixed_expenses_q1: vec![BudgetItem::new("Rent", Decimal::from(900_000))],
        ..Default::default()
    };
    assert!(local.save_fixed_data(&fixed).await, "fixed data save failed");
    println!("   > Local data present: {}", local.has_data().await?);

    // ----------------------------------------------------
    // TEST: MIGRATION TO DOCUMENT STORE
    // ----------------------------------------------------
    println!("\n--- Testing: migrate_local_data ---");
    let documents = Arc::new(SqliteDocumentStore::new(pool.clone()));
    let owner = "smoke-user";
    let remote = RemoteBackend::new(documents.clone(), owner);
    let report = migrate_local_data(&local, &remote).await?;
    println!("   > {:?}", report);
    assert_eq!(report.budgets, 1);
    assert!(report.fixed_data);
    assert!(!local.has_data().await?, "local data must be cleared after migration");

    let items = documents.list_items(owner).await?;
    println!("   > Remote items: {:?}", items.iter().map(|d| &d.id).collect::<Vec<_>>());
    assert_eq!(items.len(), 1);

    // ----------------------------------------------------
    // TEST: REMOTE DELETE
    // ----------------------------------------------------
    println!("\n--- Testing: remote delete_budget ---");
    remote.delete_budget(&record.key()).await;
    let items = documents.list_items(owner).await?;
    assert!(items.is_empty(), "remote item was not deleted");

    println!("\nAll store checks passed.");
    Ok(())
}
