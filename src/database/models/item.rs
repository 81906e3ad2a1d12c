use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};

/// Row id used only to address an item while editing; never a storage key.
pub type ItemId = i64;

static LAST_ITEM_ID: AtomicI64 = AtomicI64::new(0);

/// Millisecond-seeded ids, strictly increasing within the process.
pub fn next_item_id() -> ItemId {
    let now = chrono::Utc::now().timestamp_millis();
    let mut prev = LAST_ITEM_ID.load(Ordering::Relaxed);
    loop {
        let candidate = if now > prev { now } else { prev + 1 };
        let swapped = LAST_ITEM_ID.compare_exchange_weak(
            prev,
            candidate,
            Ordering::Relaxed,
            Ordering::Relaxed,
        );
        match swapped {
            Ok(_) => return candidate,
            Err(actual) => prev = actual,
        }
    }
}

// asset, money owed to the user, standard liability or fixed expense
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetItem {
    #[serde(default)]
    pub id: ItemId,
    #[serde(default)]
    pub name: String,
    #[serde(default, with = "super::amount")]
    pub amount: Decimal,
}

impl BudgetItem {
    pub fn new(name: impl Into<String>, amount: Decimal) -> Self {
        Self {
            id: next_item_id(),
            name: name.into(),
            amount,
        }
    }

    pub fn blank() -> Self {
        Self::new("", Decimal::ZERO)
    }
}
