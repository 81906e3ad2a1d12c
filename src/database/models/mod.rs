pub mod amount;
pub mod budget;
pub mod fixed;
pub mod item;
pub mod liability;

pub use budget::{month_from_key, month_key, BudgetRecord, StoredBudget};
pub use fixed::FixedPlanningConfig;
pub use item::{next_item_id, BudgetItem, ItemId};
pub use liability::{CreditCardLiability, Liability};
