use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::item::BudgetItem;

/// Recurring income and fixed expenses per half of the month. One per user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedPlanningConfig {
    #[serde(default, with = "super::amount")]
    pub income_q1: Decimal,
    #[serde(default, with = "super::amount")]
    pub income_q2: Decimal,
    #[serde(default)]
    pub fixed_expenses_q1: Vec<BudgetItem>,
    #[serde(default)]
    pub fixed_expenses_q2: Vec<BudgetItem>,
}

impl FixedPlanningConfig {
    pub fn is_empty(&self) -> bool {
        self == &FixedPlanningConfig::default()
    }
}
