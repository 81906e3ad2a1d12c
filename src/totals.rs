//! Derived figures for a month: totals, net worth and savings progress.
//! Everything here is pure.

use rust_decimal::Decimal;

use crate::database::models::{BudgetItem, FixedPlanningConfig, Liability};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BudgetTotals {
    pub total_assets: Decimal,
    pub total_liabilities: Decimal,
    /// Liabilities counting only the minimum due on credit cards.
    pub partial_liabilities: Decimal,
    pub net_worth: Decimal,
    pub partial_net_worth: Decimal,
}

// Amounts come straight from user input and stored documents, so all
// arithmetic saturates at the Decimal range instead of panicking.
fn saturating_sum(amounts: impl Iterator<Item = Decimal>) -> Decimal {
    amounts.fold(Decimal::ZERO, Decimal::saturating_add)
}

pub fn sum_items(items: &[BudgetItem]) -> Decimal {
    saturating_sum(items.iter().map(|i| i.amount))
}

pub fn total_liabilities(liabilities: &[Liability]) -> Decimal {
    saturating_sum(liabilities.iter().map(Liability::full_amount))
}

pub fn partial_liabilities(liabilities: &[Liability]) -> Decimal {
    saturating_sum(liabilities.iter().map(Liability::due_amount))
}

pub fn compute_totals(
    assets: &[BudgetItem],
    owed: &[BudgetItem],
    liabilities: &[Liability],
) -> BudgetTotals {
    let total_assets = sum_items(assets).saturating_add(sum_items(owed));
    let total_liabilities = total_liabilities(liabilities);
    let partial_liabilities = partial_liabilities(liabilities);

    BudgetTotals {
        total_assets,
        total_liabilities,
        partial_liabilities,
        net_worth: total_assets.saturating_sub(total_liabilities),
        partial_net_worth: total_assets.saturating_sub(partial_liabilities),
    }
}

/// Share of the savings goal covered by net worth, in `[0, 100]`.
/// A goal of zero or less means no progress.
pub fn savings_progress_percent(net_worth: Decimal, savings_goal: Decimal) -> Decimal {
    if savings_goal <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let current = net_worth.max(Decimal::ZERO);
    // a quotient too large to represent is far past the goal
    let percent = current
        .saturating_mul(HUNDRED)
        .checked_div(savings_goal)
        .unwrap_or(HUNDRED);
    percent.clamp(Decimal::ZERO, HUNDRED)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressBand {
    Low,
    Medium,
    High,
}

impl ProgressBand {
    pub fn for_percent(percent: Decimal) -> Self {
        if percent < Decimal::from(40) {
            ProgressBand::Low
        } else if percent < Decimal::from(75) {
            ProgressBand::Medium
        } else {
            ProgressBand::High
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SavingsProgress {
    /// Net worth counted towards the goal (never negative).
    pub current: Decimal,
    pub goal: Decimal,
    pub percent: Decimal,
    pub band: ProgressBand,
}

impl SavingsProgress {
    pub fn new(net_worth: Decimal, savings_goal: Decimal) -> Self {
        let percent = savings_progress_percent(net_worth, savings_goal);
        Self {
            current: net_worth.max(Decimal::ZERO),
            goal: savings_goal,
            percent,
            band: ProgressBand::for_percent(percent),
        }
    }

    /// Whole percent as displayed.
    pub fn display_percent(&self) -> Decimal {
        self.percent.floor()
    }
}

/// Half-month view of the fixed planning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixedPlanningSummary {
    pub income_q1: Decimal,
    pub expenses_q1: Decimal,
    pub remaining_q1: Decimal,
    pub income_q2: Decimal,
    pub expenses_q2: Decimal,
    pub remaining_q2: Decimal,
}

pub fn summarize_fixed(config: &FixedPlanningConfig) -> FixedPlanningSummary {
    let expenses_q1 = sum_items(&config.fixed_expenses_q1);
    let expenses_q2 = sum_items(&config.fixed_expenses_q2);
    FixedPlanningSummary {
        income_q1: config.income_q1,
        expenses_q1,
        remaining_q1: config.income_q1.saturating_sub(expenses_q1),
        income_q2: config.income_q2,
        expenses_q2,
        remaining_q2: config.income_q2.saturating_sub(expenses_q2),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::BudgetItem;

    fn d(v: i64) -> Decimal {
        Decimal::from(v)
    }

    #[test]
    fn empty_inputs_yield_zero() {
        assert_eq!(compute_totals(&[], &[], &[]), BudgetTotals::default());
    }

    #[test]
    fn credit_cards_count_total_fully_and_minimum_partially() {
        let liabilities = vec![
            Liability::credit_card("Visa", d(5000), d(200)),
            Liability::standard("Rent", d(300)),
        ];
        assert_eq!(total_liabilities(&liabilities), d(5300));
        assert_eq!(partial_liabilities(&liabilities), d(500));
    }

    #[test]
    fn totals_combine_assets_and_owed() {
        let assets = vec![BudgetItem::new("Cash", d(1000)), BudgetItem::new("Bank", d(2500))];
        let owed = vec![BudgetItem::new("Owed to me", d(500))];
        let liabilities = vec![
            Liability::credit_card("Visa", d(5000), d(200)),
            Liability::standard("Rent", d(300)),
        ];

        let totals = compute_totals(&assets, &owed, &liabilities);
        assert_eq!(totals.total_assets, d(4000));
        assert_eq!(totals.total_liabilities, d(5300));
        assert_eq!(totals.net_worth, d(-1300));
        assert_eq!(totals.partial_liabilities, d(500));
        assert_eq!(totals.partial_net_worth, d(3500));
    }

    #[test]
    fn savings_progress_is_clamped() {
        assert_eq!(savings_progress_percent(d(750), d(1000)), d(75));
        assert_eq!(savings_progress_percent(d(1000), d(1000)), d(100));
        assert_eq!(savings_progress_percent(d(4000), d(1000)), d(100));
        assert_eq!(savings_progress_percent(d(-250), d(1000)), d(0));
        assert_eq!(savings_progress_percent(d(750), d(0)), d(0));
        assert_eq!(savings_progress_percent(d(750), d(-10)), d(0));
    }

    #[test]
    fn progress_display_is_floored_and_banded() {
        let p = SavingsProgress::new(d(399), d(1000));
        assert_eq!(p.display_percent(), d(39));
        assert_eq!(p.band, ProgressBand::Low);

        let p = SavingsProgress::new(d(749), d(1000));
        assert_eq!(p.band, ProgressBand::Medium);

        let p = SavingsProgress::new(d(-5), d(1000));
        assert_eq!(p.current, d(0));
        assert_eq!(p.band, ProgressBand::Low);

        assert_eq!(SavingsProgress::new(d(750), d(1000)).band, ProgressBand::High);
    }

    #[test]
    fn fixed_summary_subtracts_expenses_per_half() {
        let config = FixedPlanningConfig {
            income_q1: d(2000),
            income_q2: d(1800),
            fixed_expenses_q1: vec![
                BudgetItem::new("Rent", d(900)),
                BudgetItem::new("Phone", d(50)),
            ],
            fixed_expenses_q2: vec![],
        };
        let summary = summarize_fixed(&config);
        assert_eq!(summary.expenses_q1, d(950));
        assert_eq!(summary.remaining_q1, d(1050));
        assert_eq!(summary.remaining_q2, d(1800));
    }

    #[test]
    fn huge_amounts_saturate_instead_of_overflowing() {
        let big: Decimal = "50000000000000000000000000000".parse().unwrap();
        let assets = vec![BudgetItem::new("A", big), BudgetItem::new("B", big)];
        let liabilities = vec![Liability::standard("Debt", Decimal::MIN)];

        let totals = compute_totals(&assets, &[], &liabilities);
        assert_eq!(totals.total_assets, Decimal::MAX);
        assert_eq!(totals.net_worth, Decimal::MAX);

        let owed_only = compute_totals(&[], &[], &[Liability::standard("Debt", Decimal::MAX)]);
        assert_eq!(owed_only.net_worth, Decimal::MIN);
    }

    #[test]
    fn progress_against_tiny_goal_is_full() {
        let net_worth: Decimal = "1000000000000000000000000000".parse().unwrap();
        assert_eq!(savings_progress_percent(net_worth, d(1)), d(100));
        assert_eq!(savings_progress_percent(Decimal::MAX, Decimal::new(1, 4)), d(100));
    }
}
