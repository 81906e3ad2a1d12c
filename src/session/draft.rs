use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::database::models::amount::parse_lenient;
use crate::database::models::{BudgetItem, BudgetRecord, ItemId, Liability};
use crate::totals::{compute_totals, BudgetTotals, SavingsProgress};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Assets,
    Owed,
    Liabilities,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewItem {
    Asset,
    Owed,
    StandardLiability,
    CreditCard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Amount,
    Total,
    Minimum,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DraftError {
    #[error("enter a name for the month")]
    MissingMonthName,
}

/// The month currently being edited.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetDraft {
    pub month_name: String,
    pub savings_goal: Decimal,
    pub assets: Vec<BudgetItem>,
    pub owed: Vec<BudgetItem>,
    pub liabilities: Vec<Liability>,
}

impl Default for BudgetDraft {
    fn default() -> Self {
        let zero = Decimal::ZERO;
        Self {
            month_name: String::new(),
            savings_goal: zero,
            assets: vec![
                BudgetItem::new("Nequi", zero),
                BudgetItem::new("Uala", zero),
                BudgetItem::new("Davivienda", zero),
                BudgetItem::new("Cash", zero),
            ],
            owed: vec![BudgetItem::new("Owed to me", zero)],
            liabilities: vec![
                Liability::credit_card("Credit Card N", zero, zero),
                Liability::credit_card("Credit Card V", zero, zero),
                Liability::standard("Motorbike", zero),
                Liability::standard("Rent", zero),
                Liability::standard("Utilities", zero),
                Liability::standard("Groceries", zero),
            ],
        }
    }
}

impl BudgetDraft {
    pub fn reset(&mut self) {
        *self = BudgetDraft::default();
    }

    pub fn add(&mut self, kind: NewItem) -> ItemId {
        match kind {
            NewItem::Asset => push_item(&mut self.assets, BudgetItem::blank()),
            NewItem::Owed => push_item(&mut self.owed, BudgetItem::blank()),
            NewItem::StandardLiability => {
                let liability = Liability::standard("", Decimal::ZERO);
                let id = liability.id();
                self.liabilities.push(liability);
                id
            }
            NewItem::CreditCard => {
                let card = Liability::credit_card("New card", Decimal::ZERO, Decimal::ZERO);
                let id = card.id();
                self.liabilities.push(card);
                id
            }
        }
    }

    /// Returns false when `index` is out of range.
    pub fn remove(&mut self, list: ListKind, index: usize) -> bool {
        let len = self.len(list);
        if index >= len {
            return false;
        }
        match list {
            ListKind::Assets => {
                self.assets.remove(index);
            }
            ListKind::Owed => {
                self.owed.remove(index);
            }
            ListKind::Liabilities => {
                self.liabilities.remove(index);
            }
        }
        true
    }

    pub fn len(&self, list: ListKind) -> usize {
        match list {
            ListKind::Assets => self.assets.len(),
            ListKind::Owed => self.owed.len(),
            ListKind::Liabilities => self.liabilities.len(),
        }
    }

    /// Edit one field from raw input. Numeric fields coerce unparseable
    /// input to zero. Returns false if the row does not exist or has no such
    /// field.
    pub fn set_field(&mut self, list: ListKind, index: usize, field: Field, raw: &str) -> bool {
        match list {
            ListKind::Assets => set_item_field(self.assets.get_mut(index), field, raw),
            ListKind::Owed => set_item_field(self.owed.get_mut(index), field, raw),
            ListKind::Liabilities => match (self.liabilities.get_mut(index), field) {
                (None, _) => false,
                (Some(l), Field::Name) => {
                    l.set_name(raw);
                    true
                }
                (Some(Liability::Standard(item)), Field::Amount) => {
                    item.amount = parse_lenient(raw);
                    true
                }
                (Some(Liability::CreditCard(card)), Field::Total) => {
                    card.total = parse_lenient(raw);
                    true
                }
                (Some(Liability::CreditCard(card)), Field::Minimum) => {
                    card.minimum = parse_lenient(raw);
                    true
                }
                (Some(_), _) => false,
            },
        }
    }

    pub fn set_savings_goal(&mut self, raw: &str) {
        self.savings_goal = parse_lenient(raw);
    }

    pub fn totals(&self) -> BudgetTotals {
        compute_totals(&self.assets, &self.owed, &self.liabilities)
    }

    pub fn progress(&self) -> SavingsProgress {
        SavingsProgress::new(self.totals().net_worth, self.savings_goal)
    }

    /// Snapshot the draft as a record, totals included.
    pub fn to_record(
        &self,
        author_id: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Result<BudgetRecord, DraftError> {
        let month_name = self.month_name.trim();
        if month_name.is_empty() {
            return Err(DraftError::MissingMonthName);
        }
        let totals = self.totals();
        Ok(BudgetRecord {
            month_name: month_name.to_string(),
            assets: self.assets.clone(),
            owed: self.owed.clone(),
            liabilities: self.liabilities.clone(),
            savings_goal: self.savings_goal,
            total_assets: totals.total_assets,
            total_liabilities: totals.total_liabilities,
            net_worth: totals.net_worth,
            partial_net_worth: totals.partial_net_worth,
            created_at,
            author_id,
        })
    }

    /// Replace the draft with a saved month.
    pub fn load(&mut self, record: &BudgetRecord) {
        self.month_name = record.month_name.clone();
        self.savings_goal = record.savings_goal;
        self.assets = record.assets.clone();
        self.owed = record.owed.clone();
        self.liabilities = record.liabilities.clone();
    }
}

fn push_item(list: &mut Vec<BudgetItem>, item: BudgetItem) -> ItemId {
    let id = item.id;
    list.push(item);
    id
}

fn set_item_field(item: Option<&mut BudgetItem>, field: Field, raw: &str) -> bool {
    match (item, field) {
        (Some(item), Field::Name) => {
            item.name = raw.to_string();
            true
        }
        (Some(item), Field::Amount) => {
            item.amount = parse_lenient(raw);
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_all_zero() {
        let draft = BudgetDraft::default();
        assert_eq!(draft.assets.len(), 4);
        assert_eq!(draft.owed.len(), 1);
        assert_eq!(draft.liabilities.len(), 6);
        assert_eq!(draft.totals(), BudgetTotals::default());
    }

    #[test]
    fn editing_fields_updates_totals() {
        let mut draft = BudgetDraft::default();
        assert!(draft.set_field(ListKind::Assets, 0, Field::Amount, "1000"));
        assert!(draft.set_field(ListKind::Liabilities, 0, Field::Total, "400"));
        assert!(draft.set_field(ListKind::Liabilities, 0, Field::Minimum, "40"));
        assert!(draft.set_field(ListKind::Liabilities, 3, Field::Amount, "100"));

        let totals = draft.totals();
        assert_eq!(totals.total_assets, Decimal::from(1000));
        assert_eq!(totals.total_liabilities, Decimal::from(500));
        assert_eq!(totals.partial_net_worth, Decimal::from(860));
    }

    #[test]
    fn mismatched_fields_are_rejected() {
        let mut draft = BudgetDraft::default();
        assert!(!draft.set_field(ListKind::Liabilities, 0, Field::Amount, "1"));
        assert!(!draft.set_field(ListKind::Liabilities, 3, Field::Minimum, "1"));
        assert!(!draft.set_field(ListKind::Owed, 5, Field::Name, "x"));
        assert!(!draft.set_field(ListKind::Assets, 0, Field::Total, "1"));
    }

    #[test]
    fn garbage_numbers_become_zero() {
        let mut draft = BudgetDraft::default();
        draft.set_field(ListKind::Assets, 0, Field::Amount, "12");
        draft.set_field(ListKind::Assets, 0, Field::Amount, "twelve");
        assert_eq!(draft.assets[0].amount, Decimal::ZERO);
    }

    #[test]
    fn add_and_remove_keep_order() {
        let mut draft = BudgetDraft::default();
        let id = draft.add(NewItem::CreditCard);
        assert_eq!(draft.liabilities.last().map(Liability::id), Some(id));
        assert!(draft.remove(ListKind::Assets, 0));
        assert_eq!(draft.assets[0].name, "Uala");
        assert!(!draft.remove(ListKind::Owed, 3));
    }

    #[test]
    fn oversized_input_does_not_bring_the_draft_down() {
        let mut draft = BudgetDraft::default();
        draft.set_field(ListKind::Assets, 0, Field::Amount, "50000000000000000000000000000");
        draft.set_field(ListKind::Assets, 1, Field::Amount, "50000000000000000000000000000");
        draft.set_savings_goal("1");

        let totals = draft.totals();
        assert_eq!(totals.total_assets, Decimal::MAX);
        assert_eq!(draft.progress().display_percent(), Decimal::ONE_HUNDRED);

        draft.month_name = "Big".into();
        let record = draft.to_record(None, Utc::now()).unwrap();
        assert_eq!(record.net_worth, Decimal::MAX);
    }

    #[test]
    fn record_requires_month_name_and_snapshots_totals() {
        let mut draft = BudgetDraft::default();
        let now = Utc::now();
        assert_eq!(draft.to_record(None, now), Err(DraftError::MissingMonthName));

        draft.month_name = "  March 2024 ".into();
        draft.set_field(ListKind::Assets, 1, Field::Amount, "300");
        let record = draft.to_record(Some("u1".into()), now).unwrap();
        assert_eq!(record.month_name, "March 2024");
        assert_eq!(record.key(), "March-2024");
        assert_eq!(record.net_worth, Decimal::from(300));
        assert_eq!(record.author_id.as_deref(), Some("u1"));
    }
}
