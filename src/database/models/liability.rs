use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use super::item::{next_item_id, BudgetItem, ItemId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditCardLiability {
    #[serde(default)]
    pub id: ItemId,
    #[serde(default)]
    pub name: String,
    /// Full outstanding balance.
    #[serde(default, with = "super::amount")]
    pub total: Decimal,
    /// Minimum payment due this month.
    #[serde(default, with = "super::amount")]
    pub minimum: Decimal,
}

/// Something the user owes. Stored with a `type` discriminant of
/// `"standard"` or `"credit-card"`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Liability {
    #[serde(rename = "standard")]
    Standard(BudgetItem),
    #[serde(rename = "credit-card")]
    CreditCard(CreditCardLiability),
}

impl Liability {
    pub fn standard(name: impl Into<String>, amount: Decimal) -> Self {
        Liability::Standard(BudgetItem::new(name, amount))
    }

    pub fn credit_card(name: impl Into<String>, total: Decimal, minimum: Decimal) -> Self {
        Liability::CreditCard(CreditCardLiability {
            id: next_item_id(),
            name: name.into(),
            total,
            minimum,
        })
    }

    pub fn id(&self) -> ItemId {
        match self {
            Liability::Standard(item) => item.id,
            Liability::CreditCard(card) => card.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Liability::Standard(item) => &item.name,
            Liability::CreditCard(card) => &card.name,
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        match self {
            Liability::Standard(item) => item.name = name.into(),
            Liability::CreditCard(card) => card.name = name.into(),
        }
    }

    /// Contribution to total liabilities.
    pub fn full_amount(&self) -> Decimal {
        match self {
            Liability::Standard(item) => item.amount,
            Liability::CreditCard(card) => card.total,
        }
    }

    /// Contribution to the minimum-due liabilities behind partial net worth.
    pub fn due_amount(&self) -> Decimal {
        match self {
            Liability::Standard(item) => item.amount,
            Liability::CreditCard(card) => card.minimum,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Liability::Standard(_) => "standard",
            Liability::CreditCard(_) => "credit-card",
        }
    }
}

// Flat shape as found in storage. Anything that is not explicitly a credit
// card is read as a standard liability.
#[derive(Deserialize)]
struct StoredLiability {
    #[serde(default)]
    id: ItemId,
    #[serde(default)]
    name: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default, with = "super::amount")]
    amount: Decimal,
    #[serde(default, with = "super::amount")]
    total: Decimal,
    #[serde(default, with = "super::amount")]
    minimum: Decimal,
}

impl From<StoredLiability> for Liability {
    fn from(raw: StoredLiability) -> Self {
        match raw.kind.as_deref() {
            Some("credit-card") => Liability::CreditCard(CreditCardLiability {
                id: raw.id,
                name: raw.name,
                total: raw.total,
                minimum: raw.minimum,
            }),
            _ => Liability::Standard(BudgetItem {
                id: raw.id,
                name: raw.name,
                amount: raw.amount,
            }),
        }
    }
}

impl<'de> Deserialize<'de> for Liability {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        StoredLiability::deserialize(deserializer).map(Liability::from)
    }
}
