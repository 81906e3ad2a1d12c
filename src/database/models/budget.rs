use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::item::BudgetItem;
use super::liability::Liability;

const KEY_DELIMITER: char = '-';

/// Storage address for a month: every space becomes `-`.
pub fn month_key(month_name: &str) -> String {
    month_name.replace(' ', &KEY_DELIMITER.to_string())
}

/// Inverse of [`month_key`] for names that contain no `-`.
pub fn month_from_key(key: &str) -> String {
    key.replace(KEY_DELIMITER, " ")
}

/// A saved month. Totals are snapshotted when the record is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetRecord {
    pub month_name: String,
    #[serde(default)]
    pub assets: Vec<BudgetItem>,
    #[serde(default)]
    pub owed: Vec<BudgetItem>,
    #[serde(default)]
    pub liabilities: Vec<Liability>,
    #[serde(default, with = "super::amount")]
    pub savings_goal: Decimal,
    #[serde(default, with = "super::amount")]
    pub total_assets: Decimal,
    #[serde(default, with = "super::amount")]
    pub total_liabilities: Decimal,
    #[serde(default, with = "super::amount")]
    pub net_worth: Decimal,
    #[serde(default, with = "super::amount")]
    pub partial_net_worth: Decimal,
    #[serde(default = "unknown_created_at")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub author_id: Option<String>,
}

/// Records written without a timestamp sort as the oldest.
fn unknown_created_at() -> DateTime<Utc> {
    DateTime::UNIX_EPOCH
}

impl BudgetRecord {
    pub fn key(&self) -> String {
        month_key(&self.month_name)
    }
}

/// A record together with the key it is stored under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredBudget {
    pub id: String,
    pub record: BudgetRecord,
}

impl From<BudgetRecord> for StoredBudget {
    fn from(record: BudgetRecord) -> Self {
        Self { id: record.key(), record }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_round_trip_for_names_with_spaces() {
        assert_eq!(month_key("March 2024"), "March-2024");
        assert_eq!(month_from_key("March-2024"), "March 2024");
        for name in ["March", "March 2024", "end of  year 2025", " leading"] {
            assert_eq!(month_from_key(&month_key(name)), name);
        }
    }

    #[test]
    fn reads_records_written_without_totals() {
        let record: BudgetRecord = serde_json::from_value(json!({
            "monthName": "Jan",
            "assets": [{"id": 1, "name": "Cash", "amount": 10}],
            "liabilities": [
                {"id": 2, "name": "Card", "type": "credit-card", "total": 4, "minimum": 1}
            ],
            "savingsGoal": 100,
            "netWorth": 6,
            "createdAt": "2024-01-31T10:00:00.000Z",
            "authorId": "u1"
        }))
        .unwrap();
        assert_eq!(record.key(), "Jan");
        assert!(record.owed.is_empty());
        assert_eq!(record.total_assets, Decimal::ZERO);
        assert_eq!(record.net_worth, Decimal::from(6));
        assert_eq!(record.author_id.as_deref(), Some("u1"));
    }

    #[test]
    fn missing_timestamp_falls_back_to_the_epoch() {
        let record: BudgetRecord = serde_json::from_value(json!({"monthName": "Feb"})).unwrap();
        assert_eq!(record.created_at, DateTime::<Utc>::UNIX_EPOCH);
        assert!(record.assets.is_empty());

        let garbled = serde_json::from_value::<BudgetRecord>(json!({
            "monthName": "Feb",
            "createdAt": "last tuesday"
        }));
        assert!(garbled.is_err());
    }
}
