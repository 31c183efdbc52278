//! Column-level changes to stored rows.
//!
//! Updates only carry mutable columns. Deserializing a full row into one of
//! these types drops `id`, `user_id`, timestamps and joined relations, so a
//! row read back from the store can be sent as an update unchanged.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::finance::{CategoryType, RecurrenceFrequency};
use crate::portfolio::PortfolioEntry;
use crate::record::{CategoryRow, CategoryTypeRow, RecurrenceFrequencyRow, TransactionRow};
use crate::time::format_api_date;

/// Fields of a transaction to be created; the store assigns id and owner.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub category_id: String,
    pub amount: f64,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub recurrence_frequency: Option<RecurrenceFrequency>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionUpdate {
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_recurring: Option<bool>,
    #[serde(default)]
    pub recurrence_frequency_id: Option<i64>,
}

impl TransactionUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overwrite the columns that are set. The joined recurrence relation
    /// follows `recurrence_frequency_id`; the category relation is left to
    /// the caller, which owns the categories table.
    pub fn apply(&self, row: &mut TransactionRow) {
        if let Some(category_id) = &self.category_id {
            row.category_id = Some(category_id.clone());
        }
        if let Some(amount) = self.amount {
            row.amount = Some(amount);
        }
        if let Some(date) = self.date {
            row.date = format_api_date(date);
        }
        if let Some(description) = &self.description {
            row.description = Some(description.clone());
        }
        if let Some(id) = self.recurrence_frequency_id {
            row.recurrence_frequency_id = Some(id);
            row.recurrence_frequency = RecurrenceFrequency::from_id(id).map(RecurrenceFrequencyRow::from);
            row.is_recurring = true;
        }
        if let Some(is_recurring) = self.is_recurring {
            row.is_recurring = is_recurring;
            if !is_recurring {
                row.recurrence_frequency_id = None;
                row.recurrence_frequency = None;
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub type_id: Option<i64>,
}

impl CategoryUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply(&self, row: &mut CategoryRow) {
        if let Some(name) = &self.name {
            row.name = name.clone();
        }
        if let Some(type_id) = self.type_id {
            row.type_id = Some(type_id);
            row.category_type = CategoryType::from_id(type_id).map(CategoryTypeRow::from);
        }
    }
}

/// Changes to a portfolio row. Month values that are `None` stay as stored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "PortfolioPatch")]
pub struct PortfolioUpdate {
    pub year: Option<i32>,
    pub category: Option<String>,
    pub values: [Option<f64>; 12],
}

impl PortfolioUpdate {
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Set the value for a 0-based month index; out-of-range indexes are ignored
    pub fn with_value(mut self, month_index: usize, value: f64) -> Self {
        if let Some(slot) = self.values.get_mut(month_index) {
            *slot = Some(value);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply(&self, entry: &mut PortfolioEntry) {
        if let Some(year) = self.year {
            entry.year = year;
        }
        if let Some(category) = &self.category {
            entry.category = category.clone();
        }
        for (slot, value) in entry.values.iter_mut().zip(self.values) {
            if value.is_some() {
                *slot = value;
            }
        }
    }
}

/// Mutable columns of `portfolio_tracker_monthly`
#[derive(Default, Deserialize)]
#[serde(default)]
struct PortfolioPatch {
    year: Option<i32>,
    category: Option<String>,
    jan_value: Option<f64>,
    feb_value: Option<f64>,
    mar_value: Option<f64>,
    apr_value: Option<f64>,
    may_value: Option<f64>,
    jun_value: Option<f64>,
    jul_value: Option<f64>,
    aug_value: Option<f64>,
    sep_value: Option<f64>,
    oct_value: Option<f64>,
    nov_value: Option<f64>,
    dec_value: Option<f64>,
}

impl From<PortfolioPatch> for PortfolioUpdate {
    fn from(patch: PortfolioPatch) -> Self {
        Self {
            year: patch.year,
            category: patch.category,
            values: [
                patch.jan_value,
                patch.feb_value,
                patch.mar_value,
                patch.apr_value,
                patch.may_value,
                patch.jun_value,
                patch.jul_value,
                patch.aug_value,
                patch.sep_value,
                patch.oct_value,
                patch.nov_value,
                patch.dec_value,
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored_row() -> TransactionRow {
        serde_json::from_value(serde_json::json!({
            "id": "tx-1",
            "user_id": "u1",
            "category_id": "c-rent",
            "amount": 800.0,
            "date": "2024-02-01",
            "is_recurring": true,
            "recurrence_frequency_id": 3,
            "recurrence_frequency": { "id": 3, "name": "monthly" }
        }))
        .unwrap()
    }

    #[test]
    fn test_transaction_update_from_full_row_keeps_identity() {
        let update: TransactionUpdate = serde_json::from_value(serde_json::json!({
            "id": "tx-other",
            "user_id": "intruder",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z",
            "category": { "id": "c-x", "name": "X" },
            "recurrence_frequency": { "id": 1, "name": "daily" },
            "amount": 825.0,
            "date": "2024-02-03"
        }))
        .unwrap();

        let mut row = stored_row();
        update.apply(&mut row);
        assert_eq!(row.id, "tx-1");
        assert_eq!(row.user_id, "u1");
        assert_eq!(row.amount, Some(825.0));
        assert_eq!(row.date, "2024-02-03");
        assert_eq!(row.recurrence_frequency_id, Some(3));
    }

    #[test]
    fn test_transaction_update_recurrence() {
        let mut row = stored_row();
        TransactionUpdate {
            recurrence_frequency_id: Some(4),
            ..Default::default()
        }
        .apply(&mut row);
        assert_eq!(row.recurrence_frequency.as_ref().and_then(|f| f.name.as_deref()), Some("yearly"));

        TransactionUpdate {
            is_recurring: Some(false),
            ..Default::default()
        }
        .apply(&mut row);
        assert!(!row.is_recurring);
        assert!(row.recurrence_frequency_id.is_none());
        assert!(row.recurrence_frequency.is_none());
    }

    #[test]
    fn test_category_update_rejoins_type() {
        let mut row: CategoryRow = serde_json::from_value(serde_json::json!({
            "id": "c1", "user_id": "u1", "name": "Gym", "type_id": 3,
            "type": { "id": 3, "name": "optional_expense" }
        }))
        .unwrap();
        let update: CategoryUpdate = serde_json::from_value(serde_json::json!({
            "id": "c9", "user_id": "u2", "type": { "name": "income" }, "type_id": 2
        }))
        .unwrap();

        update.apply(&mut row);
        assert_eq!(row.id, "c1");
        assert_eq!(row.user_id.as_deref(), Some("u1"));
        assert_eq!(row.name, "Gym");
        assert_eq!(
            row.category_type.and_then(|t| t.name).as_deref(),
            Some("necessary_expense")
        );
    }

    #[test]
    fn test_portfolio_update_strips_immutable_columns() {
        let update: PortfolioUpdate = serde_json::from_value(serde_json::json!({
            "id": "p-other",
            "user_id": "intruder",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-02T00:00:00Z",
            "mar_value": 120.0
        }))
        .unwrap();

        let mut entry = PortfolioEntry::new("p1", "u1", 2024, "Stocks").with_value(0, 100.0);
        update.apply(&mut entry);
        assert_eq!(entry.id, "p1");
        assert_eq!(entry.user_id, "u1");
        assert_eq!(entry.values[0], Some(100.0));
        assert_eq!(entry.values[2], Some(120.0));
    }

    #[test]
    fn test_empty_updates() {
        assert!(TransactionUpdate::default().is_empty());
        assert!(CategoryUpdate::default().is_empty());
        assert!(!PortfolioUpdate::default().with_value(1, 3.0).is_empty());
        assert!(PortfolioUpdate::default().with_value(12, 3.0).is_empty());
    }
}
