//! Row shapes as the remote store returns them, and their decoding into
//! typed [`Transaction`]s.
//!
//! A transaction row is selected together with its relations:
//! `category:categories(id, name, type:category_types(id, name))` and
//! `recurrence_frequency:recurrence_frequencies(id, name)`.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ParseError;
use crate::finance::{Category, CategoryType, RecurrenceFrequency, Transaction};
use crate::time::{format_api_date, parse_iso_date};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryTypeRow {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
}

impl From<CategoryType> for CategoryTypeRow {
    fn from(kind: CategoryType) -> Self {
        Self {
            id: Some(kind.id()),
            name: Some(kind.name().to_string()),
        }
    }
}

/// A `categories` row. Ownership and soft-delete columns are only present on
/// rows of the categories table itself, not on the relation joined into a
/// transaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryRow {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub type_id: Option<i64>,
    #[serde(rename = "type", default)]
    pub category_type: Option<CategoryTypeRow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecurrenceFrequencyRow {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
}

impl From<RecurrenceFrequency> for RecurrenceFrequencyRow {
    fn from(freq: RecurrenceFrequency) -> Self {
        Self {
            id: Some(freq.id()),
            name: Some(freq.name().to_string()),
        }
    }
}

/// A `transactions` row with its relations joined in
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionRow {
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub category_id: Option<String>,
    /// Missing amounts count as zero
    #[serde(default)]
    pub amount: Option<f64>,
    pub date: String,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub recurrence_frequency_id: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub deleted_at: Option<String>,
    #[serde(default)]
    pub category: Option<CategoryRow>,
    #[serde(default)]
    pub recurrence_frequency: Option<RecurrenceFrequencyRow>,
}

impl TransactionRow {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

impl CategoryRow {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// The relation as joined into a transaction row
    pub fn joined(&self) -> CategoryRow {
        CategoryRow {
            user_id: None,
            deleted_at: None,
            ..self.clone()
        }
    }

    /// Resolve the type from the joined relation, falling back to `type_id`.
    fn resolve_type(&self) -> Option<CategoryType> {
        let joined = self.category_type.as_ref().and_then(|t| {
            t.name
                .as_deref()
                .and_then(CategoryType::from_name)
                .or_else(|| t.id.and_then(CategoryType::from_id))
        });
        let resolved = joined.or_else(|| self.type_id.and_then(CategoryType::from_id));
        if resolved.is_none() && (self.category_type.is_some() || self.type_id.is_some()) {
            warn!(category = %self.id, "unknown category type, treating as unresolved");
        }
        resolved
    }
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        let category_type = row.resolve_type();
        Category {
            id: row.id,
            name: row.name,
            category_type,
        }
    }
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = ParseError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        let date = parse_iso_date(&row.date).map_err(|source| ParseError {
            transaction_id: row.id.clone(),
            value: row.date.clone(),
            source,
        })?;

        let recurrence_frequency = row
            .recurrence_frequency
            .as_ref()
            .and_then(|f| f.name.as_deref())
            .and_then(RecurrenceFrequency::from_name)
            .or_else(|| row.recurrence_frequency_id.and_then(RecurrenceFrequency::from_id));

        Ok(Transaction {
            id: row.id,
            user_id: row.user_id,
            category_id: row.category_id,
            amount: row.amount.unwrap_or(0.0),
            date,
            is_recurring: row.is_recurring,
            recurrence_frequency,
            description: row.description,
            category: row.category.map(Category::from),
        })
    }
}

impl From<&Transaction> for TransactionRow {
    fn from(txn: &Transaction) -> Self {
        TransactionRow {
            id: txn.id.clone(),
            user_id: txn.user_id.clone(),
            category_id: txn.category_id.clone(),
            amount: Some(txn.amount),
            date: format_api_date(txn.date),
            is_recurring: txn.is_recurring,
            recurrence_frequency_id: txn.recurrence_frequency.map(|f| f.id()),
            description: txn.description.clone(),
            deleted_at: None,
            category: txn.category.as_ref().map(|c| CategoryRow {
                id: c.id.clone(),
                user_id: None,
                name: c.name.clone(),
                type_id: c.category_type.map(|t| t.id()),
                category_type: c.category_type.map(CategoryTypeRow::from),
                deleted_at: None,
            }),
            recurrence_frequency: txn.recurrence_frequency.map(RecurrenceFrequencyRow::from),
        }
    }
}

/// Decode store rows, dropping soft-deleted ones.
///
/// Fails on the first row whose date does not parse.
pub fn decode_rows(rows: impl IntoIterator<Item = TransactionRow>) -> Result<Vec<Transaction>, ParseError> {
    let mut out = Vec::new();
    let mut deleted = 0usize;
    for row in rows {
        if row.is_deleted() {
            deleted += 1;
            continue;
        }
        out.push(Transaction::try_from(row)?);
    }
    if deleted > 0 {
        debug!(deleted, "skipped soft-deleted transaction rows");
    }
    Ok(out)
}
