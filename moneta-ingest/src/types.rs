use std::path::Path;

use moneta_core::record::{CategoryRow, CategoryTypeRow, RecurrenceFrequencyRow};
use moneta_core::{PortfolioEntry, TransactionRow};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    /// Pick the format from the file extension (`.json` / `.csv`)
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(ExportFormat::Json),
            "csv" => Some(ExportFormat::Csv),
            _ => None,
        }
    }
}

/// Full JSON export: store rows with their relations joined in
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    #[serde(default)]
    pub categories: Vec<CategoryRow>,
    #[serde(default)]
    pub transactions: Vec<TransactionRow>,
    #[serde(default)]
    pub portfolio: Vec<PortfolioEntry>,
}

/// One line of a flat CSV export. Relations are denormalized into
/// `category` / `category_type` / `recurrence` name columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsvTransactionRecord {
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub category_type: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
    pub date: String,
    #[serde(default)]
    pub is_recurring: Option<bool>,
    #[serde(default)]
    pub recurrence: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub deleted_at: Option<String>,
}

impl From<CsvTransactionRecord> for TransactionRow {
    fn from(record: CsvTransactionRecord) -> Self {
        let category = match (&record.category, &record.category_type) {
            (None, None) => None,
            _ => Some(CategoryRow {
                id: record
                    .category_id
                    .clone()
                    .or_else(|| record.category.clone())
                    .unwrap_or_default(),
                user_id: None,
                name: record.category.clone().unwrap_or_default(),
                type_id: None,
                category_type: record.category_type.clone().map(|name| CategoryTypeRow {
                    id: None,
                    name: Some(name),
                }),
                deleted_at: None,
            }),
        };

        TransactionRow {
            id: record.id,
            user_id: record.user_id,
            category_id: record.category_id,
            amount: record.amount,
            date: record.date,
            is_recurring: record.is_recurring.unwrap_or(record.recurrence.is_some()),
            recurrence_frequency_id: None,
            description: record.description,
            deleted_at: record.deleted_at,
            category,
            recurrence_frequency: record.recurrence.map(|name| RecurrenceFrequencyRow {
                id: None,
                name: Some(name),
            }),
        }
    }
}
