//! Portfolio tracker: one row per (year, category) with a value per month.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::stats::CategoryAmount;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(from = "PortfolioRow", into = "PortfolioRow")]
pub struct PortfolioEntry {
    pub id: String,
    pub user_id: String,
    pub year: i32,
    pub category: String,
    /// January..December; `None` where nothing was recorded
    pub values: [Option<f64>; 12],
    pub deleted_at: Option<String>,
}

impl PortfolioEntry {
    pub fn new(
        id: impl Into<String>,
        user_id: impl Into<String>,
        year: i32,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            year,
            category: category.into(),
            values: [None; 12],
            deleted_at: None,
        }
    }

    /// Set the value for a 0-based month index; out-of-range indexes are ignored
    pub fn with_value(mut self, month_index: usize, value: f64) -> Self {
        if let Some(slot) = self.values.get_mut(month_index) {
            *slot = Some(value);
        }
        self
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Value for a 0-based month index, 0 when missing
    pub fn value(&self, month_index: usize) -> f64 {
        self.values.get(month_index).copied().flatten().unwrap_or(0.0)
    }

    /// Sum over all months, missing months count as 0
    pub fn total(&self) -> f64 {
        (0..12).map(|m| self.value(m)).sum()
    }
}

/// Total per category over the whole year, ordered by category name.
pub fn totals_by_category(entries: &[PortfolioEntry]) -> Vec<CategoryAmount> {
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for entry in entries.iter().filter(|e| !e.is_deleted()) {
        *totals.entry(entry.category.as_str()).or_insert(0.0) += entry.total();
    }
    totals
        .into_iter()
        .map(|(name, amount)| CategoryAmount {
            name: name.to_string(),
            amount,
        })
        .collect()
}

/// Per-month totals across all entries
pub fn monthly_totals(entries: &[PortfolioEntry]) -> [f64; 12] {
    std::array::from_fn(|month| {
        entries
            .iter()
            .filter(|e| !e.is_deleted())
            .map(|e| e.value(month))
            .sum()
    })
}

/// Store-side row layout (`portfolio_tracker_monthly`)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortfolioRow {
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    pub year: i32,
    pub category: String,
    #[serde(default)]
    pub jan_value: Option<f64>,
    #[serde(default)]
    pub feb_value: Option<f64>,
    #[serde(default)]
    pub mar_value: Option<f64>,
    #[serde(default)]
    pub apr_value: Option<f64>,
    #[serde(default)]
    pub may_value: Option<f64>,
    #[serde(default)]
    pub jun_value: Option<f64>,
    #[serde(default)]
    pub jul_value: Option<f64>,
    #[serde(default)]
    pub aug_value: Option<f64>,
    #[serde(default)]
    pub sep_value: Option<f64>,
    #[serde(default)]
    pub oct_value: Option<f64>,
    #[serde(default)]
    pub nov_value: Option<f64>,
    #[serde(default)]
    pub dec_value: Option<f64>,
    #[serde(default)]
    pub deleted_at: Option<String>,
}

impl From<PortfolioRow> for PortfolioEntry {
    fn from(row: PortfolioRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            year: row.year,
            category: row.category,
            values: [
                row.jan_value,
                row.feb_value,
                row.mar_value,
                row.apr_value,
                row.may_value,
                row.jun_value,
                row.jul_value,
                row.aug_value,
                row.sep_value,
                row.oct_value,
                row.nov_value,
                row.dec_value,
            ],
            deleted_at: row.deleted_at,
        }
    }
}

impl From<PortfolioEntry> for PortfolioRow {
    fn from(entry: PortfolioEntry) -> Self {
        let [jan, feb, mar, apr, may, jun, jul, aug, sep, oct, nov, dec] = entry.values;
        Self {
            id: entry.id,
            user_id: entry.user_id,
            year: entry.year,
            category: entry.category,
            jan_value: jan,
            feb_value: feb,
            mar_value: mar,
            apr_value: apr,
            may_value: may,
            jun_value: jun,
            jul_value: jul,
            aug_value: aug,
            sep_value: sep,
            oct_value: oct,
            nov_value: nov,
            dec_value: dec,
            deleted_at: entry.deleted_at,
        }
    }
}
