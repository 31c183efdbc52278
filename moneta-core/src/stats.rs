//! Statistics aggregation over a transaction snapshot.
//!
//! Everything here is a pure reduction: the caller fetches and filters the
//! transactions, these functions only group and sum. Sums are reduced in a
//! canonical order so the result does not depend on input order, and rounded
//! to cents once, at the end.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ParseError;
use crate::finance::{CategoryType, Transaction};
use crate::record::{decode_rows, TransactionRow};
use crate::time::{month_range, MonthLabel};

/// Breakdown label for expense rows without a category name
pub const UNCATEGORIZED: &str = "Uncategorized";

pub const INCOME_TYPES: [CategoryType; 1] = [CategoryType::Income];
pub const EXPENSE_TYPES: [CategoryType; 2] =
    [CategoryType::NecessaryExpense, CategoryType::OptionalExpense];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryAmount {
    pub name: String,
    pub amount: f64,
}

/// Aggregated view of a transaction set.
///
/// `monthly_income` and `monthly_expenses` are indexed like `month_labels`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub total_income: f64,
    pub total_expenses: f64,
    pub total_necessary: f64,
    pub total_optional: f64,
    pub total_short_investment: f64,
    pub total_long_investment: f64,
    /// Sorted by amount, descending
    pub expenses_by_category: Vec<CategoryAmount>,
    pub month_labels: Vec<MonthLabel>,
    pub monthly_income: Vec<f64>,
    pub monthly_expenses: Vec<f64>,
}

impl Statistics {
    /// All-zero statistics with empty series
    pub fn empty() -> Self {
        Self {
            total_income: 0.0,
            total_expenses: 0.0,
            total_necessary: 0.0,
            total_optional: 0.0,
            total_short_investment: 0.0,
            total_long_investment: 0.0,
            expenses_by_category: Vec::new(),
            month_labels: Vec::new(),
            monthly_income: Vec::new(),
            monthly_expenses: Vec::new(),
        }
    }

    /// Income minus expenses
    pub fn monthly_savings(&self) -> f64 {
        self.total_income - self.total_expenses
    }

    /// Share of expenses that were necessary, in percent. 0 without expenses.
    pub fn necessary_expense_percentage(&self) -> f64 {
        if self.total_expenses == 0.0 {
            return 0.0;
        }
        self.total_necessary / self.total_expenses * 100.0
    }

    /// Share of income left after expenses, in percent. 0 without income.
    pub fn savings_rate(&self) -> f64 {
        if self.total_income == 0.0 {
            return 0.0;
        }
        self.monthly_savings() / self.total_income * 100.0
    }

    /// Total for a single category type
    pub fn total_for(&self, kind: CategoryType) -> f64 {
        match kind {
            CategoryType::Income => self.total_income,
            CategoryType::NecessaryExpense => self.total_necessary,
            CategoryType::OptionalExpense => self.total_optional,
            CategoryType::ShortTermInvestment => self.total_short_investment,
            CategoryType::LongTermInvestment => self.total_long_investment,
        }
    }
}

impl Default for Statistics {
    fn default() -> Self {
        Self::empty()
    }
}

/// Round half away from zero to two decimals.
pub fn round_cents(value: f64) -> f64 {
    // `+ 0.0` turns a rounded -0.0 into 0.0
    (value * 100.0).round() / 100.0 + 0.0
}

/// Sum in ascending `total_cmp` order, so any permutation of the same values
/// produces the same bits.
fn canonical_sum(values: impl IntoIterator<Item = f64>) -> f64 {
    let mut values: Vec<f64> = values.into_iter().collect();
    values.sort_by(f64::total_cmp);
    values.into_iter().fold(0.0, |acc, v| acc + v)
}

fn total_of(transactions: &[Transaction], kinds: &[CategoryType]) -> f64 {
    round_cents(canonical_sum(
        transactions
            .iter()
            .filter(|t| t.is_of(kinds))
            .map(|t| t.amount),
    ))
}

/// Aggregate a transaction snapshot.
pub fn compute_statistics(transactions: &[Transaction]) -> Statistics {
    let month_labels = month_labels(transactions);
    let monthly_income = monthly_series(transactions, &month_labels, &INCOME_TYPES);
    let monthly_expenses = monthly_series(transactions, &month_labels, &EXPENSE_TYPES);

    let stats = Statistics {
        total_income: total_of(transactions, &INCOME_TYPES),
        total_expenses: total_of(transactions, &EXPENSE_TYPES),
        total_necessary: total_of(transactions, &[CategoryType::NecessaryExpense]),
        total_optional: total_of(transactions, &[CategoryType::OptionalExpense]),
        total_short_investment: total_of(transactions, &[CategoryType::ShortTermInvestment]),
        total_long_investment: total_of(transactions, &[CategoryType::LongTermInvestment]),
        expenses_by_category: expenses_by_category(transactions),
        month_labels,
        monthly_income,
        monthly_expenses,
    };

    debug!(
        transactions = transactions.len(),
        months = stats.month_labels.len(),
        categories = stats.expenses_by_category.len(),
        "computed statistics"
    );
    stats
}

/// Decode store rows and aggregate them; a malformed date aborts the whole
/// computation.
pub fn compute_statistics_from_rows(
    rows: impl IntoIterator<Item = TransactionRow>,
) -> Result<Statistics, ParseError> {
    let transactions = decode_rows(rows)?;
    Ok(compute_statistics(&transactions))
}

/// Expense totals per category name, largest first. Equal amounts keep the
/// order in which their category was first seen.
pub fn expenses_by_category(transactions: &[Transaction]) -> Vec<CategoryAmount> {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<f64>> = HashMap::new();

    for txn in transactions.iter().filter(|t| t.is_of(&EXPENSE_TYPES)) {
        let name = txn
            .category_name()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(UNCATEGORIZED);
        groups
            .entry(name)
            .or_insert_with(|| {
                order.push(name);
                Vec::new()
            })
            .push(txn.amount);
    }

    let mut breakdown: Vec<CategoryAmount> = order
        .into_iter()
        .map(|name| CategoryAmount {
            name: name.to_string(),
            amount: round_cents(canonical_sum(groups.remove(name).unwrap_or_default())),
        })
        .collect();

    // sort_by is stable
    breakdown.sort_by(|a, b| b.amount.total_cmp(&a.amount));
    breakdown
}

/// Every calendar month from the earliest to the latest transaction date.
pub fn month_labels(transactions: &[Transaction]) -> Vec<MonthLabel> {
    let first = transactions.iter().map(|t| t.date).min();
    let last = transactions.iter().map(|t| t.date).max();
    match (first, last) {
        (Some(first), Some(last)) => {
            month_range(MonthLabel::from_date(first), MonthLabel::from_date(last))
        }
        _ => Vec::new(),
    }
}

/// Per-month sums of transactions of `kinds`, one entry per label.
///
/// Months without matching transactions are 0. Transactions whose month is
/// not among `labels` are dropped.
pub fn monthly_series(
    transactions: &[Transaction],
    labels: &[MonthLabel],
    kinds: &[CategoryType],
) -> Vec<f64> {
    let index: HashMap<MonthLabel, usize> = labels
        .iter()
        .enumerate()
        .map(|(idx, label)| (*label, idx))
        .collect();

    let mut buckets: Vec<Vec<f64>> = vec![Vec::new(); labels.len()];
    let mut dropped = 0usize;
    for txn in transactions.iter().filter(|t| t.is_of(kinds)) {
        match index.get(&txn.month()) {
            Some(&idx) => buckets[idx].push(txn.amount),
            None => dropped += 1,
        }
    }
    if dropped > 0 {
        debug!(dropped, "transactions outside the month window were skipped");
    }

    buckets
        .into_iter()
        .map(|bucket| round_cents(canonical_sum(bucket)))
        .collect()
}
