//! Calendar-year breakdown into twelve fixed month buckets.

use anyhow::Result;
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::finance::Transaction;
use crate::source::TransactionSource;
use crate::stats::{compute_statistics, Statistics};
use crate::time::{year_window, MonthLabel};

/// Stable per-month keys, January first
pub const MONTH_KEYS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyStatistics {
    pub label: MonthLabel,
    pub key: String,
    pub transactions: Vec<Transaction>,
    pub statistics: Statistics,
}

impl MonthlyStatistics {
    pub fn monthly_savings(&self) -> f64 {
        self.statistics.monthly_savings()
    }

    pub fn necessary_expense_percentage(&self) -> f64 {
        self.statistics.necessary_expense_percentage()
    }

    pub fn savings_rate(&self) -> f64 {
        self.statistics.savings_rate()
    }
}

/// Changes from month `a` to month `b`; percentages are relative to `a`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthComparison {
    pub income_change: f64,
    pub expenses_change: f64,
    pub savings_change: f64,
    pub income_change_percentage: f64,
    pub expenses_change_percentage: f64,
    pub savings_change_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyBreakdown {
    pub year: i32,
    /// Always exactly 12 buckets, January at index 0
    pub months: Vec<MonthlyStatistics>,
    /// Statistics over the transactions that fall inside `year`
    pub yearly_statistics: Statistics,
    /// Everything that was passed in, including out-of-year boundary rows
    pub all_transactions: Vec<Transaction>,
}

impl YearlyBreakdown {
    pub fn month(&self, index: usize) -> Option<&MonthlyStatistics> {
        self.months.get(index)
    }

    /// Compare two month buckets by 0-based index.
    ///
    /// Returns `None` when either index is outside 0..=11.
    pub fn compare_months(&self, a: usize, b: usize) -> Option<MonthComparison> {
        let first = self.month(a)?;
        let second = self.month(b)?;

        let base_income = first.statistics.total_income;
        let base_expenses = first.statistics.total_expenses;
        let base_savings = first.monthly_savings();

        let income_change = second.statistics.total_income - base_income;
        let expenses_change = second.statistics.total_expenses - base_expenses;
        let savings_change = second.monthly_savings() - base_savings;

        Some(MonthComparison {
            income_change,
            expenses_change,
            savings_change,
            income_change_percentage: change_percentage(income_change, base_income),
            expenses_change_percentage: change_percentage(expenses_change, base_expenses),
            savings_change_percentage: change_percentage(savings_change, base_savings),
        })
    }
}

fn change_percentage(change: f64, base: f64) -> f64 {
    if base == 0.0 {
        0.0
    } else {
        change / base * 100.0
    }
}

/// Split a year's transactions into January..December buckets.
///
/// Transactions dated outside `year` (the fetch window may include boundary
/// days) are kept in `all_transactions` but feed neither the buckets nor
/// `yearly_statistics`.
pub fn compute_yearly_breakdown(transactions: &[Transaction], year: i32) -> YearlyBreakdown {
    let mut buckets: [Vec<Transaction>; 12] = Default::default();
    let mut in_year = Vec::with_capacity(transactions.len());

    for txn in transactions {
        if txn.date.year() != year {
            continue;
        }
        buckets[txn.date.month0() as usize].push(txn.clone());
        in_year.push(txn.clone());
    }

    let skipped = transactions.len() - in_year.len();
    if skipped > 0 {
        debug!(year, skipped, "transactions outside the target year kept out of buckets");
    }

    let months = MonthLabel::months_of_year(year)
        .into_iter()
        .zip(buckets)
        .map(|(label, transactions)| {
            let statistics = if transactions.is_empty() {
                Statistics::empty()
            } else {
                compute_statistics(&transactions)
            };
            MonthlyStatistics {
                label,
                key: MONTH_KEYS[label.month_index()].to_string(),
                transactions,
                statistics,
            }
        })
        .collect();

    let yearly_statistics = if in_year.is_empty() {
        Statistics::empty()
    } else {
        compute_statistics(&in_year)
    };

    YearlyBreakdown {
        year,
        months,
        yearly_statistics,
        all_transactions: transactions.to_vec(),
    }
}

/// Holds the year currently on display.
#[derive(Debug, Clone, Default)]
pub struct StatisticsStore {
    yearly: Option<YearlyBreakdown>,
    current_year: Option<i32>,
}

impl StatisticsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn yearly(&self) -> Option<&YearlyBreakdown> {
        self.yearly.as_ref()
    }

    pub fn current_year(&self) -> Option<i32> {
        self.current_year
    }

    /// Fetch and break down `year`, replacing what was loaded before.
    ///
    /// On error the previously loaded year stays in place.
    pub fn load_year<S>(
        &mut self,
        source: &S,
        user_id: &str,
        year: i32,
        delay_days: i64,
    ) -> Result<&YearlyBreakdown>
    where
        S: TransactionSource + ?Sized,
    {
        let breakdown = Self::export_year(source, user_id, year, delay_days)?;
        self.current_year = Some(year);
        let loaded: &YearlyBreakdown = self.yearly.insert(breakdown);
        Ok(loaded)
    }

    /// Same as [`load_year`](Self::load_year) without touching the store.
    pub fn export_year<S>(
        source: &S,
        user_id: &str,
        year: i32,
        delay_days: i64,
    ) -> Result<YearlyBreakdown>
    where
        S: TransactionSource + ?Sized,
    {
        let (start, end) = year_window(year, delay_days)?;
        let transactions = source
            .fetch_transactions(user_id, start, end)
            .inspect_err(|e| warn!(year, error = %e, "fetching year statistics failed"))?;
        info!(year, count = transactions.len(), "loaded transactions for year");
        Ok(compute_yearly_breakdown(&transactions, year))
    }

    /// `None` until a year is loaded or when an index is outside 0..=11
    pub fn compare_months(&self, a: usize, b: usize) -> Option<MonthComparison> {
        self.yearly.as_ref()?.compare_months(a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finance::{Category, CategoryType};
    use crate::source::InMemorySource;
    use chrono::NaiveDate;

    fn txn(id: &str, date: &str, amount: f64, kind: CategoryType) -> Transaction {
        Transaction::new(id, date.parse::<NaiveDate>().unwrap(), amount)
            .with_user("u1")
            .with_category(Category::new(format!("cat-{}", kind.name()), kind.name(), kind))
    }

    fn sample() -> Vec<Transaction> {
        vec![
            txn("1", "2024-01-10", 2000.0, CategoryType::Income),
            txn("2", "2024-01-12", 800.0, CategoryType::NecessaryExpense),
            txn("3", "2024-01-20", 200.0, CategoryType::OptionalExpense),
            txn("4", "2024-02-10", 2500.0, CategoryType::Income),
            txn("5", "2024-02-11", 900.0, CategoryType::NecessaryExpense),
            txn("6", "2024-02-12", 100.0, CategoryType::OptionalExpense),
            txn("7", "2023-12-31", 50.0, CategoryType::OptionalExpense),
        ]
    }

    #[test]
    fn test_always_twelve_buckets() {
        let breakdown = compute_yearly_breakdown(&[], 2024);
        assert_eq!(breakdown.months.len(), 12);
        assert!(breakdown.months.iter().all(|m| m.statistics == Statistics::empty()));
        assert_eq!(breakdown.months[0].key, "january");
        assert_eq!(breakdown.months[11].label.to_string(), "Dec 2024");
        assert_eq!(breakdown.yearly_statistics, Statistics::empty());
    }

    #[test]
    fn test_out_of_year_rows_kept_only_in_all_transactions() {
        let txns = sample();
        let breakdown = compute_yearly_breakdown(&txns, 2024);

        assert_eq!(breakdown.all_transactions.len(), 7);
        let bucketed: usize = breakdown.months.iter().map(|m| m.transactions.len()).sum();
        assert_eq!(bucketed, 6);
        assert_eq!(breakdown.yearly_statistics.total_optional, 300.0);
        assert_eq!(breakdown.months[0].statistics.total_income, 2000.0);
        assert_eq!(breakdown.months[1].statistics.total_expenses, 1000.0);
        assert_eq!(breakdown.months[5].statistics, Statistics::empty());
    }

    #[test]
    fn test_monthly_helpers() {
        let breakdown = compute_yearly_breakdown(&sample(), 2024);
        let jan = &breakdown.months[0];
        assert_eq!(jan.monthly_savings(), 1000.0);
        assert_eq!(jan.savings_rate(), 50.0);
        assert_eq!(jan.necessary_expense_percentage(), 80.0);
    }

    #[test]
    fn test_compare_months() {
        let breakdown = compute_yearly_breakdown(&sample(), 2024);
        let cmp = breakdown.compare_months(0, 1).unwrap();

        assert_eq!(cmp.income_change, 500.0);
        assert_eq!(cmp.expenses_change, 0.0);
        assert_eq!(cmp.savings_change, 500.0);
        assert_eq!(cmp.income_change_percentage, 25.0);
        assert_eq!(cmp.expenses_change_percentage, 0.0);
        assert_eq!(cmp.savings_change_percentage, 50.0);
    }

    #[test]
    fn test_compare_months_zero_base_and_range() {
        let breakdown = compute_yearly_breakdown(&sample(), 2024);
        let cmp = breakdown.compare_months(5, 0).unwrap();
        assert_eq!(cmp.income_change, 2000.0);
        assert_eq!(cmp.income_change_percentage, 0.0);
        assert_eq!(cmp.savings_change_percentage, 0.0);

        assert!(breakdown.compare_months(0, 12).is_none());
        assert!(breakdown.compare_months(12, 0).is_none());
    }

    #[test]
    fn test_store_compare_before_load_is_none() {
        let store = StatisticsStore::new();
        assert!(store.compare_months(0, 1).is_none());
        assert!(store.current_year().is_none());
    }

    #[test]
    fn test_store_load_year_uses_window() {
        let source = InMemorySource::new(sample());
        let mut store = StatisticsStore::new();

        let loaded = store.load_year(&source, "u1", 2024, 0).unwrap();
        assert_eq!(loaded.year, 2024);
        // the 2023-12-31 row is outside the fetch window
        assert_eq!(loaded.all_transactions.len(), 6);
        assert_eq!(store.current_year(), Some(2024));
        assert!(store.compare_months(0, 1).is_some());

        let delayed = StatisticsStore::export_year(&source, "u1", 2024, 12).unwrap();
        assert_eq!(delayed.months[0].transactions.len(), 1);
    }

    #[test]
    fn test_store_keeps_previous_year_on_error() {
        let source = InMemorySource::new(sample());
        let mut store = StatisticsStore::new();
        store.load_year(&source, "u1", 2024, 0).unwrap();

        assert!(store.load_year(&source, "u1", 1800, 0).is_err());
        assert_eq!(store.current_year(), Some(2024));
        assert_eq!(store.yearly().map(|y| y.year), Some(2024));
    }
}
