//! Seams to whatever owns the data (remote store, export files, tests).

use anyhow::Result;
use chrono::NaiveDate;

use crate::finance::Transaction;
use crate::portfolio::PortfolioEntry;
use crate::time::is_date_in_range;

/// Supplies a user's transactions for an inclusive date window.
///
/// Implementations exclude soft-deleted rows and return the newest first.
pub trait TransactionSource {
    fn fetch_transactions(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Transaction>>;
}

/// Supplies a user's portfolio-tracker rows for one year, ordered by category.
pub trait PortfolioSource {
    fn fetch_portfolio(&self, user_id: &str, year: i32) -> Result<Vec<PortfolioEntry>>;
}

/// Snapshot held in memory; applies the same filters the store would.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    pub transactions: Vec<Transaction>,
    pub portfolio: Vec<PortfolioEntry>,
}

impl InMemorySource {
    pub fn new(transactions: Vec<Transaction>) -> Self {
        Self {
            transactions,
            portfolio: Vec::new(),
        }
    }

    pub fn with_portfolio(mut self, portfolio: Vec<PortfolioEntry>) -> Self {
        self.portfolio = portfolio;
        self
    }
}

impl TransactionSource for InMemorySource {
    fn fetch_transactions(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Transaction>> {
        let mut out: Vec<Transaction> = self
            .transactions
            .iter()
            .filter(|t| t.user_id == user_id && is_date_in_range(t.date, start, end))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(out)
    }
}

impl PortfolioSource for InMemorySource {
    fn fetch_portfolio(&self, user_id: &str, year: i32) -> Result<Vec<PortfolioEntry>> {
        let mut out: Vec<PortfolioEntry> = self
            .portfolio
            .iter()
            .filter(|e| e.user_id == user_id && e.year == year && !e.is_deleted())
            .cloned()
            .collect();
        out.sort_by(|a, b| a.category.cmp(&b.category));
        Ok(out)
    }
}
