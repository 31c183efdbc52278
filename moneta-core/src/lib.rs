//! moneta-core: finance domain types and the statistics computed over them

pub mod edit;
pub mod error;
pub mod finance;
pub mod portfolio;
pub mod record;
pub mod source;
pub mod stats;
pub mod time;
pub mod yearly;

pub use edit::{CategoryUpdate, NewTransaction, PortfolioUpdate, TransactionUpdate};
pub use error::{DateError, ParseError};
pub use finance::{Category, CategoryType, RecurrenceFrequency, Transaction};
pub use portfolio::{monthly_totals, totals_by_category, PortfolioEntry, PortfolioRow};
pub use record::{decode_rows, CategoryRow, CategoryTypeRow, TransactionRow};
pub use source::{InMemorySource, PortfolioSource, TransactionSource};
pub use stats::{
    compute_statistics, compute_statistics_from_rows, expenses_by_category, month_labels,
    monthly_series, round_cents, CategoryAmount, Statistics, UNCATEGORIZED,
};
pub use time::{budget_period, format_api_date, month_range, parse_iso_date, year_window, MonthLabel};
pub use yearly::{
    compute_yearly_breakdown, MonthComparison, MonthlyStatistics, StatisticsStore, YearlyBreakdown,
    MONTH_KEYS,
};
