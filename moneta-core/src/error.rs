use thiserror::Error;

/// A store row carried a date that is not `YYYY-MM-DD`. Decoding aborts on
/// the first such row.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("transaction {transaction_id}: invalid date '{value}': {source}")]
pub struct ParseError {
    pub transaction_id: String,
    pub value: String,
    #[source]
    pub source: chrono::ParseError,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
    #[error("invalid year: {0} (expected {min}..={max})", min = crate::time::MIN_YEAR, max = crate::time::MAX_YEAR)]
    InvalidYear(i32),
    #[error("invalid budget start day: {0} (expected 1..=31)")]
    InvalidStartDay(u32),
    #[error("date arithmetic out of range")]
    OutOfRange,
}
