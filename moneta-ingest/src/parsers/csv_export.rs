//! Flat CSV exports of the `transactions` table.
//!
//! Header row:
//! id,user_id,category_id,category,category_type,amount,date,is_recurring,
//! recurrence,description,deleted_at
//!
//! Only `id` and `date` are required; missing columns read as empty.

use std::io::Read;

use anyhow::{Context, Result};
use moneta_core::TransactionRow;

use crate::types::CsvTransactionRecord;

pub fn parse_csv_export<R: Read>(reader: R) -> Result<Vec<TransactionRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (line, result) in rdr.deserialize::<CsvTransactionRecord>().enumerate() {
        // header is line 1
        let record = result.with_context(|| format!("CSV record on line {}", line + 2))?;
        rows.push(TransactionRow::from(record));
    }
    Ok(rows)
}
