//! File-backed stand-ins for the remote store.
//!
//! Each fetch re-reads the export, drops soft-deleted rows, then applies the
//! same user/window filters the store query does.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use moneta_core::{
    decode_rows, InMemorySource, PortfolioEntry, PortfolioSource, Transaction, TransactionSource,
};
use tracing::{debug, warn};

use crate::parsers::csv_export::parse_csv_export;
use crate::parsers::json_export::parse_json_export;
use crate::types::{ExportDocument, ExportFormat};

#[derive(Debug, Clone)]
pub struct JsonExportSource {
    path: PathBuf,
}

impl JsonExportSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> Result<InMemorySource> {
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("read {}", self.path.display()))?;
        let ExportDocument {
            transactions,
            portfolio,
            ..
        } = parse_json_export(&text).with_context(|| format!("parsing {}", self.path.display()))?;
        let transactions = decode_rows(transactions)
            .with_context(|| format!("decoding {}", self.path.display()))?;
        debug!(
            path = %self.path.display(),
            transactions = transactions.len(),
            portfolio = portfolio.len(),
            "loaded JSON export"
        );
        Ok(InMemorySource::new(transactions).with_portfolio(portfolio))
    }
}

impl TransactionSource for JsonExportSource {
    fn fetch_transactions(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Transaction>> {
        self.load()?.fetch_transactions(user_id, start, end)
    }
}

impl PortfolioSource for JsonExportSource {
    fn fetch_portfolio(&self, user_id: &str, year: i32) -> Result<Vec<PortfolioEntry>> {
        self.load()?.fetch_portfolio(user_id, year)
    }
}

/// CSV exports only carry transactions
#[derive(Debug, Clone)]
pub struct CsvExportSource {
    path: PathBuf,
}

impl CsvExportSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> Result<InMemorySource> {
        let file = File::open(&self.path).with_context(|| format!("opening {}", self.path.display()))?;
        let rows = parse_csv_export(file).with_context(|| format!("parsing {}", self.path.display()))?;
        let transactions =
            decode_rows(rows).with_context(|| format!("decoding {}", self.path.display()))?;
        debug!(path = %self.path.display(), transactions = transactions.len(), "loaded CSV export");
        Ok(InMemorySource::new(transactions))
    }
}

impl TransactionSource for CsvExportSource {
    fn fetch_transactions(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Transaction>> {
        self.load()?.fetch_transactions(user_id, start, end)
    }
}

impl PortfolioSource for CsvExportSource {
    fn fetch_portfolio(&self, _user_id: &str, _year: i32) -> Result<Vec<PortfolioEntry>> {
        warn!(path = %self.path.display(), "CSV exports carry no portfolio rows");
        Ok(Vec::new())
    }
}

/// Export file of either format, chosen by extension
#[derive(Debug, Clone)]
pub enum ExportSource {
    Json(JsonExportSource),
    Csv(CsvExportSource),
}

impl ExportSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            bail!("export not found: {}", path.display());
        }
        match ExportFormat::from_path(path) {
            Some(ExportFormat::Json) => Ok(ExportSource::Json(JsonExportSource::new(path))),
            Some(ExportFormat::Csv) => Ok(ExportSource::Csv(CsvExportSource::new(path))),
            None => bail!(
                "unsupported export format: {} (expected .json or .csv)",
                path.display()
            ),
        }
    }
}

impl TransactionSource for ExportSource {
    fn fetch_transactions(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Transaction>> {
        match self {
            ExportSource::Json(source) => source.fetch_transactions(user_id, start, end),
            ExportSource::Csv(source) => source.fetch_transactions(user_id, start, end),
        }
    }
}

impl PortfolioSource for ExportSource {
    fn fetch_portfolio(&self, user_id: &str, year: i32) -> Result<Vec<PortfolioEntry>> {
        match self {
            ExportSource::Json(source) => source.fetch_portfolio(user_id, year),
            ExportSource::Csv(source) => source.fetch_portfolio(user_id, year),
        }
    }
}
