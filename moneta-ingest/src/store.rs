//! Writable JSON export, standing in for the remote store's tables.
//!
//! Rows are never removed: deletes stamp `deleted_at`, and every read or
//! write skips stamped rows. Rows are scoped to their owner, so a user can
//! neither see nor change another user's rows.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use moneta_core::{
    Category, CategoryRow, CategoryType, CategoryTypeRow, CategoryUpdate, NewTransaction,
    PortfolioEntry, PortfolioUpdate, RecurrenceFrequency, Transaction, TransactionRow,
    TransactionUpdate,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::parsers::json_export::parse_json_export;
use crate::types::{ExportDocument, ExportFormat};

const TMP_SUFFIX: &str = "tmp";

#[derive(Debug, Clone)]
pub struct ExportStore {
    path: PathBuf,
    doc: ExportDocument,
}

impl ExportStore {
    /// Open a JSON export for editing. A missing file starts out empty and is
    /// created on [`save`](Self::save).
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if ExportFormat::from_path(path) != Some(ExportFormat::Json) {
            bail!("only JSON exports can be edited: {}", path.display());
        }
        let doc = if path.exists() {
            let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
            parse_json_export(&text).with_context(|| format!("parsing {}", path.display()))?
        } else {
            info!(path = %path.display(), "starting a new export");
            ExportDocument::default()
        };
        Ok(Self {
            path: path.to_path_buf(),
            doc,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &ExportDocument {
        &self.doc
    }

    /// Write through a temporary file so a failed write keeps the old export.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        let text = serde_json::to_string_pretty(&self.doc).context("serialize export")?;
        let tmp = tmp_path(&self.path);
        let mut file = File::create(&tmp).with_context(|| format!("create {}", tmp.display()))?;
        file.write_all(text.as_bytes())
            .and_then(|_| file.flush())
            .with_context(|| format!("write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replace {}", self.path.display()))?;
        debug!(path = %self.path.display(), "saved export");
        Ok(())
    }

    /// Rows of `category_types`
    pub fn category_types() -> Vec<CategoryTypeRow> {
        CategoryType::ALL.into_iter().map(CategoryTypeRow::from).collect()
    }

    /// The user's live categories, in insertion order
    pub fn categories(&self, user_id: &str) -> Vec<Category> {
        self.doc
            .categories
            .iter()
            .filter(|c| owned_by(c, user_id) && !c.is_deleted())
            .map(|c| Category::from(c.clone()))
            .collect()
    }

    pub fn add_category(&mut self, user_id: &str, name: &str, kind: CategoryType) -> Result<Category> {
        let name = name.trim();
        if name.is_empty() {
            bail!("category name must not be empty");
        }
        let row = CategoryRow {
            id: Uuid::new_v4().to_string(),
            user_id: Some(user_id.to_string()),
            name: name.to_string(),
            type_id: Some(kind.id()),
            category_type: Some(CategoryTypeRow::from(kind)),
            deleted_at: None,
        };
        info!(id = %row.id, name, kind = kind.name(), "added category");
        self.doc.categories.push(row.clone());
        Ok(Category::from(row))
    }

    /// Renames or retypes a category; transactions joined to it follow.
    pub fn update_category(&mut self, user_id: &str, id: &str, update: &CategoryUpdate) -> Result<Category> {
        if update.is_empty() {
            bail!("nothing to update for category {id}");
        }
        if let Some(type_id) = update.type_id {
            if CategoryType::from_id(type_id).is_none() {
                bail!("unknown category type id {type_id}");
            }
        }
        if update.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            bail!("category name must not be empty");
        }

        let row = self
            .doc
            .categories
            .iter_mut()
            .find(|c| c.id == id && owned_by(c, user_id) && !c.is_deleted())
            .with_context(|| format!("category {id} not found"))?;
        update.apply(row);
        let updated = row.clone();

        self.rejoin_categories();
        info!(id, "updated category");
        Ok(Category::from(updated))
    }

    pub fn delete_category(&mut self, user_id: &str, id: &str, at: DateTime<Utc>) -> Result<()> {
        let row = self
            .doc
            .categories
            .iter_mut()
            .find(|c| c.id == id && owned_by(c, user_id) && !c.is_deleted())
            .with_context(|| format!("category {id} not found"))?;
        row.deleted_at = Some(timestamp(at));
        info!(id, "deleted category");
        Ok(())
    }

    pub fn add_transaction(&mut self, user_id: &str, new: NewTransaction) -> Result<TransactionRow> {
        let category = self.live_category(user_id, &new.category_id)?;

        let mut txn = Transaction::new(Uuid::new_v4().to_string(), new.date, new.amount)
            .with_user(user_id)
            .with_category(category);
        if let Some(description) = new.description {
            txn = txn.with_description(description);
        }
        if let Some(frequency) = new.recurrence_frequency {
            txn = txn.with_recurrence(frequency);
        }

        let row = TransactionRow::from(&txn);
        info!(id = %row.id, amount = new.amount, date = %row.date, "added transaction");
        self.doc.transactions.push(row);
        self.rejoin_categories();
        self.transaction(user_id, &txn.id)
    }

    pub fn update_transaction(
        &mut self,
        user_id: &str,
        id: &str,
        update: &TransactionUpdate,
    ) -> Result<TransactionRow> {
        if update.is_empty() {
            bail!("nothing to update for transaction {id}");
        }
        if let Some(category_id) = &update.category_id {
            self.live_category(user_id, category_id)?;
        }
        if let Some(freq_id) = update.recurrence_frequency_id {
            if RecurrenceFrequency::from_id(freq_id).is_none() {
                bail!("unknown recurrence frequency id {freq_id}");
            }
        }

        let row = self
            .doc
            .transactions
            .iter_mut()
            .find(|t| t.id == id && t.user_id == user_id && !t.is_deleted())
            .with_context(|| format!("transaction {id} not found"))?;
        update.apply(row);

        self.rejoin_categories();
        info!(id, "updated transaction");
        self.transaction(user_id, id)
    }

    pub fn delete_transaction(&mut self, user_id: &str, id: &str, at: DateTime<Utc>) -> Result<()> {
        let row = self
            .doc
            .transactions
            .iter_mut()
            .find(|t| t.id == id && t.user_id == user_id && !t.is_deleted())
            .with_context(|| format!("transaction {id} not found"))?;
        row.deleted_at = Some(timestamp(at));
        info!(id, "deleted transaction");
        Ok(())
    }

    pub fn add_portfolio_entry(
        &mut self,
        user_id: &str,
        year: i32,
        category: &str,
        values: [Option<f64>; 12],
    ) -> Result<PortfolioEntry> {
        let category = category.trim();
        if category.is_empty() {
            bail!("portfolio category must not be empty");
        }
        let mut entry = PortfolioEntry::new(Uuid::new_v4().to_string(), user_id, year, category);
        entry.values = values;
        info!(id = %entry.id, year, category, "added portfolio entry");
        self.doc.portfolio.push(entry.clone());
        Ok(entry)
    }

    pub fn update_portfolio_entry(
        &mut self,
        user_id: &str,
        id: &str,
        update: &PortfolioUpdate,
    ) -> Result<PortfolioEntry> {
        if update.is_empty() {
            bail!("nothing to update for portfolio entry {id}");
        }
        if update.category.as_deref().is_some_and(|c| c.trim().is_empty()) {
            bail!("portfolio category must not be empty");
        }
        let entry = self
            .doc
            .portfolio
            .iter_mut()
            .find(|e| e.id == id && e.user_id == user_id && !e.is_deleted())
            .with_context(|| format!("portfolio entry {id} not found"))?;
        update.apply(entry);
        info!(id, "updated portfolio entry");
        Ok(entry.clone())
    }

    pub fn delete_portfolio_entry(&mut self, user_id: &str, id: &str, at: DateTime<Utc>) -> Result<()> {
        let entry = self
            .doc
            .portfolio
            .iter_mut()
            .find(|e| e.id == id && e.user_id == user_id && !e.is_deleted())
            .with_context(|| format!("portfolio entry {id} not found"))?;
        entry.deleted_at = Some(timestamp(at));
        info!(id, "deleted portfolio entry");
        Ok(())
    }

    fn transaction(&self, user_id: &str, id: &str) -> Result<TransactionRow> {
        self.doc
            .transactions
            .iter()
            .find(|t| t.id == id && t.user_id == user_id)
            .cloned()
            .with_context(|| format!("transaction {id} not found"))
    }

    fn live_category(&self, user_id: &str, id: &str) -> Result<Category> {
        self.doc
            .categories
            .iter()
            .find(|c| c.id == id && owned_by(c, user_id) && !c.is_deleted())
            .map(|c| Category::from(c.clone()))
            .with_context(|| format!("category {id} not found"))
    }

    /// Refresh the category relation joined into each transaction row.
    fn rejoin_categories(&mut self) {
        let categories = &self.doc.categories;
        for row in &mut self.doc.transactions {
            let Some(category_id) = row.category_id.as_deref() else {
                continue;
            };
            if let Some(category) = categories.iter().find(|c| c.id == category_id) {
                row.category = Some(category.joined());
            }
        }
    }
}

fn owned_by(category: &CategoryRow, user_id: &str) -> bool {
    category.user_id.as_deref() == Some(user_id)
}

/// Same shape as the store's `timestamptz` text (`2024-03-01T08:00:00.000Z`)
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{existing}.{TMP_SUFFIX}"),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_timestamp_format() {
        assert_eq!(timestamp(at()), "2024-03-05T10:00:00.000Z");
    }

    #[test]
    fn test_tmp_path_keeps_extension() {
        assert_eq!(tmp_path(Path::new("/x/export.json")), PathBuf::from("/x/export.json.tmp"));
    }

    #[test]
    fn test_category_types_are_numbered() {
        let types = ExportStore::category_types();
        assert_eq!(types.len(), 5);
        assert_eq!(types[0].id, Some(1));
        assert_eq!(types[4].name.as_deref(), Some("long_term_investment"));
    }

    #[test]
    fn test_open_rejects_csv() {
        assert!(ExportStore::open("export.csv").is_err());
    }

    #[test]
    fn test_rename_follows_into_transactions() {
        let mut store = ExportStore {
            path: PathBuf::from("unused.json"),
            doc: ExportDocument::default(),
        };
        let rent = store.add_category("u1", "Rent", CategoryType::NecessaryExpense).unwrap();
        let row = store
            .add_transaction(
                "u1",
                NewTransaction {
                    category_id: rent.id.clone(),
                    amount: 800.0,
                    date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
                    description: None,
                    recurrence_frequency: None,
                },
            )
            .unwrap();
        assert_eq!(row.category.as_ref().map(|c| c.name.as_str()), Some("Rent"));
        assert!(row.category.as_ref().is_some_and(|c| c.user_id.is_none()));

        store
            .update_category(
                "u1",
                &rent.id,
                &CategoryUpdate {
                    name: Some("Housing".into()),
                    type_id: None,
                },
            )
            .unwrap();
        let joined = store.document().transactions[0].category.clone().unwrap();
        assert_eq!(joined.name, "Housing");
        assert_eq!(joined.category_type.and_then(|t| t.name).as_deref(), Some("necessary_expense"));
    }
}
