//! Commands that write to a JSON export.

use anyhow::Result;
use chrono::{Local, NaiveDate, Utc};
use clap::Subcommand;
use moneta_core::{
    parse_iso_date, CategoryType, CategoryUpdate, NewTransaction, PortfolioUpdate,
    RecurrenceFrequency, TransactionRow, TransactionUpdate, MONTH_KEYS,
};
use moneta_ingest::ExportStore;

use crate::print_json;

#[derive(Subcommand, Debug)]
pub enum TxCommand {
    /// Record a transaction
    Add {
        #[arg(long)]
        category: String,

        #[arg(long, allow_negative_numbers = true)]
        amount: f64,

        /// YYYY-MM-DD (default: today)
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,

        #[arg(long)]
        description: Option<String>,

        /// daily, weekly, monthly or yearly
        #[arg(long, value_parser = parse_frequency)]
        recurrence: Option<RecurrenceFrequency>,
    },

    /// Change columns of a transaction
    Update {
        id: String,

        #[arg(long)]
        category: Option<String>,

        #[arg(long, allow_negative_numbers = true)]
        amount: Option<f64>,

        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long, value_parser = parse_frequency, conflicts_with = "not_recurring")]
        recurrence: Option<RecurrenceFrequency>,

        /// Clear the recurrence
        #[arg(long)]
        not_recurring: bool,
    },

    /// Mark a transaction deleted
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
pub enum CategoryCommand {
    /// The user's categories
    List {
        #[arg(long)]
        json: bool,
    },

    /// The fixed category types
    Types {
        #[arg(long)]
        json: bool,
    },

    Add {
        name: String,

        /// income, necessary_expense, optional_expense,
        /// short_term_investment or long_term_investment
        #[arg(long = "type", value_parser = parse_category_type)]
        kind: CategoryType,
    },

    Update {
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long = "type", value_parser = parse_category_type)]
        kind: Option<CategoryType>,
    },

    /// Mark a category deleted
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
pub enum PortfolioEntryCommand {
    Add {
        year: i32,
        category: String,

        /// MONTH=AMOUNT, month as 1-12 or a name (`mar=1200`); repeatable
        #[arg(long = "value", value_parser = parse_month_value)]
        values: Vec<(usize, f64)>,
    },

    Update {
        id: String,

        #[arg(long)]
        year: Option<i32>,

        #[arg(long)]
        category: Option<String>,

        #[arg(long = "value", value_parser = parse_month_value)]
        values: Vec<(usize, f64)>,
    },

    /// Mark a portfolio entry deleted
    Delete { id: String },
}

pub fn run_tx(store: &mut ExportStore, user_id: &str, command: TxCommand) -> Result<()> {
    match command {
        TxCommand::Add { category, amount, date, description, recurrence } => {
            let new = NewTransaction {
                category_id: category,
                amount,
                date: date.unwrap_or_else(|| Local::now().date_naive()),
                description,
                recurrence_frequency: recurrence,
            };
            let row = store.add_transaction(user_id, new)?;
            store.save()?;
            print_transaction("Added", &row);
        }
        TxCommand::Update { id, category, amount, date, description, recurrence, not_recurring } => {
            let update = TransactionUpdate {
                category_id: category,
                amount,
                date,
                description,
                is_recurring: not_recurring.then_some(false),
                recurrence_frequency_id: recurrence.map(|f| f.id()),
            };
            let row = store.update_transaction(user_id, &id, &update)?;
            store.save()?;
            print_transaction("Updated", &row);
        }
        TxCommand::Delete { id } => {
            store.delete_transaction(user_id, &id, Utc::now())?;
            store.save()?;
            println!("Deleted transaction {id}");
        }
    }
    Ok(())
}

pub fn run_category(store: &mut ExportStore, user_id: &str, command: CategoryCommand) -> Result<()> {
    match command {
        CategoryCommand::List { json } => {
            let categories = store.categories(user_id);
            if json {
                print_json(&categories)?;
            } else if categories.is_empty() {
                println!("(no categories)");
            } else {
                for c in &categories {
                    let kind = c.category_type.map_or("?", |k| k.name());
                    println!("{}  {kind:<22} {}", c.id, c.name);
                }
            }
        }
        CategoryCommand::Types { json } => print_category_types(json)?,
        CategoryCommand::Add { name, kind } => {
            let category = store.add_category(user_id, &name, kind)?;
            store.save()?;
            println!("Added category {} ({})", category.id, category.name);
        }
        CategoryCommand::Update { id, name, kind } => {
            let update = CategoryUpdate {
                name,
                type_id: kind.map(|k| k.id()),
            };
            let category = store.update_category(user_id, &id, &update)?;
            store.save()?;
            println!("Updated category {} ({})", category.id, category.name);
        }
        CategoryCommand::Delete { id } => {
            store.delete_category(user_id, &id, Utc::now())?;
            store.save()?;
            println!("Deleted category {id}");
        }
    }
    Ok(())
}

/// Needs no export, the types are fixed
pub fn print_category_types(json: bool) -> Result<()> {
    let types = ExportStore::category_types();
    if json {
        return print_json(&types);
    }
    for t in &types {
        println!("{}  {}", t.id.unwrap_or_default(), t.name.as_deref().unwrap_or_default());
    }
    Ok(())
}

pub fn run_portfolio_entry(
    store: &mut ExportStore,
    user_id: &str,
    command: PortfolioEntryCommand,
) -> Result<()> {
    match command {
        PortfolioEntryCommand::Add { year, category, values } => {
            let mut months = [None; 12];
            for (idx, value) in values {
                if let Some(slot) = months.get_mut(idx) {
                    *slot = Some(value);
                }
            }
            let entry = store.add_portfolio_entry(user_id, year, &category, months)?;
            store.save()?;
            println!("Added portfolio entry {} ({} {})", entry.id, entry.category, entry.year);
        }
        PortfolioEntryCommand::Update { id, year, category, values } => {
            let mut update = PortfolioUpdate {
                year,
                ..Default::default()
            };
            if let Some(category) = category {
                update = update.with_category(category);
            }
            for (idx, value) in values {
                update = update.with_value(idx, value);
            }
            let entry = store.update_portfolio_entry(user_id, &id, &update)?;
            store.save()?;
            println!("Updated portfolio entry {} ({} {})", entry.id, entry.category, entry.year);
        }
        PortfolioEntryCommand::Delete { id } => {
            store.delete_portfolio_entry(user_id, &id, Utc::now())?;
            store.save()?;
            println!("Deleted portfolio entry {id}");
        }
    }
    Ok(())
}

fn print_transaction(verb: &str, row: &TransactionRow) {
    let category = row.category.as_ref().map_or("-", |c| c.name.as_str());
    println!(
        "{verb} transaction {}: {} {:.2} [{category}]",
        row.id,
        row.date,
        row.amount.unwrap_or_default()
    );
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    parse_iso_date(s).map_err(|_| format!("expected YYYY-MM-DD, got '{s}'"))
}

fn parse_category_type(s: &str) -> Result<CategoryType, String> {
    CategoryType::from_name(s).ok_or_else(|| format!("unknown category type '{s}'"))
}

fn parse_frequency(s: &str) -> Result<RecurrenceFrequency, String> {
    RecurrenceFrequency::from_name(s).ok_or_else(|| format!("unknown recurrence '{s}'"))
}

/// `3=120.5` or `mar=120.5` -> `(2, 120.5)`
fn parse_month_value(s: &str) -> Result<(usize, f64), String> {
    let Some((month, amount)) = s.split_once('=') else {
        return Err(format!("expected MONTH=AMOUNT, got '{s}'"));
    };
    let month = month.trim().to_ascii_lowercase();
    let idx = match month.parse::<usize>() {
        Ok(n @ 1..=12) => n - 1,
        Ok(n) => return Err(format!("month must be 1-12, got {n}")),
        Err(_) => MONTH_KEYS
            .iter()
            .position(|key| month.len() >= 3 && key.starts_with(month.as_str()))
            .ok_or_else(|| format!("unknown month '{month}'"))?,
    };
    let amount: f64 = amount
        .trim()
        .parse()
        .map_err(|_| format!("invalid amount '{}'", amount.trim()))?;
    Ok((idx, amount))
}
