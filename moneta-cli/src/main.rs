use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use moneta_core::{
    budget_period, compute_statistics, format_api_date, monthly_totals, parse_iso_date,
    totals_by_category, MonthLabel, PortfolioSource, StatisticsStore, TransactionSource,
};
use moneta_ingest::{ExportSource, ExportStore};
use serde::Serialize;
use tracing::{debug, info};

mod config;
mod edit;
mod logging;
mod render;

use config::Config;
use edit::{CategoryCommand, PortfolioEntryCommand, TxCommand};

#[derive(Parser, Debug)]
#[command(name = "moneta", version, about = "Personal finance statistics")]
struct Cli {
    /// JSON or CSV export to read (defaults to `[data] path` in config)
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// User whose rows are read (defaults to `[user] id` in config)
    #[arg(long, global = true)]
    user: Option<String>,

    /// Debug logging unless RUST_LOG is set
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Statistics for a date window (default: current budget period)
    Stats {
        /// First day, YYYY-MM-DD
        #[arg(long)]
        from: Option<String>,

        /// Last day, YYYY-MM-DD
        #[arg(long)]
        to: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Month-by-month breakdown of a calendar year
    Year {
        year: i32,

        /// Skip the first N days of the year (default from config)
        #[arg(long)]
        delay_days: Option<i64>,

        #[arg(long)]
        json: bool,
    },

    /// Compare two months of a year (months are 1-12)
    Compare {
        year: i32,
        month_a: usize,
        month_b: usize,

        #[arg(long)]
        json: bool,
    },

    /// Portfolio values for a year
    Portfolio {
        year: i32,

        #[arg(long)]
        json: bool,
    },

    /// Add, change or delete transactions in a JSON export
    Tx {
        #[command(subcommand)]
        command: TxCommand,
    },

    /// List and edit categories in a JSON export
    Category {
        #[command(subcommand)]
        command: CategoryCommand,
    },

    /// Add, change or delete portfolio rows in a JSON export
    PortfolioEntry {
        #[command(subcommand)]
        command: PortfolioEntryCommand,
    },

    /// Manage ~/.moneta/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config if none exists
    Init,
    /// Print the effective config
    Show,
}

/// Config with command-line overrides applied, plus the opened export
struct Session {
    config: Config,
    user_id: String,
    source: ExportSource,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose);

    match cli.command {
        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => {
                let cfg = config::load_config()?;
                println!("# {}", config::config_path()?.display());
                print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
            }
        },

        Command::Category { command: CategoryCommand::Types { json } } => {
            edit::print_category_types(json)?;
        }

        Command::Category { command } => {
            let (user_id, mut store) = open_store(cli.data, cli.user)?;
            edit::run_category(&mut store, &user_id, command)?;
        }

        Command::Tx { command } => {
            let (user_id, mut store) = open_store(cli.data, cli.user)?;
            edit::run_tx(&mut store, &user_id, command)?;
        }

        Command::PortfolioEntry { command } => {
            let (user_id, mut store) = open_store(cli.data, cli.user)?;
            edit::run_portfolio_entry(&mut store, &user_id, command)?;
        }

        Command::Stats { from, to, json } => {
            let session = open_session(cli.data, cli.user)?;
            let today = Local::now().date_naive();
            let (start, end) =
                stats_window(from.as_deref(), to.as_deref(), session.config.user.start_day, today)?;
            info!(start = %start, end = %end, "computing statistics");

            let txns = session.source.fetch_transactions(&session.user_id, start, end)?;
            let stats = compute_statistics(&txns);
            if json {
                print_json(&stats)?;
            } else {
                let title = format!("{} .. {}", format_api_date(start), format_api_date(end));
                println!("{}", render::render_statistics(&title, &stats, session.config.user.currency));
            }
        }

        Command::Year { year, delay_days, json } => {
            let session = open_session(cli.data, cli.user)?;
            let delay = delay_days.unwrap_or(session.config.year.delay_days);

            let mut store = StatisticsStore::new();
            let breakdown = store.load_year(&session.source, &session.user_id, year, delay)?;
            if json {
                print_json(breakdown)?;
            } else {
                println!("{}", render::render_yearly(breakdown, session.config.user.currency));
            }
        }

        Command::Compare { year, month_a, month_b, json } => {
            let session = open_session(cli.data, cli.user)?;
            let (Some(label_a), Some(label_b)) = (month_label(year, month_a), month_label(year, month_b))
            else {
                bail!("months must be between 1 and 12 (got {month_a} and {month_b})");
            };

            let mut store = StatisticsStore::new();
            store.load_year(&session.source, &session.user_id, year, session.config.year.delay_days)?;
            let comparison = store
                .compare_months(label_a.month_index(), label_b.month_index())
                .context("no statistics loaded")?;
            if json {
                print_json(&comparison)?;
            } else {
                println!(
                    "{}",
                    render::render_comparison(
                        &label_a.to_string(),
                        &label_b.to_string(),
                        &comparison,
                        session.config.user.currency
                    )
                );
            }
        }

        Command::Portfolio { year, json } => {
            let session = open_session(cli.data, cli.user)?;
            let entries = session.source.fetch_portfolio(&session.user_id, year)?;
            let by_category = totals_by_category(&entries);
            let monthly = monthly_totals(&entries);
            if json {
                print_json(&PortfolioReport { year, by_category: &by_category, monthly: &monthly })?;
            } else {
                println!(
                    "{}",
                    render::render_portfolio(year, &by_category, &monthly, session.config.user.currency)
                );
            }
        }
    }

    Ok(())
}

#[derive(Serialize)]
struct PortfolioReport<'a> {
    year: i32,
    by_category: &'a [moneta_core::CategoryAmount],
    monthly: &'a [f64; 12],
}

/// Export path and user id, command line first, then config
fn resolve_target(config: &Config, data: Option<PathBuf>, user: Option<String>) -> Result<(PathBuf, String)> {
    let Some(path) = data.or_else(|| config.data.path.clone()) else {
        bail!("No export configured. Pass --data <file> or set [data] path in config");
    };
    let user_id = user.unwrap_or_else(|| config.user.id.clone());
    if user_id.is_empty() {
        bail!("No user configured. Pass --user <id> or set [user] id in config");
    }
    Ok((path, user_id))
}

fn open_session(data: Option<PathBuf>, user: Option<String>) -> Result<Session> {
    let config = config::load_config()?;
    let (path, user_id) = resolve_target(&config, data, user)?;

    let source = ExportSource::open(&path).with_context(|| format!("opening {}", path.display()))?;
    debug!(path = %path.display(), user = %user_id, "opened export");
    Ok(Session { config, user_id, source })
}

/// Writes go to the JSON export only
fn open_store(data: Option<PathBuf>, user: Option<String>) -> Result<(String, ExportStore)> {
    let config = config::load_config()?;
    let (path, user_id) = resolve_target(&config, data, user)?;
    let store = ExportStore::open(&path).with_context(|| format!("opening {}", path.display()))?;
    debug!(path = %path.display(), user = %user_id, "opened export for editing");
    Ok((user_id, store))
}

/// Explicit bounds win; a missing bound falls back to the budget period
fn stats_window(
    from: Option<&str>,
    to: Option<&str>,
    start_day: u32,
    today: NaiveDate,
) -> Result<(NaiveDate, NaiveDate)> {
    let (period_start, period_end) = budget_period(start_day, today)?;
    let start = match from {
        Some(s) => parse_iso_date(s).with_context(|| format!("invalid --from date: {s}"))?,
        None => period_start,
    };
    let end = match to {
        Some(s) => parse_iso_date(s).with_context(|| format!("invalid --to date: {s}"))?,
        None => period_end,
    };
    if start > end {
        bail!("--from {} is after --to {}", format_api_date(start), format_api_date(end));
    }
    Ok((start, end))
}

/// 1-based month number to a label
fn month_label(year: i32, month: usize) -> Option<MonthLabel> {
    MonthLabel::new(year, u32::try_from(month).ok()?)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).context("serialize output")?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_stats_window_defaults_to_budget_period() {
        let (start, end) = stats_window(None, None, 25, date(2024, 3, 10)).unwrap();
        assert_eq!(start, date(2024, 2, 25));
        assert_eq!(end, date(2024, 3, 24));
    }

    #[test]
    fn test_stats_window_explicit_bounds() {
        let (start, end) =
            stats_window(Some("2024-01-01"), Some("2024-01-31"), 1, date(2024, 6, 1)).unwrap();
        assert_eq!(start, date(2024, 1, 1));
        assert_eq!(end, date(2024, 1, 31));

        assert!(stats_window(Some("2024-02-01"), Some("2024-01-01"), 1, date(2024, 6, 1)).is_err());
        assert!(stats_window(Some("01/02/2024"), None, 1, date(2024, 6, 1)).is_err());
    }

    #[test]
    fn test_month_label_is_one_based() {
        assert_eq!(month_label(2024, 1).unwrap().month_index(), 0);
        assert_eq!(month_label(2024, 12).unwrap().month_index(), 11);
        assert!(month_label(2024, 0).is_none());
        assert!(month_label(2024, 13).is_none());
    }

    #[test]
    fn test_cli_parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["moneta", "year", "2024", "--data", "x.json", "--user", "u1"])
            .unwrap();
        assert_eq!(cli.data, Some(PathBuf::from("x.json")));
        assert_eq!(cli.user.as_deref(), Some("u1"));
        assert!(matches!(cli.command, Command::Year { year: 2024, delay_days: None, json: false }));
    }

    #[test]
    fn test_cli_parses_edit_commands() {
        let cli = Cli::try_parse_from([
            "moneta", "tx", "add", "--category", "c1", "--amount", "-12.5", "--recurrence", "monthly",
        ])
        .unwrap();
        let Command::Tx { command: TxCommand::Add { amount, date, recurrence, .. } } = cli.command else {
            panic!("expected tx add");
        };
        assert_eq!(amount, -12.5);
        assert_eq!(date, None);
        assert_eq!(recurrence, Some(moneta_core::RecurrenceFrequency::Monthly));

        let cli = Cli::try_parse_from([
            "moneta", "portfolio-entry", "update", "p1", "--value", "jan=10", "--value", "12=20",
        ])
        .unwrap();
        let Command::PortfolioEntry { command: PortfolioEntryCommand::Update { id, values, .. } } =
            cli.command
        else {
            panic!("expected portfolio-entry update");
        };
        assert_eq!(id, "p1");
        assert_eq!(values, vec![(0, 10.0), (11, 20.0)]);

        let cli = Cli::try_parse_from(["moneta", "category", "add", "Gym", "--type", "optional_expense"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Command::Category {
                command: CategoryCommand::Add { kind: moneta_core::CategoryType::OptionalExpense, .. }
            }
        ));

        assert!(Cli::try_parse_from(["moneta", "category", "add", "Gym", "--type", "hobby"]).is_err());
        assert!(Cli::try_parse_from([
            "moneta", "tx", "update", "t1", "--recurrence", "weekly", "--not-recurring"
        ])
        .is_err());
    }

    #[test]
    fn test_resolve_target_prefers_command_line() {
        let mut config = Config::default();
        config.data.path = Some(PathBuf::from("from-config.json"));
        config.user.id = "config-user".into();

        let (path, user) = resolve_target(&config, None, Some("u9".into())).unwrap();
        assert_eq!(path, PathBuf::from("from-config.json"));
        assert_eq!(user, "u9");

        assert!(resolve_target(&Config::default(), Some("x.json".into()), None).is_err());
        assert!(resolve_target(&Config::default(), None, Some("u1".into())).is_err());
    }
}
