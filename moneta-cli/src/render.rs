//! Plain-text rendering of statistics for the terminal.

use moneta_core::{CategoryAmount, CategoryType, MonthComparison, Statistics, YearlyBreakdown};

use crate::config::Currency;

/// `1234.5` -> `€1,234.50`; negatives get a leading `-`
pub fn format_amount(amount: f64, currency: Currency) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let digits = (cents / 100).to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}{}{grouped}.{:02}", currency.symbol(), cents % 100)
}

pub fn type_label(kind: CategoryType) -> &'static str {
    match kind {
        CategoryType::Income => "Income",
        CategoryType::NecessaryExpense => "necessary",
        CategoryType::OptionalExpense => "optional",
        CategoryType::ShortTermInvestment => "Short-term invested",
        CategoryType::LongTermInvestment => "Long-term invested",
    }
}

fn signed_amount(amount: f64, currency: Currency) -> String {
    if amount > 0.0 {
        format!("+{}", format_amount(amount, currency))
    } else {
        format_amount(amount, currency)
    }
}

fn row(label: &str, value: String) -> String {
    format!("{:<22}{value}", format!("{label}:"))
}

pub fn render_statistics(title: &str, stats: &Statistics, currency: Currency) -> String {
    let money = |v: f64| format_amount(v, currency);
    let mut lines = vec![
        format!("# {title}"),
        String::new(),
        row("Income", money(stats.total_for(CategoryType::Income))),
        row("Expenses", money(stats.total_expenses)),
    ];
    for kind in CategoryType::ALL.iter().filter(|k| k.is_expense()) {
        lines.push(row(&format!("  {}", type_label(*kind)), money(stats.total_for(*kind))));
    }
    for kind in CategoryType::ALL.iter().filter(|k| k.is_investment()) {
        lines.push(row(type_label(*kind), money(stats.total_for(*kind))));
    }
    lines.extend([
        row("Savings", money(stats.monthly_savings())),
        row("Savings rate", format!("{:.1}%", stats.savings_rate())),
        row("Necessary share", format!("{:.1}%", stats.necessary_expense_percentage())),
    ]);

    if !stats.expenses_by_category.is_empty() {
        lines.push(String::new());
        lines.push("## Expenses by category".to_string());
        lines.extend(category_lines(&stats.expenses_by_category, currency));
    }

    if !stats.month_labels.is_empty() {
        lines.push(String::new());
        lines.push("## Monthly".to_string());
        for (i, label) in stats.month_labels.iter().enumerate() {
            lines.push(format!(
                "{label}  income {}  expenses {}",
                money(stats.monthly_income[i]),
                money(stats.monthly_expenses[i])
            ));
        }
    }

    lines.join("\n")
}

pub fn render_yearly(breakdown: &YearlyBreakdown, currency: Currency) -> String {
    let money = |v: f64| format_amount(v, currency);
    let mut lines = vec![format!("# {}", breakdown.year), String::new()];

    for month in &breakdown.months {
        let stats = &month.statistics;
        lines.push(format!(
            "{}  income {:>12}  expenses {:>12}  savings {:>12}  ({} txns)",
            month.label,
            money(stats.total_income),
            money(stats.total_expenses),
            money(stats.monthly_savings()),
            month.transactions.len()
        ));
    }

    lines.push(String::new());
    lines.push(render_statistics(
        &format!("{} total", breakdown.year),
        &breakdown.yearly_statistics,
        currency,
    ));
    lines.join("\n")
}

pub fn render_comparison(
    from: &str,
    to: &str,
    comparison: &MonthComparison,
    currency: Currency,
) -> String {
    [
        format!("# {from} -> {to}"),
        String::new(),
        format!(
            "Income:   {} ({:+.1}%)",
            signed_amount(comparison.income_change, currency),
            comparison.income_change_percentage
        ),
        format!(
            "Expenses: {} ({:+.1}%)",
            signed_amount(comparison.expenses_change, currency),
            comparison.expenses_change_percentage
        ),
        format!(
            "Savings:  {} ({:+.1}%)",
            signed_amount(comparison.savings_change, currency),
            comparison.savings_change_percentage
        ),
    ]
    .join("\n")
}

pub fn render_portfolio(
    year: i32,
    by_category: &[CategoryAmount],
    monthly: &[f64; 12],
    currency: Currency,
) -> String {
    let mut lines = vec![format!("# Portfolio {year}"), String::new()];
    if by_category.is_empty() {
        lines.push("(no portfolio entries)".to_string());
        return lines.join("\n");
    }

    lines.extend(category_lines(by_category, currency));
    lines.push(String::new());
    lines.push("## Monthly".to_string());
    for (key, value) in moneta_core::MONTH_KEYS.iter().zip(monthly) {
        lines.push(format!("{key:<10} {}", format_amount(*value, currency)));
    }
    lines.join("\n")
}

fn category_lines(amounts: &[CategoryAmount], currency: Currency) -> Vec<String> {
    let width = amounts.iter().map(|c| c.name.chars().count()).max().unwrap_or(0);
    amounts
        .iter()
        .map(|c| format!("- {:<width$}  {}", c.name, format_amount(c.amount, currency)))
        .collect()
}
