//! Finance record types: transactions, categories and their semantic kinds

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::time::MonthLabel;

/// Semantic kind of a category. Every aggregation rule dispatches on this.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum CategoryType {
    #[serde(rename = "income")]
    Income,
    #[serde(rename = "necessary_expense")]
    NecessaryExpense,
    #[serde(rename = "optional_expense")]
    OptionalExpense,
    #[serde(rename = "short_term_investment")]
    ShortTermInvestment,
    #[serde(rename = "long_term_investment")]
    LongTermInvestment,
}

impl CategoryType {
    pub const ALL: [CategoryType; 5] = [
        CategoryType::Income,
        CategoryType::NecessaryExpense,
        CategoryType::OptionalExpense,
        CategoryType::ShortTermInvestment,
        CategoryType::LongTermInvestment,
    ];

    /// Store-side name of the type (`category_types.name`)
    pub fn name(&self) -> &'static str {
        match self {
            CategoryType::Income => "income",
            CategoryType::NecessaryExpense => "necessary_expense",
            CategoryType::OptionalExpense => "optional_expense",
            CategoryType::ShortTermInvestment => "short_term_investment",
            CategoryType::LongTermInvestment => "long_term_investment",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name.trim())
    }

    /// Numeric `category_types.id`
    pub fn id(&self) -> i64 {
        Self::ALL.iter().position(|kind| kind == self).map_or(0, |idx| idx as i64 + 1)
    }

    /// Map the numeric `category_types.id` (1-based, declaration order)
    pub fn from_id(id: i64) -> Option<Self> {
        usize::try_from(id)
            .ok()
            .and_then(|id| id.checked_sub(1))
            .and_then(|idx| Self::ALL.get(idx).copied())
    }

    /// Necessary and optional expenses count towards `total_expenses`
    pub fn is_expense(&self) -> bool {
        matches!(
            self,
            CategoryType::NecessaryExpense | CategoryType::OptionalExpense
        )
    }

    pub fn is_investment(&self) -> bool {
        matches!(
            self,
            CategoryType::ShortTermInvestment | CategoryType::LongTermInvestment
        )
    }
}

/// How often a recurring transaction repeats
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum RecurrenceFrequency {
    #[serde(rename = "daily")]
    Daily,
    #[serde(rename = "weekly")]
    Weekly,
    #[serde(rename = "monthly")]
    Monthly,
    #[serde(rename = "yearly")]
    Yearly,
}

impl RecurrenceFrequency {
    pub const ALL: [RecurrenceFrequency; 4] = [
        RecurrenceFrequency::Daily,
        RecurrenceFrequency::Weekly,
        RecurrenceFrequency::Monthly,
        RecurrenceFrequency::Yearly,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            RecurrenceFrequency::Daily => "daily",
            RecurrenceFrequency::Weekly => "weekly",
            RecurrenceFrequency::Monthly => "monthly",
            RecurrenceFrequency::Yearly => "yearly",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|freq| freq.name() == name.trim())
    }

    pub fn id(&self) -> i64 {
        Self::ALL.iter().position(|freq| freq == self).map_or(0, |idx| idx as i64 + 1)
    }

    pub fn from_id(id: i64) -> Option<Self> {
        usize::try_from(id)
            .ok()
            .and_then(|id| id.checked_sub(1))
            .and_then(|idx| Self::ALL.get(idx).copied())
    }
}

/// A user-defined category, resolved together with its type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: String,
    pub name: String,
    /// `None` when the type relation did not resolve
    #[serde(rename = "type", default)]
    pub category_type: Option<CategoryType>,
}

impl Category {
    pub fn new(id: impl Into<String>, name: impl Into<String>, category_type: CategoryType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category_type: Some(category_type),
        }
    }
}

/// A single income/expense/investment movement as read from the store.
/// Soft-deleted rows never become a `Transaction`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: String,
    pub user_id: String,
    pub category_id: Option<String>,
    /// Signed amount, currency-agnostic
    pub amount: f64,
    pub date: NaiveDate,
    pub is_recurring: bool,
    pub recurrence_frequency: Option<RecurrenceFrequency>,
    pub description: Option<String>,
    /// Resolved category relation
    pub category: Option<Category>,
}

impl Transaction {
    /// Create an uncategorized transaction
    pub fn new(id: impl Into<String>, date: NaiveDate, amount: f64) -> Self {
        Self {
            id: id.into(),
            user_id: String::new(),
            category_id: None,
            amount,
            date,
            is_recurring: false,
            recurrence_frequency: None,
            description: None,
            category: None,
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category_id = Some(category.id.clone());
        self.category = Some(category);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_recurrence(mut self, frequency: RecurrenceFrequency) -> Self {
        self.is_recurring = true;
        self.recurrence_frequency = Some(frequency);
        self
    }

    /// Resolved category type, if both relations resolved
    pub fn category_type(&self) -> Option<CategoryType> {
        self.category.as_ref().and_then(|c| c.category_type)
    }

    pub fn category_name(&self) -> Option<&str> {
        self.category.as_ref().map(|c| c.name.as_str())
    }

    /// True when the resolved type is one of `kinds`
    pub fn is_of(&self, kinds: &[CategoryType]) -> bool {
        self.category_type().is_some_and(|kind| kinds.contains(&kind))
    }

    /// Calendar month the transaction falls in
    pub fn month(&self) -> MonthLabel {
        MonthLabel::from_date(self.date)
    }
}
