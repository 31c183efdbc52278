use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use moneta_core::{
    CategoryType, CategoryUpdate, NewTransaction, PortfolioSource, PortfolioUpdate,
    RecurrenceFrequency, TransactionSource, TransactionUpdate,
};
use moneta_ingest::{ExportSource, ExportStore};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn deleted_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap()
}

fn groceries(category_id: &str, amount: f64) -> NewTransaction {
    NewTransaction {
        category_id: category_id.to_string(),
        amount,
        date: date(2024, 2, 10),
        description: Some("market".into()),
        recurrence_frequency: None,
    }
}

#[test]
fn test_missing_file_starts_empty_and_saves() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("export.json");

    let mut store = ExportStore::open(&path).unwrap();
    assert!(store.document().transactions.is_empty());
    store.add_category("u1", "Salary", CategoryType::Income).unwrap();
    store.save().unwrap();

    assert!(path.exists());
    assert!(!path.with_extension("json.tmp").exists());
    let reopened = ExportStore::open(&path).unwrap();
    assert_eq!(reopened.categories("u1").len(), 1);
}

#[test]
fn test_category_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = ExportStore::open(dir.path().join("export.json")).unwrap();

    let gym = store.add_category("u1", "  Gym ", CategoryType::OptionalExpense).unwrap();
    assert_eq!(gym.name, "Gym");
    store.add_category("u2", "Other", CategoryType::Income).unwrap();
    assert!(store.add_category("u1", "   ", CategoryType::Income).is_err());

    let listed = store.categories("u1");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].category_type, Some(CategoryType::OptionalExpense));

    let update = CategoryUpdate {
        name: None,
        type_id: Some(CategoryType::NecessaryExpense.id()),
    };
    let updated = store.update_category("u1", &gym.id, &update).unwrap();
    assert_eq!(updated.category_type, Some(CategoryType::NecessaryExpense));
    assert_eq!(updated.id, gym.id);

    let bad_type = CategoryUpdate {
        name: None,
        type_id: Some(42),
    };
    assert!(store.update_category("u1", &gym.id, &bad_type).is_err());
    assert!(store.update_category("u1", &gym.id, &CategoryUpdate::default()).is_err());
    assert!(store.update_category("u2", &gym.id, &update).is_err());

    store.delete_category("u1", &gym.id, deleted_at()).unwrap();
    assert!(store.categories("u1").is_empty());
    // the row stays, stamped
    let row = store.document().categories.iter().find(|c| c.id == gym.id).unwrap();
    assert_eq!(row.deleted_at.as_deref(), Some("2024-03-05T10:00:00.000Z"));
    assert!(store.delete_category("u1", &gym.id, deleted_at()).is_err());
}

#[test]
fn test_category_types_listing() {
    let names: Vec<String> = ExportStore::category_types()
        .into_iter()
        .filter_map(|t| t.name)
        .collect();
    assert_eq!(
        names,
        vec![
            "income",
            "necessary_expense",
            "optional_expense",
            "short_term_investment",
            "long_term_investment"
        ]
    );
}

#[test]
fn test_transaction_lifecycle_is_visible_to_readers() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("export.json");
    let mut store = ExportStore::open(&path).unwrap();

    let food = store.add_category("u1", "Food", CategoryType::NecessaryExpense).unwrap();
    let fun = store.add_category("u1", "Fun", CategoryType::OptionalExpense).unwrap();
    let foreign = store.add_category("u2", "Theirs", CategoryType::Income).unwrap();

    let row = store.add_transaction("u1", groceries(&food.id, 42.5)).unwrap();
    assert_eq!(row.user_id, "u1");
    assert_eq!(row.description.as_deref(), Some("market"));
    assert!(!row.is_recurring);
    assert!(store.add_transaction("u1", groceries(&foreign.id, 1.0)).is_err());
    assert!(store.add_transaction("u1", groceries("missing", 1.0)).is_err());

    let recurring = store
        .add_transaction(
            "u1",
            NewTransaction {
                recurrence_frequency: Some(RecurrenceFrequency::Monthly),
                ..groceries(&fun.id, 9.99)
            },
        )
        .unwrap();
    assert!(recurring.is_recurring);
    assert_eq!(recurring.recurrence_frequency_id, Some(3));

    let moved = store
        .update_transaction(
            "u1",
            &row.id,
            &TransactionUpdate {
                category_id: Some(fun.id.clone()),
                amount: Some(50.0),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(moved.amount, Some(50.0));
    assert_eq!(moved.category.as_ref().map(|c| c.name.as_str()), Some("Fun"));
    assert!(store
        .update_transaction("u2", &row.id, &TransactionUpdate { amount: Some(1.0), ..Default::default() })
        .is_err());
    assert!(store
        .update_transaction("u1", &row.id, &TransactionUpdate { recurrence_frequency_id: Some(9), ..Default::default() })
        .is_err());

    store.delete_transaction("u1", &recurring.id, deleted_at()).unwrap();
    assert!(store.delete_transaction("u1", &recurring.id, deleted_at()).is_err());
    store.save().unwrap();

    let source = ExportSource::open(&path).unwrap();
    let txns = source.fetch_transactions("u1", date(2024, 1, 1), date(2024, 12, 31)).unwrap();
    assert_eq!(txns.len(), 1);
    assert_eq!(txns[0].id, row.id);
    assert_eq!(txns[0].category_type(), Some(CategoryType::OptionalExpense));

    let reopened = ExportStore::open(&path).unwrap();
    assert_eq!(reopened.document().transactions.len(), 2);
}

#[test]
fn test_portfolio_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("export.json");
    let mut store = ExportStore::open(&path).unwrap();

    let mut values = [None; 12];
    values[0] = Some(1000.0);
    let stocks = store.add_portfolio_entry("u1", 2024, "Stocks", values).unwrap();
    let cash = store.add_portfolio_entry("u1", 2024, "Cash", [None; 12]).unwrap();
    assert!(store.add_portfolio_entry("u1", 2024, " ", [None; 12]).is_err());

    // a row read back from the export, immutable columns included
    let update: PortfolioUpdate = serde_json::from_value(serde_json::json!({
        "id": "p-other",
        "user_id": "u2",
        "created_at": "2024-01-01T00:00:00Z",
        "feb_value": 1100.0
    }))
    .unwrap();
    let updated = store.update_portfolio_entry("u1", &stocks.id, &update).unwrap();
    assert_eq!(updated.id, stocks.id);
    assert_eq!(updated.user_id, "u1");
    assert_eq!(updated.values[0], Some(1000.0));
    assert_eq!(updated.values[1], Some(1100.0));
    assert!(store.update_portfolio_entry("u2", &stocks.id, &update).is_err());
    assert!(store.update_portfolio_entry("u1", &stocks.id, &PortfolioUpdate::default()).is_err());

    store.delete_portfolio_entry("u1", &cash.id, deleted_at()).unwrap();
    store.save().unwrap();

    let source = ExportSource::open(&path).unwrap();
    let entries = source.fetch_portfolio("u1", 2024).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].category, "Stocks");
    assert_eq!(entries[0].total(), 2100.0);
}
