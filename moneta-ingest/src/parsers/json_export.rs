//! JSON exports of the remote store.
//!
//! Two shapes are accepted: the full export document
//! `{ "categories": [...], "transactions": [...], "portfolio": [...] }`, or
//! the bare array a `transactions` select returns.

use anyhow::{Context, Result};
use moneta_core::TransactionRow;
use serde::Deserialize;

use crate::types::ExportDocument;

#[derive(Deserialize)]
#[serde(untagged)]
enum ExportShape {
    Rows(Vec<TransactionRow>),
    Document(ExportDocument),
}

pub fn parse_json_export(text: &str) -> Result<ExportDocument> {
    let shape: ExportShape = serde_json::from_str(text).context("parse JSON export")?;
    Ok(match shape {
        ExportShape::Rows(transactions) => ExportDocument {
            transactions,
            ..Default::default()
        },
        ExportShape::Document(doc) => doc,
    })
}
