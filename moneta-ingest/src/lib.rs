//! moneta-ingest: decoding of store exports (JSON/CSV), file-backed sources
//! and the editable JSON export.

pub mod parsers;
pub mod sources;
pub mod store;
pub mod types;

pub use parsers::csv_export::parse_csv_export;
pub use parsers::json_export::parse_json_export;
pub use sources::{CsvExportSource, ExportSource, JsonExportSource};
pub use store::ExportStore;
pub use types::{CsvTransactionRecord, ExportDocument, ExportFormat};
