//! `tabex-io`: encoders, dataset loaders and the export orchestrator.

pub mod csv;
pub mod dataset;
pub mod error;
pub mod export;
pub mod json;
pub mod sqlite;
pub mod xlsx;

pub use dataset::{inspect_schema, load_dataset, Selection, TableSchema};
pub use error::LoadError;
pub use export::{export, export_at};
