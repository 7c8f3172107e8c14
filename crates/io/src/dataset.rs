// Dataset dispatch: pick a loader by file extension

use std::path::Path;

use serde::Serialize;
use tabex_engine::value::ResultSet;

use crate::error::LoadError;

/// Table name reported for CSV datasets.
pub const CSV_TABLE_NAME: &str = "data";

pub const CSV_EXTENSIONS: &[&str] = &["csv"];
pub const SQLITE_EXTENSIONS: &[&str] = &["db", "sqlite", "sqlite3"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetKind {
    Csv,
    Sqlite,
}

impl DatasetKind {
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        if CSV_EXTENSIONS.contains(&ext.as_str()) {
            Ok(Self::Csv)
        } else if SQLITE_EXTENSIONS.contains(&ext.as_str()) {
            Ok(Self::Sqlite)
        } else {
            Err(LoadError::UnsupportedInput(format!(
                "{}: expected .csv, .db, .sqlite or .sqlite3",
                path.display()
            )))
        }
    }
}

/// What to read from a dataset. SQLite needs a query or a table; a CSV file
/// is read whole unless a query or a table is given, which then runs against
/// the file loaded as table `data`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    Whole,
    Query(String),
    Table(String),
}

impl Selection {
    fn sql(&self) -> Option<String> {
        match self {
            Self::Whole => None,
            Self::Query(sql) => Some(sql.clone()),
            Self::Table(table) => Some(table_query(table)),
        }
    }
}

/// `SELECT * FROM "<table>"` with the identifier quoted.
pub fn table_query(table: &str) -> String {
    format!("SELECT * FROM {}", crate::sqlite::quote_ident(table))
}

pub fn load_dataset(path: &Path, selection: &Selection) -> Result<ResultSet, LoadError> {
    match (DatasetKind::from_path(path)?, selection.sql()) {
        (DatasetKind::Csv, None) => crate::csv::load_csv(path),
        (DatasetKind::Csv, Some(sql)) => {
            let loaded = crate::csv::load_csv(path)?;
            crate::sqlite::query_result_set(&loaded, CSV_TABLE_NAME, &sql)
        }
        (DatasetKind::Sqlite, Some(sql)) => crate::sqlite::load_sqlite(path, &sql),
        (DatasetKind::Sqlite, None) => Err(LoadError::UnsupportedInput(
            "SQLite datasets need a query or a table".to_string(),
        )),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<String>,
}

/// Tables and their columns. A CSV file is one table named `data`.
pub fn inspect_schema(path: &Path) -> Result<Vec<TableSchema>, LoadError> {
    match DatasetKind::from_path(path)? {
        DatasetKind::Csv => {
            let content = crate::csv::read_file_as_utf8(path)?;
            let header = content.lines().next().unwrap_or_default();
            let rs = crate::csv::load_csv_from_reader(header.as_bytes(), crate::csv::sniff_delimiter(&content))?;
            Ok(vec![TableSchema { name: CSV_TABLE_NAME.to_string(), columns: rs.columns().to_vec() }])
        }
        DatasetKind::Sqlite => crate::sqlite::sqlite_schema(path),
    }
}

/// Unique column names: blanks become `Unnamed: <i>`, repeats gain a
/// `.1`, `.2`, ... suffix.
pub(crate) fn unique_column_names<'a>(raw: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for (i, name) in raw.enumerate() {
        let base = if name.trim().is_empty() {
            format!("Unnamed: {i}")
        } else {
            name.to_string()
        };
        let mut candidate = base.clone();
        let mut n = 1;
        while out.contains(&candidate) {
            candidate = format!("{base}.{n}");
            n += 1;
        }
        out.push(candidate);
    }
    out
}
