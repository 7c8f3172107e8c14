//! Format-agnostic 2-D cell grids.
//!
//! Every non-trivial sheet an encoder writes is first assembled here: a
//! header row, data rows, optional title/timestamp rows above the header,
//! an optional total row, and formatting directives the encoder applies.

use std::collections::BTreeMap;

use crate::stats::sum_lenient;
use crate::value::{ResultSet, Value};

/// Number format applied to numeric columns of formatted data sheets.
pub const NUMBER_FORMAT: &str = "#,##0.00";

/// Label written into the first cell of total rows.
pub const TOTAL_LABEL: &str = "Total";

/// Spreadsheets keep 15 significant digits. Integers beyond this are
/// rendered as text so no digit is lost.
pub const MAX_SAFE_SPREADSHEET_INT: i64 = 999_999_999_999_999;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Cell {
    pub fn text(s: impl Into<String>) -> Self {
        Cell::Text(s.into())
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<&Value> for Cell {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Cell::Empty,
            Value::Bool(b) => Cell::Bool(*b),
            Value::Int(i) if i.unsigned_abs() > MAX_SAFE_SPREADSHEET_INT as u64 => Cell::Text(i.to_string()),
            Value::Int(i) => Cell::Number(*i as f64),
            Value::Float(f) if f.is_finite() => Cell::Number(*f),
            Value::Float(f) => Cell::Text(f.to_string()),
            Value::Text(s) if s.is_empty() => Cell::Empty,
            Value::Text(s) => Cell::Text(s.clone()),
        }
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

impl From<usize> for Cell {
    fn from(n: usize) -> Self {
        Cell::Number(n as f64)
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

/// Header plus data rows, as produced by an analytical view.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

/// Inclusive cell range, zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub first_row: usize,
    pub first_col: usize,
    pub last_row: usize,
    pub last_col: usize,
}

/// A sheet's cells plus formatting directives.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Grid {
    pub rows: Vec<Vec<Cell>>,
    /// Row index of the column header, if one was written.
    pub header_row: Option<usize>,
    pub bold_header: bool,
    /// Freeze panes below the header row.
    pub freeze_header: bool,
    pub autofilter: Option<CellRange>,
    /// Column index to number format. Applied per column, never per cell.
    pub column_formats: BTreeMap<usize, String>,
    /// Rows rendered in bold besides the header (title, totals).
    pub bold_rows: Vec<usize>,
    /// Row index of the total row, if one was appended.
    pub total_row: Option<usize>,
}

impl Grid {
    /// Plain grid: header in the first row, then the table rows.
    pub fn from_table(table: &Table) -> Self {
        let mut rows = Vec::with_capacity(table.rows.len() + 1);
        rows.push(table.header.iter().map(|h| Cell::text(h.as_str())).collect());
        rows.extend(table.rows.iter().cloned());
        Self { rows, header_row: Some(0), ..Self::default() }
    }

    /// Every result row in result-set order, columns in column order.
    pub fn from_result_set(result_set: &ResultSet) -> Self {
        let mut rows = Vec::with_capacity(result_set.len() + 1);
        rows.push(result_set.columns().iter().map(|c| Cell::text(c.as_str())).collect());
        for row in result_set.rows() {
            rows.push(result_set.columns().iter().map(|c| Cell::from(row.value(c))).collect());
        }
        Self { rows, header_row: Some(0), ..Self::default() }
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Append a `Total` row summing each numeric column, missing values as 0.
    ///
    /// The label goes in the first cell; a numeric first column overwrites it
    /// with its sum. Non-numeric cells stay blank. Nothing is appended when
    /// there are no numeric columns.
    pub fn append_total_row(&mut self, result_set: &ResultSet, numeric_columns: &[String]) {
        if numeric_columns.is_empty() {
            return;
        }
        let columns = result_set.columns();
        let mut total = vec![Cell::Empty; columns.len().max(1)];
        total[0] = Cell::text(TOTAL_LABEL);
        for col in numeric_columns {
            if let Some(idx) = columns.iter().position(|c| c == col) {
                total[idx] = Cell::Number(sum_lenient(result_set.rows(), col));
            }
        }
        let idx = self.rows.len();
        self.rows.push(total);
        self.total_row = Some(idx);
        self.bold_rows.push(idx);
    }
}

/// Layout switches for a generic formatted data sheet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataSheetOptions {
    pub title: Option<String>,
    /// Pre-rendered generation timestamp.
    pub generated_at: Option<String>,
    pub include_header: bool,
    pub bold_header: bool,
    pub freeze_header: bool,
    pub autofilter: bool,
    /// Number format for numeric columns.
    pub number_format: Option<String>,
    pub total_row: bool,
}

/// Formatted data sheet: optional title and timestamp rows, then header,
/// data rows in result-set order, then an optional total row.
pub fn build_data_sheet(
    result_set: &ResultSet,
    numeric_columns: &[String],
    options: &DataSheetOptions,
) -> Grid {
    let columns = result_set.columns();
    let mut grid = Grid::default();

    if let Some(title) = &options.title {
        grid.bold_rows.push(grid.rows.len());
        grid.rows.push(vec![Cell::text(title.as_str())]);
    }
    if let Some(ts) = &options.generated_at {
        grid.rows.push(vec![Cell::text(format!("Generated: {ts}"))]);
    }

    if options.include_header {
        grid.header_row = Some(grid.rows.len());
        grid.bold_header = options.bold_header;
        grid.rows.push(columns.iter().map(|c| Cell::text(c.as_str())).collect());
    }

    for row in result_set.rows() {
        grid.rows.push(columns.iter().map(|c| Cell::from(row.value(c))).collect());
    }
    let last_data_row = grid.rows.len().saturating_sub(1);

    if let Some(format) = &options.number_format {
        for col in numeric_columns {
            if let Some(idx) = columns.iter().position(|c| c == col) {
                grid.column_formats.insert(idx, format.clone());
            }
        }
    }

    if let Some(header_row) = grid.header_row {
        grid.freeze_header = options.freeze_header;
        if options.autofilter && !columns.is_empty() {
            grid.autofilter = Some(CellRange {
                first_row: header_row,
                first_col: 0,
                last_row: last_data_row.max(header_row),
                last_col: columns.len() - 1,
            });
        }
    }

    if options.total_row {
        grid.append_total_row(result_set, numeric_columns);
    }

    grid
}
