// XLSX export: Raw Data sheet plus one analytical or formatted data sheet

use chrono::{DateTime, Utc};
use log::{debug, warn};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use tabex_engine::aggregate::{category_grouping, quarterly_report, statistical_summary};
use tabex_engine::catalog::Category;
use tabex_engine::classify::classify_numeric_columns;
use tabex_engine::error::ExportError;
use tabex_engine::grid::{build_data_sheet, Cell, CellRange, DataSheetOptions, Grid, NUMBER_FORMAT};
use tabex_engine::options::ExportConfig;
use tabex_engine::value::ResultSet;

use crate::json::timestamp;

pub const RAW_DATA_SHEET: &str = "Raw Data";
pub const SUMMARY_SHEET: &str = "Summary Statistics";
pub const CATEGORY_SHEET: &str = "Category Analysis";
pub const QUARTERLY_SHEET: &str = "Quarterly Report";
pub const DEFAULT_DATA_SHEET: &str = "Query Results";

/// Excel rejects longer sheet names.
pub const MAX_SHEET_NAME_LEN: usize = 31;

/// Excel's limit on the text in one cell, in characters.
pub const MAX_CELL_TEXT_CHARS: usize = 32_767;

const FORBIDDEN_SHEET_CHARS: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];

/// Result of encoding a workbook
#[derive(Debug, Default)]
pub struct EncodedWorkbook {
    pub bytes: Vec<u8>,
    /// Sheet names in workbook order
    pub sheets: Vec<String>,
}

/// Layout of the formatted data sheet for general and visualization
/// templates, read from the effective config.
pub fn data_sheet_options(config: &ExportConfig, now: DateTime<Utc>) -> DataSheetOptions {
    DataSheetOptions {
        title: config
            .bool_or("addTitle", false)
            .then(|| config.text_or("titleText", "Data Export")),
        generated_at: config.bool_or("addDatetime", false).then(|| timestamp(now)),
        include_header: config.bool_or("includeHeader", true),
        bold_header: config.bool_or("boldHeader", true),
        freeze_header: config.bool_or("freezeHeader", false),
        autofilter: config.bool_or("autoFilter", false),
        number_format: config
            .bool_or("formatNumbers", false)
            .then(|| NUMBER_FORMAT.to_string()),
        total_row: config.bool_or("addTotalRow", false),
    }
}

/// Sheet name for the data sheet: forbidden characters replaced, blank names
/// defaulted, truncated to Excel's limit, and never equal to `Raw Data`.
pub fn data_sheet_name(requested: &str) -> String {
    let cleaned: String = requested
        .chars()
        .map(|c| if FORBIDDEN_SHEET_CHARS.contains(&c) { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim().trim_matches('\'');
    let base = if cleaned.is_empty() { DEFAULT_DATA_SHEET } else { cleaned };
    let name = truncate_chars(base, MAX_SHEET_NAME_LEN);
    if name.eq_ignore_ascii_case(RAW_DATA_SHEET) {
        format!("{name} (2)")
    } else {
        name
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Build the workbook in memory.
///
/// The `Raw Data` sheet is always first. Analysis and financial templates
/// add their analytical sheet when it has content; general and visualization
/// templates add a formatted data sheet.
pub fn encode_workbook(
    result_set: &ResultSet,
    config: &ExportConfig,
    now: DateTime<Utc>,
) -> Result<EncodedWorkbook, ExportError> {
    let mut workbook = Workbook::new();
    let mut report = EncodedWorkbook::default();

    let mut raw = Grid::from_result_set(result_set);
    if config.bool_or("autoFilter", false) && !result_set.columns().is_empty() {
        raw.autofilter = Some(CellRange {
            first_row: 0,
            first_col: 0,
            last_row: result_set.len(),
            last_col: result_set.columns().len() - 1,
        });
    }
    add_sheet(&mut workbook, RAW_DATA_SHEET, &raw, &mut report)?;

    match config.category {
        Category::Analysis => {
            let (name, table) = match config.kind {
                "summary" => (SUMMARY_SHEET, Some(statistical_summary(result_set))),
                "grouping" => (CATEGORY_SHEET, category_grouping(result_set)),
                other => {
                    debug!("no analytical view for analysis kind '{other}'");
                    (SUMMARY_SHEET, None)
                }
            };
            if let Some(table) = table {
                add_sheet(&mut workbook, name, &Grid::from_table(&table), &mut report)?;
            }
        }
        Category::Financial => {
            if let Some(table) = quarterly_report(result_set) {
                add_sheet(&mut workbook, QUARTERLY_SHEET, &Grid::from_table(&table), &mut report)?;
            }
        }
        Category::General | Category::Visualization => {
            let numeric = classify_numeric_columns(result_set);
            let grid = build_data_sheet(result_set, &numeric, &data_sheet_options(config, now));
            let name = data_sheet_name(&config.text_or("sheetName", DEFAULT_DATA_SHEET));
            add_sheet(&mut workbook, &name, &grid, &mut report)?;
        }
    }

    report.bytes = workbook
        .save_to_buffer()
        .map_err(|e| ExportError::Encode(format!("failed to save workbook: {e}")))?;
    Ok(report)
}

fn add_sheet(
    workbook: &mut Workbook,
    name: &str,
    grid: &Grid,
    report: &mut EncodedWorkbook,
) -> Result<(), ExportError> {
    let worksheet = workbook
        .add_worksheet()
        .set_name(name)
        .map_err(|e| ExportError::Encode(format!("failed to create sheet '{name}': {e}")))?;

    write_grid(worksheet, grid)
        .map_err(|e| ExportError::Encode(format!("sheet '{name}': {e}")))?;
    report.sheets.push(name.to_string());
    debug!("wrote sheet '{name}' ({} rows)", grid.height());
    Ok(())
}

/// `text` cut to [`MAX_CELL_TEXT_CHARS`]. Longer values are truncated with a
/// warning rather than failing the export.
fn fit_cell_text(text: &str, row: usize, col: usize) -> &str {
    match text.char_indices().nth(MAX_CELL_TEXT_CHARS) {
        Some((cut, _)) => {
            warn!(
                "cell ({row}, {col}) has {} characters; truncated to {MAX_CELL_TEXT_CHARS}",
                text.chars().count()
            );
            &text[..cut]
        }
        None => text,
    }
}

fn write_grid(worksheet: &mut Worksheet, grid: &Grid) -> Result<(), XlsxError> {
    for (&col, num_format) in &grid.column_formats {
        worksheet.set_column_format(col as u16, &Format::new().set_num_format(num_format))?;
    }

    for (r, row) in grid.rows.iter().enumerate() {
        let bold = grid.bold_rows.contains(&r) || (grid.bold_header && grid.header_row == Some(r));
        let is_header = grid.header_row == Some(r);
        for (c, cell) in row.iter().enumerate() {
            let mut format = Format::new();
            if bold {
                format = format.set_bold();
            }
            if !is_header {
                if let Some(num_format) = grid.column_formats.get(&c) {
                    format = format.set_num_format(num_format);
                }
            }
            let (r32, c16) = (r as u32, c as u16);
            match cell {
                Cell::Empty => continue,
                Cell::Text(s) => worksheet.write_string_with_format(r32, c16, fit_cell_text(s, r, c), &format)?,
                Cell::Number(n) => worksheet.write_number_with_format(r32, c16, *n, &format)?,
                Cell::Bool(b) => worksheet.write_boolean_with_format(r32, c16, *b, &format)?,
            };
        }
    }

    if let Some(header_row) = grid.header_row.filter(|_| grid.freeze_header) {
        worksheet.set_freeze_panes(header_row as u32 + 1, 0)?;
    }
    if let Some(range) = grid.autofilter {
        worksheet.autofilter(
            range.first_row as u32,
            range.first_col as u16,
            range.last_row as u32,
            range.last_col as u16,
        )?;
    }
    Ok(())
}
