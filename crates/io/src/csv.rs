// CSV import (dataset loading) and export (delimited text encoder)

use std::io::Read;
use std::path::Path;

use log::{debug, warn};
use tabex_engine::error::ExportError;
use tabex_engine::options::ExportConfig;
use tabex_engine::value::{ResultSet, Row, Value};

use crate::dataset::unique_column_names;
use crate::error::LoadError;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CsvOptions {
    pub include_header: bool,
    pub delimiter: u8,
    pub bom: bool,
    /// Charset advertised in the MIME type. Bytes are always UTF-8.
    pub encoding: String,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            include_header: true,
            delimiter: b',',
            bom: false,
            encoding: "utf-8".to_string(),
        }
    }
}

impl CsvOptions {
    pub fn from_config(config: &ExportConfig) -> Self {
        let defaults = Self::default();
        let raw = config.text_or("delimiter", ",");
        let delimiter = match raw.as_bytes() {
            [b] => *b,
            _ => {
                warn!("CSV delimiter {raw:?} is not a single byte; using ','");
                defaults.delimiter
            }
        };
        Self {
            include_header: config.bool_or("includeHeader", defaults.include_header),
            delimiter,
            bom: config.bool_or("bom", defaults.bom),
            encoding: config.text_or("encoding", &defaults.encoding),
        }
    }
}

/// Delimited text for `result_set`: optional BOM, optional header, one line
/// per row terminated by `\n`. Fields are quoted only when they contain the
/// delimiter, a double quote or a line break. Null values are empty fields.
pub fn encode_csv(result_set: &ResultSet, options: &CsvOptions) -> Result<Vec<u8>, ExportError> {
    let mut out = Vec::new();
    if options.bom {
        out.extend_from_slice(UTF8_BOM);
    }

    let mut writer = csv::WriterBuilder::new()
        .delimiter(options.delimiter)
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(out);

    if options.include_header {
        writer.write_record(result_set.columns()).map_err(encode_error)?;
    }
    for row in result_set.rows() {
        writer
            .write_record(result_set.columns().iter().map(|c| row.value(c).to_string()))
            .map_err(encode_error)?;
    }

    writer
        .into_inner()
        .map_err(|e| ExportError::Encode(format!("failed to flush CSV: {}", e.error())))
}

fn encode_error(err: csv::Error) -> ExportError {
    ExportError::Encode(format!("CSV write failed: {err}"))
}

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

/// Load a CSV file. The first record is the header; the delimiter is sniffed.
pub fn load_csv(path: &Path) -> Result<ResultSet, LoadError> {
    let content = read_file_as_utf8(path)?;
    let delimiter = sniff_delimiter(&content);
    debug!("loading {} with delimiter {:?}", path.display(), delimiter as char);
    load_csv_from_reader(content.as_bytes(), delimiter)
}

/// Load delimited text from any reader. Short records leave trailing columns
/// null; extra fields past the header are dropped.
pub fn load_csv_from_reader<R: Read>(reader: R, delimiter: u8) -> Result<ResultSet, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let columns = unique_column_names(reader.headers()?.iter());
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut row = Row::with_capacity(columns.len());
        for (name, field) in columns.iter().zip(record.iter()) {
            row.insert(name.as_str(), infer_value(field));
        }
        rows.push(row);
    }
    Ok(ResultSet::new(columns, rows))
}

/// Type one CSV field: empty → null, integer → Int, finite float → Float,
/// anything else is kept verbatim as text.
pub fn infer_value(field: &str) -> Value {
    if field.is_empty() {
        return Value::Null;
    }
    let trimmed = field.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::Int(i);
    }
    match trimmed.parse::<f64>() {
        Ok(f) if f.is_finite() => Value::Float(f),
        _ => Value::Text(field.to_string()),
    }
}

/// Pick the delimiter giving the most consistent field count over the first
/// lines. Candidates: tab, semicolon, comma, pipe.
pub(crate) fn sniff_delimiter(content: &str) -> u8 {
    const CANDIDATES: &[u8] = &[b'\t', b';', b',', b'|'];
    let lines: Vec<&str> = content.lines().take(10).collect();

    let field_count = |line: &str, delim: u8| -> usize {
        csv::ReaderBuilder::new()
            .delimiter(delim)
            .has_headers(false)
            .flexible(true)
            .from_reader(line.as_bytes())
            .records()
            .next()
            .and_then(Result::ok)
            .map_or(1, |r| r.len())
    };

    let mut best = (b',', 0usize);
    for &delim in CANDIDATES {
        let counts: Vec<usize> = lines.iter().map(|l| field_count(l, delim)).collect();
        let Some(&first) = counts.first() else { break };
        if first <= 1 {
            continue;
        }
        // Wider records break ties
        let score = counts.iter().filter(|&&c| c == first).count() * first;
        if score > best.1 {
            best = (delim, score);
        }
    }
    best.0
}

/// Read a file as text, falling back to Windows-1252 when it is not UTF-8.
/// A leading UTF-8 BOM is dropped.
pub fn read_file_as_utf8(path: &Path) -> Result<String, LoadError> {
    let bytes = std::fs::read(path).map_err(|source| LoadError::Io { path: path.to_path_buf(), source })?;
    let bytes = bytes.strip_prefix(UTF8_BOM).map(<[u8]>::to_vec).unwrap_or(bytes);
    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            debug!("{} is not UTF-8; decoding as Windows-1252", path.display());
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(e.as_bytes());
            Ok(decoded.into_owned())
        }
    }
}
