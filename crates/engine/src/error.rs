use std::fmt;

/// Failures that prevent an export from producing any artifact.
///
/// Problems local to one analytical view (no numeric columns, no category
/// column, and so on) are never errors: the view is skipped and the rest of
/// the export still runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportError {
    /// Requested template id is not in the catalog.
    TemplateNotFound(String),
    /// Format string has no registered encoder.
    UnsupportedFormat(String),
    /// The underlying writer (spreadsheet container, serializer) failed.
    Encode(String),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TemplateNotFound(id) => write!(f, "Template with ID {id} not found"),
            Self::UnsupportedFormat(format) => write!(f, "Unsupported format: {format}"),
            Self::Encode(msg) => write!(f, "encode error: {msg}"),
        }
    }
}

impl std::error::Error for ExportError {}
