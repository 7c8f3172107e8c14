use std::fmt;
use std::path::PathBuf;

/// Failures while turning a dataset file into a result set.
#[derive(Debug)]
pub enum LoadError {
    /// File could not be opened or read.
    Io { path: PathBuf, source: std::io::Error },
    /// Malformed delimited text.
    Csv(String),
    /// SQLite open, prepare or step failure.
    Sqlite(String),
    /// Extension not recognised as a dataset, or a query is missing.
    UnsupportedInput(String),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "cannot read {}: {source}", path.display()),
            Self::Csv(msg) => write!(f, "CSV parse error: {msg}"),
            Self::Sqlite(msg) => write!(f, "SQLite error: {msg}"),
            Self::UnsupportedInput(msg) => write!(f, "unsupported input: {msg}"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<csv::Error> for LoadError {
    fn from(e: csv::Error) -> Self {
        Self::Csv(e.to_string())
    }
}

impl From<rusqlite::Error> for LoadError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Sqlite(e.to_string())
    }
}
