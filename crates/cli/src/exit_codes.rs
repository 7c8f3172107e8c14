//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                                      |
//! |------|--------------------------------------------------------------|
//! | 0    | Success                                                      |
//! | 2    | Usage error (bad arguments, unsupported input, no template)  |
//! | 3    | IO error (dataset unreadable, output not writable)           |
//! | 4    | Dataset parse or query error                                 |
//! | 5    | Export failure (unknown template or format, encoder failure) |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use tabex_engine::ExportError;
use tabex_io::LoadError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// IO error - a file could not be read or written.
pub const EXIT_IO: u8 = 3;

/// Dataset could not be parsed, or its query failed.
pub const EXIT_PARSE: u8 = 4;

/// Export failed: template not found, unsupported format, or encoder error.
pub const EXIT_EXPORT: u8 = 5;

/// Map a dataset loading error to its exit code.
pub fn load_exit_code(err: &LoadError) -> u8 {
    match err {
        LoadError::Io { .. } => EXIT_IO,
        LoadError::Csv(_) | LoadError::Sqlite(_) => EXIT_PARSE,
        LoadError::UnsupportedInput(_) => EXIT_USAGE,
    }
}

/// Map an export error to its exit code.
pub fn export_exit_code(err: &ExportError) -> u8 {
    match err {
        ExportError::TemplateNotFound(_)
        | ExportError::UnsupportedFormat(_)
        | ExportError::Encode(_) => EXIT_EXPORT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct() {
        let codes = [EXIT_SUCCESS, EXIT_USAGE, EXIT_IO, EXIT_PARSE, EXIT_EXPORT];
        for (i, a) in codes.iter().enumerate() {
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn load_errors_map_by_kind() {
        let io = LoadError::Io {
            path: "x.csv".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(load_exit_code(&io), EXIT_IO);
        assert_eq!(load_exit_code(&LoadError::Sqlite("no such table".into())), EXIT_PARSE);
        assert_eq!(load_exit_code(&LoadError::UnsupportedInput("x.pdf".into())), EXIT_USAGE);
    }

    #[test]
    fn export_errors_are_export_failures() {
        assert_eq!(export_exit_code(&ExportError::TemplateNotFound("x".into())), EXIT_EXPORT);
        assert_eq!(export_exit_code(&ExportError::Encode("boom".into())), EXIT_EXPORT);
    }
}
