use std::io;
use std::path::{Path, PathBuf};

use tabex_engine::OptionValue;
use unicode_width::UnicodeWidthStr;

use crate::CliError;

/// Display width of a string, accounting for CJK double-width, emoji, etc.
pub(crate) fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Truncate to `width` display columns, ending in ".." when cut.
pub(crate) fn truncate_display(s: &str, width: usize) -> String {
    if display_width(s) <= width {
        return s.to_string();
    }
    let budget = width.saturating_sub(2);
    let mut used = 0;
    let mut out = String::new();
    for ch in s.chars() {
        let cw = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + cw > budget {
            break;
        }
        used += cw;
        out.push(ch);
    }
    if width >= 2 {
        out.push_str("..");
    }
    out
}

/// Pad or truncate to exactly `width` display columns.
pub(crate) fn pad_right(s: &str, width: usize) -> String {
    let sw = display_width(s);
    if sw > width {
        truncate_display(s, width)
    } else {
        format!("{}{}", s, " ".repeat(width - sw))
    }
}

/// Parse one `--set key=value` pair. The value is typed loosely:
/// `true`/`false`, then numbers, then text.
pub(crate) fn parse_set(pair: &str) -> Result<(String, OptionValue), CliError> {
    let (key, value) = pair.split_once('=').ok_or_else(|| {
        CliError::args(format!("invalid --set '{pair}'")).with_hint("use --set key=value, e.g. --set delimiter=';'")
    })?;
    let key = key.trim();
    if key.is_empty() {
        return Err(CliError::args(format!("invalid --set '{pair}': empty key")));
    }
    Ok((key.to_string(), OptionValue::parse_loose(value)))
}

/// Write `bytes` to `path` atomically: a sibling temp file is written, then
/// renamed over the target. The temp file is removed on failure.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let tmp = temp_path(path);
    if let Err(e) = std::fs::write(&tmp, bytes).and_then(|_| std::fs::rename(&tmp, path)) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_and_pad() {
        assert_eq!(truncate_display("abcdef", 5), "abc..");
        assert_eq!(truncate_display("abc", 5), "abc");
        assert_eq!(pad_right("ab", 5), "ab   ");
        assert_eq!(pad_right("abcdef", 5), "abc..");
        // "世界" is 4 display columns
        assert_eq!(display_width("\u{4e16}\u{754c}"), 4);
        assert_eq!(truncate_display("\u{4e16}\u{754c}\u{4f60}\u{597d}", 6), "\u{4e16}\u{754c}..");
    }

    #[test]
    fn set_pairs() {
        assert_eq!(parse_set("pretty=false").unwrap(), ("pretty".into(), OptionValue::Bool(false)));
        assert_eq!(parse_set("indentSize=4").unwrap(), ("indentSize".into(), OptionValue::Number(4.0)));
        assert_eq!(parse_set("titleText=a=b").unwrap(), ("titleText".into(), OptionValue::Text("a=b".into())));
        assert_eq!(parse_set("delimiter=").unwrap(), ("delimiter".into(), OptionValue::Text(String::new())));
        assert!(parse_set("novalue").is_err());
        assert!(parse_set("=x").is_err());
    }

    #[test]
    fn atomic_write_replaces_target() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        std::fs::write(&path, "old").unwrap();
        write_atomic(&path, b"new").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"new");
        assert!(!dir.path().join("out.csv.tmp").exists());
    }

    #[test]
    fn atomic_write_into_missing_dir_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.csv");
        assert!(write_atomic(&path, b"x").is_err());
        assert!(!path.exists());
    }
}
