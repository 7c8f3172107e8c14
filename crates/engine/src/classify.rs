use crate::value::{try_parse_numeric, ResultSet};

/// Rows inspected per column when deciding whether it is numeric.
pub const NUMERIC_SAMPLE_ROWS: usize = 10;

/// Columns judged numeric, in column order.
///
/// Only the first [`NUMERIC_SAMPLE_ROWS`] rows are inspected. A column is
/// numeric when any sampled value is a native number or a string with a
/// non-blank, finite numeric reading. A column whose numbers only appear
/// later in the set is classified as non-numeric.
pub fn classify_numeric_columns(result_set: &ResultSet) -> Vec<String> {
    let columns = result_set.columns();
    let rows = result_set.rows();
    if rows.is_empty() || columns.is_empty() {
        return Vec::new();
    }

    let sample = &rows[..rows.len().min(NUMERIC_SAMPLE_ROWS)];
    columns
        .iter()
        .filter(|col| {
            sample
                .iter()
                .any(|row| try_parse_numeric(row.value(col)).is_some())
        })
        .cloned()
        .collect()
}

/// First column whose lowercased name contains one of `patterns`.
///
/// Patterns are tried in order; for each pattern columns are scanned in
/// order, so an earlier pattern always beats an earlier column.
pub fn find_column_by_name_pattern<'a>(columns: &'a [String], patterns: &[&str]) -> Option<&'a str> {
    let lowered: Vec<String> = columns.iter().map(|c| c.to_lowercase()).collect();
    for pattern in patterns {
        let pattern = pattern.to_lowercase();
        if let Some(idx) = lowered.iter().position(|c| c.contains(&pattern)) {
            return Some(columns[idx].as_str());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Row, Value};

    fn rs(columns: &[&str], rows: Vec<Row>) -> ResultSet {
        ResultSet::new(columns.iter().map(|c| c.to_string()).collect(), rows)
    }

    #[test]
    fn detects_native_and_string_numbers() {
        let rows = vec![
            [("name", Value::from("a")), ("qty", 3.into()), ("price", "9.99".into())]
                .into_iter()
                .collect(),
            [("name", Value::from("b")), ("qty", 4.into()), ("price", "n/a".into())]
                .into_iter()
                .collect(),
        ];
        let set = rs(&["name", "qty", "price"], rows);
        assert_eq!(classify_numeric_columns(&set), vec!["qty", "price"]);
    }

    #[test]
    fn blank_strings_are_not_numeric() {
        let rows = vec![[("x", Value::from("   "))].into_iter().collect()];
        assert!(classify_numeric_columns(&rs(&["x"], rows)).is_empty());
    }

    #[test]
    fn numbers_after_sample_window_are_missed() {
        let mut rows: Vec<Row> = (0..10).map(|_| [("late", Value::Null)].into_iter().collect()).collect();
        rows.push([("late", Value::from("42"))].into_iter().collect());
        let set = rs(&["late"], rows);
        assert!(classify_numeric_columns(&set).is_empty());
    }

    #[test]
    fn empty_inputs_yield_nothing() {
        assert!(classify_numeric_columns(&rs(&["a"], vec![])).is_empty());
        let rows = vec![[("a", 1)].into_iter().collect()];
        assert!(classify_numeric_columns(&rs(&[], rows)).is_empty());
    }

    #[test]
    fn pattern_order_beats_column_order() {
        let cols: Vec<String> = ["Total_Type", "Sale Date"].iter().map(|s| s.to_string()).collect();
        assert_eq!(find_column_by_name_pattern(&cols, &["date", "type"]), Some("Sale Date"));
        assert_eq!(find_column_by_name_pattern(&cols, &["TYPE"]), Some("Total_Type"));
        assert_eq!(find_column_by_name_pattern(&cols, &["segment"]), None);
    }
}
