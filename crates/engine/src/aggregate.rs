//! Analytical views derived from a result set.
//!
//! Each view returns a [`Table`] or `None` when the columns it needs are not
//! present; callers skip the sheet in that case.

use std::collections::HashMap;

use log::debug;

use crate::classify::{classify_numeric_columns, find_column_by_name_pattern};
use crate::grid::{Cell, Table, TOTAL_LABEL};
use crate::stats::{compute_stats, numeric_values, sum_lenient};
use crate::value::{try_parse_numeric, ResultSet, Row, Value, ValueKey};

pub const CATEGORY_PATTERNS: &[&str] = &["category", "type", "group"];
pub const PERIOD_PATTERNS: &[&str] = &["date", "period", "quarter"];
pub const AMOUNT_PATTERNS: &[&str] = &["amount", "value", "total", "sum", "revenue", "expense"];
pub const TYPE_PATTERNS: &[&str] = &["type", "category", "segment", "class"];

/// Distinct values of `column` in first-seen order, with the row indices
/// that carry each one.
fn group_rows<'a>(rows: &'a [Row], column: &str) -> Vec<(&'a Value, Vec<usize>)> {
    let mut index: HashMap<ValueKey, usize> = HashMap::new();
    let mut groups: Vec<(&Value, Vec<usize>)> = Vec::new();
    for (i, row) in rows.iter().enumerate() {
        let value = row.value(column);
        let slot = *index.entry(value.key()).or_insert_with(|| {
            groups.push((value, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(i);
    }
    groups
}

/// Unique values of `column`, first-seen order.
pub fn unique_values<'a>(rows: &'a [Row], column: &str) -> Vec<&'a Value> {
    group_rows(rows, column).into_iter().map(|(v, _)| v).collect()
}

/// One row per numeric column with at least one valid value:
/// `[Column, Count, Min, Max, Sum, Average, Std Dev]`. With no such column
/// the table is header-only.
pub fn statistical_summary(result_set: &ResultSet) -> Table {
    let numeric = classify_numeric_columns(result_set);
    let mut rows = Vec::new();
    for col in &numeric {
        let Some(stats) = compute_stats(&numeric_values(result_set.rows(), col)) else {
            debug!("statistical summary: no valid values in '{col}'");
            continue;
        };
        rows.push(vec![
            Cell::text(col.as_str()),
            Cell::from(stats.count),
            Cell::from(stats.min),
            Cell::from(stats.max),
            Cell::from(stats.sum),
            Cell::from(stats.average),
            Cell::from(stats.std_dev),
        ]);
    }
    let header = ["Column", "Count", "Min", "Max", "Sum", "Average", "Std Dev"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    Table { header, rows }
}

/// Counts, sums and averages of every numeric column per category value.
///
/// Sums count missing values as 0; averages use only valid numeric values
/// and are 0 when a group has none.
pub fn category_grouping(result_set: &ResultSet) -> Option<Table> {
    let Some(category) = find_column_by_name_pattern(result_set.columns(), CATEGORY_PATTERNS) else {
        debug!("category analysis skipped: no category column");
        return None;
    };
    let numeric = classify_numeric_columns(result_set);
    debug!("category analysis on '{category}' over {numeric:?}");

    let mut header = vec!["Category".to_string(), "Count".to_string()];
    header.extend(numeric.iter().map(|c| format!("Sum of {c}")));
    header.extend(numeric.iter().map(|c| format!("Average {c}")));

    let all = result_set.rows();
    let rows = group_rows(all, category)
        .into_iter()
        .map(|(value, members)| {
            let group: Vec<&Row> = members.iter().map(|&i| &all[i]).collect();
            let mut cells = vec![Cell::from(value), Cell::from(group.len())];
            for col in &numeric {
                cells.push(Cell::Number(sum_lenient(group.iter().copied(), col)));
            }
            for col in &numeric {
                let valid = numeric_values(group.iter().copied(), col);
                let avg = if valid.is_empty() {
                    0.0
                } else {
                    valid.iter().sum::<f64>() / valid.len() as f64
                };
                cells.push(Cell::Number(avg));
            }
            cells
        })
        .collect();

    Some(Table { header, rows })
}

/// Amounts pivoted by period (rows) and type (columns), with a trailing
/// `Total` column and a final `Total` row.
pub fn quarterly_report(result_set: &ResultSet) -> Option<Table> {
    let columns = result_set.columns();
    let period = find_column_by_name_pattern(columns, PERIOD_PATTERNS);
    let amount = find_column_by_name_pattern(columns, AMOUNT_PATTERNS);
    let kind = find_column_by_name_pattern(columns, TYPE_PATTERNS);
    let (Some(period), Some(amount), Some(kind)) = (period, amount, kind) else {
        debug!(
            "quarterly report skipped: period={period:?} amount={amount:?} type={kind:?}"
        );
        return None;
    };

    let rows = result_set.rows();
    let types = unique_values(rows, kind);
    let type_slot: HashMap<ValueKey, usize> =
        types.iter().enumerate().map(|(i, v)| (v.key(), i)).collect();

    let mut header = vec!["Period".to_string()];
    header.extend(types.iter().map(|v| v.to_string()));
    header.push(TOTAL_LABEL.to_string());

    let mut type_totals = vec![0.0; types.len()];
    let mut table_rows = Vec::new();
    for (value, members) in group_rows(rows, period) {
        let mut sums = vec![0.0; types.len()];
        for &i in &members {
            let row = &rows[i];
            let amt = try_parse_numeric(row.value(amount)).unwrap_or(0.0);
            if let Some(&slot) = type_slot.get(&row.value(kind).key()) {
                sums[slot] += amt;
            }
        }
        let row_total: f64 = sums.iter().sum();
        for (total, s) in type_totals.iter_mut().zip(&sums) {
            *total += s;
        }
        let mut cells = vec![Cell::from(value)];
        cells.extend(sums.into_iter().map(Cell::Number));
        cells.push(Cell::Number(row_total));
        table_rows.push(cells);
    }

    let grand_total: f64 = type_totals.iter().sum();
    let mut total_row = vec![Cell::text(TOTAL_LABEL)];
    total_row.extend(type_totals.into_iter().map(Cell::Number));
    total_row.push(Cell::Number(grand_total));
    table_rows.push(total_row);

    Some(Table { header, rows: table_rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rs(columns: &[&str], rows: Vec<Vec<Value>>) -> ResultSet {
        let names: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
        let rows = rows
            .into_iter()
            .map(|values| names.iter().cloned().zip(values).collect())
            .collect();
        ResultSet::new(names, rows)
    }

    fn nums(cells: &[Cell]) -> Vec<Option<f64>> {
        cells.iter().map(Cell::as_number).collect()
    }

    #[test]
    fn category_grouping_example() {
        let set = rs(
            &["category", "amt"],
            vec![
                vec!["A".into(), 10.into()],
                vec!["B".into(), 5.into()],
                vec!["A".into(), 3.into()],
            ],
        );
        let table = category_grouping(&set).unwrap();
        assert_eq!(table.header, vec!["Category", "Count", "Sum of amt", "Average amt"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][0], Cell::text("A"));
        assert_eq!(nums(&table.rows[0][1..]), vec![Some(2.0), Some(13.0), Some(6.5)]);
        assert_eq!(table.rows[1][0], Cell::text("B"));
        assert_eq!(nums(&table.rows[1][1..]), vec![Some(1.0), Some(5.0), Some(5.0)]);
    }

    #[test]
    fn group_average_ignores_invalid_values_but_sum_counts_them_as_zero() {
        let set = rs(
            &["group", "v"],
            vec![
                vec!["g".into(), 4.into()],
                vec!["g".into(), "n/a".into()],
                vec!["h".into(), Value::Null],
            ],
        );
        let table = category_grouping(&set).unwrap();
        assert_eq!(nums(&table.rows[0][1..]), vec![Some(2.0), Some(4.0), Some(4.0)]);
        assert_eq!(nums(&table.rows[1][1..]), vec![Some(1.0), Some(0.0), Some(0.0)]);
    }

    #[test]
    fn numeric_group_keys_merge_across_int_and_float() {
        let set = rs(
            &["type", "x"],
            vec![vec![1.into(), "a".into()], vec![1.0.into(), "b".into()], vec!["1".into(), "c".into()]],
        );
        let table = category_grouping(&set).unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][0], Cell::Number(1.0));
        assert_eq!(table.rows[0][1], Cell::Number(2.0));
    }

    #[test]
    fn no_category_column_no_table() {
        let set = rs(&["name", "qty"], vec![vec!["a".into(), 1.into()]]);
        assert!(category_grouping(&set).is_none());
    }

    #[test]
    fn quarterly_report_example() {
        let set = rs(
            &["quarter", "type", "amount"],
            vec![
                vec!["Q1".into(), "rev".into(), 100.into()],
                vec!["Q1".into(), "exp".into(), 40.into()],
                vec!["Q2".into(), "rev".into(), 80.into()],
            ],
        );
        let table = quarterly_report(&set).unwrap();
        assert_eq!(table.header, vec!["Period", "rev", "exp", "Total"]);
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[0][0], Cell::text("Q1"));
        assert_eq!(nums(&table.rows[0][1..]), vec![Some(100.0), Some(40.0), Some(140.0)]);
        assert_eq!(table.rows[1][0], Cell::text("Q2"));
        assert_eq!(nums(&table.rows[1][1..]), vec![Some(80.0), Some(0.0), Some(80.0)]);
        assert_eq!(table.rows[2][0], Cell::text("Total"));
        assert_eq!(nums(&table.rows[2][1..]), vec![Some(180.0), Some(40.0), Some(220.0)]);
    }

    #[test]
    fn quarterly_report_needs_all_three_columns() {
        let set = rs(&["quarter", "amount"], vec![vec!["Q1".into(), 1.into()]]);
        assert!(quarterly_report(&set).is_none());
    }

    #[test]
    fn quarterly_unparsable_amounts_count_as_zero() {
        let set = rs(
            &["period", "class", "revenue"],
            vec![vec!["P1".into(), "x".into(), "bad".into()], vec!["P1".into(), "x".into(), "2.5".into()]],
        );
        let table = quarterly_report(&set).unwrap();
        assert_eq!(nums(&table.rows[0][1..]), vec![Some(2.5), Some(2.5)]);
    }

    #[test]
    fn summary_skips_columns_without_values() {
        let set = rs(
            &["name", "score"],
            vec![vec!["a".into(), 2.into()], vec!["b".into(), 4.into()]],
        );
        let table = statistical_summary(&set);
        assert_eq!(table.header.len(), 7);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0][0], Cell::text("score"));
        assert_eq!(
            nums(&table.rows[0][1..]),
            vec![Some(2.0), Some(2.0), Some(4.0), Some(6.0), Some(3.0), Some(1.0)]
        );

        let text_only = rs(&["name"], vec![vec!["a".into()]]);
        let empty = statistical_summary(&text_only);
        assert_eq!(empty.header[0], "Column");
        assert!(empty.rows.is_empty());
    }

    #[test]
    fn unique_values_first_seen() {
        let set = rs(&["k"], vec![vec!["b".into()], vec!["a".into()], vec!["b".into()], vec![Value::Null]]);
        let uniq: Vec<String> = unique_values(set.rows(), "k").iter().map(|v| v.to_string()).collect();
        assert_eq!(uniq, vec!["b", "a", ""]);
    }
}
