use log::debug;

use crate::value::{try_parse_numeric, Row};

/// Descriptive statistics over one numeric column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub sum: f64,
    pub average: f64,
    /// Population standard deviation (divides by N).
    pub std_dev: f64,
}

/// Statistics over `values`, ignoring non-finite entries.
///
/// Returns `None` when no finite value remains, so callers skip the column
/// instead of emitting a row of NaNs.
pub fn compute_stats(values: &[f64]) -> Option<Stats> {
    let valid: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if valid.is_empty() {
        debug!("no valid numeric values to calculate stats");
        return None;
    }

    let count = valid.len();
    let mut sum = 0.0;
    let mut min = valid[0];
    let mut max = valid[0];
    for &v in &valid {
        sum += v;
        min = min.min(v);
        max = max.max(v);
    }
    let average = sum / count as f64;
    let variance = valid.iter().map(|v| (v - average).powi(2)).sum::<f64>() / count as f64;

    Some(Stats { count, min, max, sum, average, std_dev: variance.sqrt() })
}

/// Numeric readings of `column`, skipping values that are not numeric.
pub fn numeric_values<'a, I>(rows: I, column: &str) -> Vec<f64>
where
    I: IntoIterator<Item = &'a Row>,
{
    rows.into_iter()
        .filter_map(|row| try_parse_numeric(row.value(column)))
        .collect()
}

/// Sum of `column` where missing or unparsable values count as 0.
///
/// This is deliberately looser than [`compute_stats`]: a sum always
/// completes on sparse data.
pub fn sum_lenient<'a, I>(rows: I, column: &str) -> f64
where
    I: IntoIterator<Item = &'a Row>,
{
    rows.into_iter()
        .map(|row| try_parse_numeric(row.value(column)).unwrap_or(0.0))
        .sum()
}
