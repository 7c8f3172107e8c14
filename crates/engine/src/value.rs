use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};

// ---------------------------------------------------------------------------
// Scalar values
// ---------------------------------------------------------------------------

/// A single cell of a result set.
///
/// `Int` and `Float` are both "native numbers"; they are kept apart so that
/// serialized output reproduces `1` as `1` and not `1.0`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

static NULL: Value = Value::Null;

impl Value {
    /// True for values that serialize as an empty field: null and "".
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Hashable identity used for grouping. `Int(1)` and `Float(1.0)` share a
    /// key; `Text("1")` does not.
    pub fn key(&self) -> ValueKey {
        match self {
            Value::Null => ValueKey::Null,
            Value::Bool(b) => ValueKey::Bool(*b),
            Value::Int(i) => ValueKey::number(*i as f64),
            Value::Float(f) => ValueKey::number(*f),
            Value::Text(s) => ValueKey::Text(s.clone()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(n) => write!(f, "{n}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) if f.is_finite() => serializer.serialize_f64(*f),
            Value::Float(_) => serializer.serialize_unit(),
            Value::Text(s) => serializer.serialize_str(s),
        }
    }
}

/// Grouping identity of a [`Value`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueKey {
    Null,
    Bool(bool),
    /// Bit pattern of the number, with -0.0 folded into 0.0.
    Number(u64),
    Text(String),
}

impl ValueKey {
    fn number(n: f64) -> Self {
        let n = if n == 0.0 { 0.0 } else { n };
        ValueKey::Number(n.to_bits())
    }
}

// ---------------------------------------------------------------------------
// Numeric coercion
// ---------------------------------------------------------------------------

/// The one numeric coercion rule used by classification, statistics and
/// aggregation.
///
/// Native numbers count when finite. Strings count when their leading
/// portion parses as a finite float (`"12abc"` is 12, `" 3.5"` is 3.5).
/// Null, booleans and unparsable strings are not numeric.
pub fn try_parse_numeric(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Int(i) => *i as f64,
        Value::Float(f) => *f,
        Value::Text(s) => parse_float_prefix(s)?,
        Value::Null | Value::Bool(_) => return None,
    };
    n.is_finite().then_some(n)
}

/// Parse the longest decimal literal at the start of `s`, after leading
/// whitespace. Returns `None` when no digits are found.
fn parse_float_prefix(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if frac_end > frac_start {
            digits += frac_end - frac_start;
            end = frac_end;
        }
    }

    if digits == 0 {
        return None;
    }

    // Exponent only counts when it has digits ("1e" parses as 1)
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok()
}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

/// One result row: column name to value, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    fields: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { fields: Vec::with_capacity(capacity) }
    }

    /// Set a field, replacing an existing value in place.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Field value, or `Null` when the row has no such field.
    pub fn value(&self, name: &str) -> &Value {
        self.get(name).unwrap_or(&NULL)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (k, v) in iter {
            row.insert(k, v);
        }
        row
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Result set
// ---------------------------------------------------------------------------

/// Ordered columns plus ordered rows, as produced by one query.
///
/// The export engine only ever reads a result set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl ResultSet {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    /// Build from rows alone; columns are every key in first-seen order.
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for row in &rows {
            for (name, _) in row.iter() {
                if !columns.iter().any(|c| c == name) {
                    columns.push(name.to_string());
                }
            }
        }
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one column, top to bottom (`Null` where a row lacks it).
    pub fn column_values<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.rows.iter().map(move |row| row.value(column))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_numbers_are_numeric() {
        assert_eq!(try_parse_numeric(&Value::Int(3)), Some(3.0));
        assert_eq!(try_parse_numeric(&Value::Float(2.5)), Some(2.5));
        assert_eq!(try_parse_numeric(&Value::Float(f64::NAN)), None);
    }

    #[test]
    fn strings_parse_leading_number() {
        assert_eq!(try_parse_numeric(&"42".into()), Some(42.0));
        assert_eq!(try_parse_numeric(&"  3.5 ".into()), Some(3.5));
        assert_eq!(try_parse_numeric(&"12abc".into()), Some(12.0));
        assert_eq!(try_parse_numeric(&"-.5".into()), Some(-0.5));
        assert_eq!(try_parse_numeric(&"1e3".into()), Some(1000.0));
        assert_eq!(try_parse_numeric(&"1e".into()), Some(1.0));
        assert_eq!(try_parse_numeric(&"2024-03-05".into()), Some(2024.0));
    }

    #[test]
    fn non_numeric_values() {
        assert_eq!(try_parse_numeric(&"abc".into()), None);
        assert_eq!(try_parse_numeric(&"".into()), None);
        assert_eq!(try_parse_numeric(&"   ".into()), None);
        assert_eq!(try_parse_numeric(&".".into()), None);
        assert_eq!(try_parse_numeric(&"-".into()), None);
        assert_eq!(try_parse_numeric(&"Infinity".into()), None);
        assert_eq!(try_parse_numeric(&"1e400".into()), None);
        assert_eq!(try_parse_numeric(&Value::Null), None);
        assert_eq!(try_parse_numeric(&Value::Bool(true)), None);
    }

    #[test]
    fn int_and_float_share_group_key() {
        assert_eq!(Value::Int(1).key(), Value::Float(1.0).key());
        assert_eq!(Value::Float(-0.0).key(), Value::Int(0).key());
        assert_ne!(Value::Int(1).key(), Value::from("1").key());
        assert_ne!(Value::Null.key(), Value::from("").key());
    }

    #[test]
    fn row_insert_replaces_in_place() {
        let mut row: Row = [("a", 1), ("b", 2)].into_iter().collect();
        row.insert("a", "x");
        let keys: Vec<&str> = row.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(row.value("a"), &Value::from("x"));
        assert_eq!(row.value("missing"), &Value::Null);
    }

    #[test]
    fn from_rows_collects_columns_first_seen() {
        let rows = vec![
            [("b", 1)].into_iter().collect::<Row>(),
            [("a", 2), ("b", 3)].into_iter().collect::<Row>(),
        ];
        let rs = ResultSet::from_rows(rows);
        assert_eq!(rs.columns(), &["b".to_string(), "a".to_string()]);
        let a: Vec<&Value> = rs.column_values("a").collect();
        assert_eq!(a, vec![&Value::Null, &Value::Int(2)]);
    }

    #[test]
    fn display_matches_csv_rendering() {
        assert_eq!(Value::Float(6.5).to_string(), "6.5");
        assert_eq!(Value::Float(10.0).to_string(), "10");
        assert_eq!(Value::Int(-3).to_string(), "-3");
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::Bool(false).to_string(), "false");
    }
}
