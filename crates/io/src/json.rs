// JSON export: `{generated, count, data}` envelope

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use tabex_engine::error::ExportError;
use tabex_engine::options::ExportConfig;
use tabex_engine::value::{ResultSet, Row};

/// Indentation is clamped to this many spaces.
pub const MAX_INDENT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JsonOptions {
    pub pretty: bool,
    pub indent_size: usize,
}

impl Default for JsonOptions {
    fn default() -> Self {
        Self { pretty: true, indent_size: 2 }
    }
}

impl JsonOptions {
    pub fn from_config(config: &ExportConfig) -> Self {
        let defaults = Self::default();
        let indent = config.number_or("indentSize", defaults.indent_size as f64);
        Self {
            pretty: config.bool_or("pretty", defaults.pretty),
            indent_size: indent.max(0.0).min(MAX_INDENT as f64) as usize,
        }
    }
}

#[derive(Serialize)]
struct Envelope<'a> {
    generated: String,
    count: usize,
    data: &'a [Row],
}

/// ISO-8601 UTC with millisecond precision and a `Z` suffix.
pub fn timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Serialize `result_set` rows unmodified inside the envelope. Pretty output
/// with an indent of 0 is compact.
pub fn encode_json(
    result_set: &ResultSet,
    options: &JsonOptions,
    now: DateTime<Utc>,
) -> Result<Vec<u8>, ExportError> {
    let envelope = Envelope {
        generated: timestamp(now),
        count: result_set.len(),
        data: result_set.rows(),
    };

    if !options.pretty || options.indent_size == 0 {
        return serde_json::to_vec(&envelope).map_err(|e| ExportError::Encode(e.to_string()));
    }

    let indent = vec![b' '; options.indent_size];
    let mut out = Vec::new();
    let mut ser = Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(&indent));
    envelope
        .serialize(&mut ser)
        .map_err(|e| ExportError::Encode(e.to_string()))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::Value as Json;
    use tabex_engine::value::Value;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, 10, 30, 0).unwrap()
    }

    fn one_row() -> ResultSet {
        let row: Row = [("a", Value::from(1))].into_iter().collect();
        ResultSet::from_rows(vec![row])
    }

    #[test]
    fn envelope_shape() {
        let bytes = encode_json(&one_row(), &JsonOptions::default(), now()).unwrap();
        let json: Json = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["count"], 1);
        assert_eq!(json["data"], serde_json::json!([{ "a": 1 }]));
        assert_eq!(json["generated"], "2024-03-05T10:30:00.000Z");
        let parsed = DateTime::parse_from_rfc3339(json["generated"].as_str().unwrap()).unwrap();
        assert_eq!(parsed, now());
    }

    #[test]
    fn pretty_uses_indent_size() {
        let options = JsonOptions { pretty: true, indent_size: 4 };
        let text = String::from_utf8(encode_json(&one_row(), &options, now()).unwrap()).unwrap();
        assert!(text.contains("\n    \"generated\""));
        assert!(text.contains("\n        {"));
    }

    #[test]
    fn compact_has_no_whitespace() {
        let options = JsonOptions { pretty: false, indent_size: 2 };
        let text = String::from_utf8(encode_json(&one_row(), &options, now()).unwrap()).unwrap();
        assert_eq!(text, r#"{"generated":"2024-03-05T10:30:00.000Z","count":1,"data":[{"a":1}]}"#);
    }

    #[test]
    fn empty_result_set() {
        let rs = ResultSet::new(vec!["a".into()], vec![]);
        let bytes = encode_json(&rs, &JsonOptions::default(), now()).unwrap();
        let json: Json = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["count"], 0);
        assert_eq!(json["data"], serde_json::json!([]));
    }

    #[test]
    fn row_key_order_is_kept() {
        let row: Row = [("z", Value::from(1)), ("a", Value::Null), ("m", Value::from("x"))]
            .into_iter()
            .collect();
        let rs = ResultSet::from_rows(vec![row]);
        let options = JsonOptions { pretty: false, ..JsonOptions::default() };
        let text = String::from_utf8(encode_json(&rs, &options, now()).unwrap()).unwrap();
        assert!(text.ends_with(r#""data":[{"z":1,"a":null,"m":"x"}]}"#));
    }
}
