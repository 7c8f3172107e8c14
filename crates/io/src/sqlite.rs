// SQLite dataset loading and schema inspection

use std::path::Path;

use log::debug;
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection, OpenFlags};
use tabex_engine::value::{ResultSet, Row, Value};

use crate::dataset::{unique_column_names, TableSchema};
use crate::error::LoadError;

/// Open a database read-only. A missing file is an IO error rather than a
/// freshly created empty database.
fn open(path: &Path) -> Result<Connection, LoadError> {
    if !path.exists() {
        return Err(LoadError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        });
    }
    Ok(Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?)
}

/// Run one query and collect every row. Columns come from the statement.
pub fn load_sqlite(path: &Path, sql: &str) -> Result<ResultSet, LoadError> {
    run_query(&open(path)?, sql)
}

/// Load `result_set` into an in-memory database as table `table` and run
/// `sql` against it. Columns are untyped, so every value keeps the storage
/// class it was loaded with.
pub fn query_result_set(result_set: &ResultSet, table: &str, sql: &str) -> Result<ResultSet, LoadError> {
    let columns = result_set.columns();
    if columns.is_empty() {
        return Err(LoadError::UnsupportedInput(format!("table '{table}' has no columns to query")));
    }

    let mut conn = Connection::open_in_memory()?;
    let column_list = columns.iter().map(|c| quote_ident(c)).collect::<Vec<_>>().join(", ");
    conn.execute(&format!("CREATE TABLE {} ({column_list})", quote_ident(table)), [])?;

    let tx = conn.transaction()?;
    {
        let placeholders = vec!["?"; columns.len()].join(", ");
        let mut insert = tx.prepare(&format!("INSERT INTO {} VALUES ({placeholders})", quote_ident(table)))?;
        for row in result_set.rows() {
            insert.execute(params_from_iter(columns.iter().map(|c| to_sql_value(row.value(c)))))?;
        }
    }
    tx.commit()?;
    debug!("loaded {} rows into in-memory table '{table}'", result_set.len());

    run_query(&conn, sql)
}

/// `"name"` with embedded quotes doubled.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn run_query(conn: &Connection, sql: &str) -> Result<ResultSet, LoadError> {
    let mut stmt = conn.prepare(sql)?;
    let columns = unique_column_names(stmt.column_names().into_iter());

    let mut rows = Vec::new();
    let mut cursor = stmt.query([])?;
    while let Some(sql_row) = cursor.next()? {
        let mut row = Row::with_capacity(columns.len());
        for (i, name) in columns.iter().enumerate() {
            row.insert(name.as_str(), to_value(sql_row.get_ref(i)?));
        }
        rows.push(row);
    }
    debug!("query returned {} rows x {} columns", rows.len(), columns.len());
    Ok(ResultSet::new(columns, rows))
}

fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Int(i) => SqlValue::Integer(*i),
        Value::Float(f) => SqlValue::Real(*f),
        Value::Text(s) => SqlValue::Text(s.clone()),
    }
}

fn to_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int(i),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Text(bytes.iter().map(|b| format!("{b:02x}")).collect()),
    }
}

/// User tables in creation order with their column names. SQLite's own
/// bookkeeping tables are left out.
pub fn sqlite_schema(path: &Path) -> Result<Vec<TableSchema>, LoadError> {
    let conn = open(path)?;
    let mut tables_stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY rowid",
    )?;
    let names = tables_stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    let mut columns_stmt = conn.prepare("SELECT name FROM pragma_table_info(?1) ORDER BY cid")?;
    let mut tables = Vec::with_capacity(names.len());
    for name in names {
        let columns = columns_stmt
            .query_map([&name], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        tables.push(TableSchema { name, columns });
    }
    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn fixture(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("sales.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE sales (id INTEGER PRIMARY KEY AUTOINCREMENT, quarter TEXT, amount REAL, tag BLOB);
             INSERT INTO sales (quarter, amount, tag) VALUES ('Q1', 100.5, x'0aff');
             INSERT INTO sales (quarter, amount, tag) VALUES ('Q2', NULL, NULL);
             CREATE TABLE regions (code TEXT, name TEXT);",
        )
        .unwrap();
        path
    }

    #[test]
    fn loads_typed_rows() {
        let dir = tempdir().unwrap();
        let path = fixture(dir.path());
        let rs = load_sqlite(&path, "SELECT id, quarter, amount, tag FROM sales ORDER BY id").unwrap();
        assert_eq!(rs.columns(), ["id", "quarter", "amount", "tag"]);
        assert_eq!(rs.len(), 2);
        let first = &rs.rows()[0];
        assert_eq!(first.value("id"), &Value::Int(1));
        assert_eq!(first.value("quarter"), &Value::from("Q1"));
        assert_eq!(first.value("amount"), &Value::Float(100.5));
        assert_eq!(first.value("tag"), &Value::from("0aff"));
        assert_eq!(rs.rows()[1].value("amount"), &Value::Null);
    }

    #[test]
    fn duplicate_result_columns_are_renamed() {
        let dir = tempdir().unwrap();
        let path = fixture(dir.path());
        let rs = load_sqlite(&path, "SELECT quarter, quarter FROM sales").unwrap();
        assert_eq!(rs.columns(), ["quarter", "quarter.1"]);
    }

    #[test]
    fn empty_result_keeps_columns() {
        let dir = tempdir().unwrap();
        let path = fixture(dir.path());
        let rs = load_sqlite(&path, "SELECT * FROM regions").unwrap();
        assert!(rs.is_empty());
        assert_eq!(rs.columns(), ["code", "name"]);
    }

    #[test]
    fn bad_sql_is_sqlite_error() {
        let dir = tempdir().unwrap();
        let path = fixture(dir.path());
        let err = load_sqlite(&path, "SELECT * FROM nope").unwrap_err();
        assert!(matches!(err, LoadError::Sqlite(_)));
    }

    #[test]
    fn writes_are_rejected() {
        let dir = tempdir().unwrap();
        let path = fixture(dir.path());
        assert!(load_sqlite(&path, "DELETE FROM sales").is_err());
        let rs = load_sqlite(&path, "SELECT * FROM sales").unwrap();
        assert_eq!(rs.len(), 2);
    }

    #[test]
    fn schema_lists_user_tables() {
        let dir = tempdir().unwrap();
        let path = fixture(dir.path());
        let schema = sqlite_schema(&path).unwrap();
        let names: Vec<&str> = schema.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["sales", "regions"]);
        assert_eq!(schema[0].columns, vec!["id", "quarter", "amount", "tag"]);
    }

    #[test]
    fn queries_an_in_memory_table() {
        let names: Vec<String> = vec!["cat".into(), "amt".into(), "ok".into()];
        let rows = vec![
            vec![Value::from("A"), Value::from(7), Value::from(true)],
            vec![Value::from("B"), Value::from(5), Value::from(false)],
            vec![Value::from("A"), Value::from(6.5), Value::Null],
        ]
        .into_iter()
        .map(|values| names.iter().cloned().zip(values).collect())
        .collect();
        let rs = ResultSet::new(names, rows);

        let out = query_result_set(&rs, "data", "SELECT cat, amt FROM data WHERE amt > 6 ORDER BY amt").unwrap();
        assert_eq!(out.columns(), ["cat", "amt"]);
        assert_eq!(out.len(), 2);
        assert_eq!(out.rows()[0].value("amt"), &Value::Float(6.5));
        assert_eq!(out.rows()[1].value("amt"), &Value::Int(7));

        let flags = query_result_set(&rs, "data", "SELECT ok FROM data").unwrap();
        assert_eq!(flags.rows()[0].value("ok"), &Value::Int(1));
        assert_eq!(flags.rows()[2].value("ok"), &Value::Null);
    }

    #[test]
    fn in_memory_table_quotes_odd_names() {
        let rs = ResultSet::new(vec!["my \"col\"".into()], vec![[("my \"col\"", Value::from(1))].into_iter().collect()]);
        let out = query_result_set(&rs, "data", "SELECT * FROM data").unwrap();
        assert_eq!(out.columns(), ["my \"col\""]);
        assert!(matches!(
            query_result_set(&ResultSet::default(), "data", "SELECT 1"),
            Err(LoadError::UnsupportedInput(_))
        ));
    }

    #[test]
    fn missing_database_is_io_error() {
        let dir = tempdir().unwrap();
        let err = load_sqlite(&dir.path().join("absent.db"), "SELECT 1").unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
        assert!(!dir.path().join("absent.db").exists());
    }
}
