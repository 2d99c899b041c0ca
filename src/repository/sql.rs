//! SQL Helpers
//!
//! Insert and update statements built from a serde-serialized payload, so the
//! column list always matches the struct the backend receives over HTTP.

use rusqlite::types::{Type, Value};
use rusqlite::{params_from_iter, Connection, Row};
use serde::Serialize;
use serde_json::Map;
use uuid::Uuid;

use crate::domain::{DomainError, DomainResult};

fn check_identifier(name: &str) -> DomainResult<()> {
    if !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(DomainError::Backend(format!("invalid column name: {}", name)))
    }
}

fn to_sql(value: serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Integer(b as i64),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => Value::Real(n.as_f64().unwrap_or_default()),
        },
        serde_json::Value::String(s) => Value::Text(s),
        other => Value::Text(other.to_string()),
    }
}

/// Serialize a payload into its column map
pub fn columns<T: Serialize>(payload: &T) -> DomainResult<Map<String, serde_json::Value>> {
    match serde_json::to_value(payload)? {
        serde_json::Value::Object(map) => Ok(map),
        _ => Err(DomainError::Backend("payload is not an object".into())),
    }
}

/// `INSERT INTO table (...) VALUES (...)` from a column map
pub fn insert(conn: &Connection, table: &str, values: Map<String, serde_json::Value>) -> DomainResult<()> {
    let mut names = Vec::with_capacity(values.len());
    let mut params = Vec::with_capacity(values.len());
    for (name, value) in values {
        check_identifier(&name)?;
        names.push(name);
        params.push(to_sql(value));
    }

    let placeholders: Vec<String> = (1..=names.len()).map(|i| format!("?{}", i)).collect();
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        names.join(", "),
        placeholders.join(", ")
    );
    conn.execute(&sql, params_from_iter(params))?;
    Ok(())
}

/// `UPDATE table SET ... WHERE id = ?`; returns the number of rows touched
pub fn update_by_id(
    conn: &Connection,
    table: &str,
    id: Uuid,
    values: Map<String, serde_json::Value>,
) -> DomainResult<usize> {
    if values.is_empty() {
        return Ok(0);
    }

    let mut assignments = Vec::with_capacity(values.len());
    let mut params = Vec::with_capacity(values.len() + 1);
    for (i, (name, value)) in values.into_iter().enumerate() {
        check_identifier(&name)?;
        assignments.push(format!("{} = ?{}", name, i + 1));
        params.push(to_sql(value));
    }
    params.push(Value::Text(id.to_string()));

    let sql = format!(
        "UPDATE {} SET {} WHERE id = ?{}",
        table,
        assignments.join(", "),
        params.len()
    );
    Ok(conn.execute(&sql, params_from_iter(params))?)
}

// ========================
// Row Accessors
// ========================

fn parse_uuid(idx: &str, text: &str) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(text).map_err(|e| {
        log::warn!("bad uuid in column {}: {}", idx, text);
        rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e))
    })
}

/// Read a TEXT uuid column
pub fn get_uuid(row: &Row<'_>, column: &str) -> rusqlite::Result<Uuid> {
    let text: String = row.get(column)?;
    parse_uuid(column, &text)
}

/// Read a nullable TEXT uuid column
pub fn get_opt_uuid(row: &Row<'_>, column: &str) -> rusqlite::Result<Option<Uuid>> {
    let text: Option<String> = row.get(column)?;
    text.map(|t| parse_uuid(column, &t)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (id TEXT PRIMARY KEY, name TEXT, n INTEGER, note TEXT)")
            .unwrap();
        conn
    }

    #[test]
    fn test_insert_and_partial_update() {
        let conn = conn();
        let id = Uuid::new_v4();
        let values = json!({ "id": id.to_string(), "name": "a", "n": 3, "note": "keep" });
        insert(&conn, "t", values.as_object().unwrap().clone()).unwrap();

        let changes = json!({ "name": "b", "n": null });
        let touched = update_by_id(&conn, "t", id, changes.as_object().unwrap().clone()).unwrap();
        assert_eq!(touched, 1);

        let (name, n, note): (String, Option<i64>, String) = conn
            .query_row("SELECT name, n, note FROM t WHERE id = ?1", [id.to_string()], |r| {
                Ok((r.get(0)?, r.get(1)?, r.get(2)?))
            })
            .unwrap();
        assert_eq!(name, "b");
        assert_eq!(n, None);
        assert_eq!(note, "keep");
    }

    #[test]
    fn test_rejects_odd_column_names() {
        let conn = conn();
        let values = json!({ "name; DROP TABLE t": "x" });
        let err = insert(&conn, "t", values.as_object().unwrap().clone()).unwrap_err();
        assert!(matches!(err, DomainError::Backend(_)));
    }
}
