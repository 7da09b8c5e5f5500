use std::sync::Arc;

use rusqlite::types::Value;
use rusqlite::{Statement, params_from_iter};

use crate::results::ResultSet;
use crate::types::RowValues;

fn sqlite_extract_value(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<RowValues> {
    let value: Value = row.get(idx)?;
    Ok(match value {
        Value::Null => RowValues::Null,
        Value::Integer(i) => RowValues::Int(i),
        Value::Real(f) => RowValues::Float(f),
        Value::Text(s) => RowValues::Text(s),
        Value::Blob(b) => RowValues::Blob(b),
    })
}

/// Build a result set from a prepared statement that yields columns.
///
/// # Errors
/// Returns the rusqlite error raised while stepping the statement or reading a value.
pub fn build_result_set(stmt: &mut Statement<'_>, params: &[Value]) -> rusqlite::Result<ResultSet> {
    let column_names: Vec<String> = stmt
        .column_names()
        .iter()
        .map(std::string::ToString::to_string)
        .collect();
    let col_count = column_names.len();

    let mut result_set = ResultSet::with_capacity(10);
    result_set.set_column_names(Arc::new(column_names));

    let mut rows_iter = stmt.query(params_from_iter(params.iter()))?;
    while let Some(row) = rows_iter.next()? {
        let mut row_values = Vec::with_capacity(col_count);
        for i in 0..col_count {
            row_values.push(sqlite_extract_value(row, i)?);
        }
        result_set.add_row_values(row_values);
    }

    Ok(result_set)
}

/// Run one statement: rows for queries, the change count for everything else.
///
/// # Errors
/// Returns the rusqlite error from preparing or executing the statement.
pub(crate) fn run_statement(
    conn: &rusqlite::Connection,
    query: &str,
    params: &[Value],
) -> rusqlite::Result<ResultSet> {
    let mut stmt = conn.prepare(query)?;
    if stmt.column_count() > 0 {
        build_result_set(&mut stmt, params)
    } else {
        let changed = stmt.execute(params_from_iter(params.iter()))?;
        Ok(ResultSet::affected(changed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selects_and_dml_report_differently() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT, data BLOB);")
            .unwrap();

        let inserted = run_statement(
            &conn,
            "INSERT INTO t (id, name, data) VALUES (?1, ?2, ?3)",
            &[
                Value::Integer(1),
                Value::Text("one".into()),
                Value::Blob(vec![0, 1, 2]),
            ],
        )
        .unwrap();
        assert_eq!(inserted.rows_affected, 1);
        assert!(inserted.is_empty());

        let rows = run_statement(&conn, "SELECT id, name, data FROM t", &[]).unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows.results[0];
        assert_eq!(row.get("id"), Some(&RowValues::Int(1)));
        assert_eq!(row.get("name"), Some(&RowValues::Text("one".into())));
        assert_eq!(row.get("data"), Some(&RowValues::Blob(vec![0, 1, 2])));
    }
}
