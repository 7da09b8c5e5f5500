//! Type mapping and value conversion shared by the file-backed (SQLite-family) drivers.
//!
//! These backends store values under a handful of loose affinities, so most semantic column
//! types collapse onto `integer`, `real`, `text`, `blob` or a date/time name.

use chrono::NaiveDate;
use serde_json::Value as JsonValue;

use crate::error::OrmDriverError;
use crate::types::{ColumnDescriptor, ColumnType, RowValues};

/// Storage type name for a column on a file-backed backend.
#[must_use]
pub fn normalize_column_type(column: &ColumnDescriptor) -> String {
    let name = match &column.column_type {
        ColumnType::Integer | ColumnType::BigInt => "integer",
        ColumnType::Float | ColumnType::Double => "real",
        ColumnType::Decimal => "decimal",
        ColumnType::Boolean => "boolean",
        ColumnType::String | ColumnType::Uuid => "varchar",
        ColumnType::Text | ColumnType::Json | ColumnType::SimpleArray | ColumnType::SimpleJson => {
            "text"
        }
        ColumnType::Date => "date",
        ColumnType::Time => "time",
        ColumnType::DateTime => "datetime",
        // affinity depends on the backend; drivers override this one
        ColumnType::Binary => "binary",
        ColumnType::Custom(custom) => return custom.to_lowercase(),
    };
    name.to_string()
}

/// Quote an identifier with double quotes, doubling embedded quotes.
#[must_use]
pub fn escape(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Table path as referenced in SQL, e.g. `main.user`.
#[must_use]
pub fn build_table_name(table_name: &str, schema: Option<&str>) -> String {
    match schema {
        Some(schema) if !schema.is_empty() => format!("{schema}.{table_name}"),
        _ => table_name.to_string(),
    }
}

/// Positional placeholder; these backends use anonymous `?` parameters.
#[must_use]
pub fn create_parameter(_index: usize) -> &'static str {
    "?"
}

/// Default expression as it should appear in DDL.
#[must_use]
pub fn normalize_default(column: &ColumnDescriptor) -> Option<String> {
    let raw = column.default.as_deref()?.trim();
    let normalized = match column.column_type {
        ColumnType::Boolean => match raw.to_ascii_lowercase().as_str() {
            "true" => "1".to_string(),
            "false" => "0".to_string(),
            _ => raw.to_string(),
        },
        ColumnType::Integer
        | ColumnType::BigInt
        | ColumnType::Float
        | ColumnType::Double
        | ColumnType::Decimal => raw.to_string(),
        _ if is_sql_expression(raw) => raw.to_string(),
        _ => format!("'{}'", raw.replace('\'', "''")),
    };
    Some(normalized)
}

fn is_sql_expression(raw: &str) -> bool {
    raw.starts_with('(')
        || raw.starts_with('\'')
        || raw.eq_ignore_ascii_case("null")
        || matches!(
            raw.to_ascii_uppercase().as_str(),
            "CURRENT_TIMESTAMP" | "CURRENT_DATE" | "CURRENT_TIME"
        )
}

/// Convert an entity value into what the backend stores for this column.
///
/// # Errors
/// Returns `OrmDriverError::ConversionError` when the value does not fit the column.
pub fn preprocess_persistent_value(
    column: &ColumnDescriptor,
    value: RowValues,
) -> Result<RowValues, OrmDriverError> {
    if value.is_null() {
        return Ok(value);
    }
    let converted = match (&column.column_type, value) {
        (ColumnType::Boolean, RowValues::Bool(b)) => RowValues::Int(i64::from(b)),
        (ColumnType::Date, RowValues::Timestamp(ts)) => {
            RowValues::Text(ts.date().format("%F").to_string())
        }
        (ColumnType::Time, RowValues::Timestamp(ts)) => {
            RowValues::Text(ts.time().format("%T%.f").to_string())
        }
        (ColumnType::DateTime, RowValues::Timestamp(ts)) => {
            RowValues::Text(ts.format("%F %T%.f").to_string())
        }
        (ColumnType::SimpleArray, RowValues::JSON(JsonValue::Array(items))) => {
            let parts = items
                .iter()
                .map(|item| match item {
                    JsonValue::String(s) if s.contains(',') => Err(OrmDriverError::ConversionError(
                        format!("simple-array item {s:?} of {} contains a comma", column.property_name),
                    )),
                    JsonValue::String(s) => Ok(s.clone()),
                    other => Ok(other.to_string()),
                })
                .collect::<Result<Vec<_>, _>>()?;
            RowValues::Text(parts.join(","))
        }
        (ColumnType::SimpleJson | ColumnType::Json, RowValues::JSON(json)) => {
            RowValues::Text(json.to_string())
        }
        (_, other) => other,
    };
    Ok(converted)
}

/// Convert a stored value back into its entity representation.
///
/// # Errors
/// Returns `OrmDriverError::ConversionError` when stored text cannot be parsed or a numeric or
/// binary column holds a value of another storage class.
pub fn prepare_hydrated_value(
    column: &ColumnDescriptor,
    value: RowValues,
) -> Result<RowValues, OrmDriverError> {
    if value.is_null() {
        return Ok(value);
    }
    let hydrated = match (&column.column_type, value) {
        (ColumnType::Boolean, value) => match value.as_bool() {
            Some(b) => RowValues::Bool(b),
            None => value,
        },
        (ColumnType::Integer | ColumnType::BigInt, value) => match value.as_int() {
            Some(int) => RowValues::Int(*int),
            None => return Err(conversion_error(column, &value)),
        },
        // whole numbers can come back as integers
        (ColumnType::Float | ColumnType::Double, value) => match value.as_float() {
            Some(float) => RowValues::Float(float),
            None => return Err(conversion_error(column, &value)),
        },
        (ColumnType::Binary, RowValues::Text(text)) => RowValues::Blob(text.into_bytes()),
        (ColumnType::Binary, value) if value.as_blob().is_some() => value,
        (ColumnType::Binary, value) => return Err(conversion_error(column, &value)),
        (ColumnType::DateTime, RowValues::Text(text)) => {
            let value = RowValues::Text(text);
            match value.as_timestamp() {
                Some(ts) => RowValues::Timestamp(ts),
                None => return Err(conversion_error(column, &value)),
            }
        }
        (ColumnType::Date, RowValues::Text(text)) => {
            let midnight = NaiveDate::parse_from_str(&text, "%F")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .ok_or_else(|| conversion_error(column, &RowValues::Text(text.clone())))?;
            RowValues::Timestamp(midnight)
        }
        (ColumnType::SimpleArray, RowValues::Text(text)) => {
            let items = if text.is_empty() {
                Vec::new()
            } else {
                text.split(',')
                    .map(|part| JsonValue::String(part.to_string()))
                    .collect()
            };
            RowValues::JSON(JsonValue::Array(items))
        }
        (ColumnType::SimpleJson | ColumnType::Json, RowValues::Text(text)) => {
            RowValues::JSON(serde_json::from_str(&text)?)
        }
        (_, other) => other,
    };
    Ok(hydrated)
}

fn conversion_error(column: &ColumnDescriptor, value: &RowValues) -> OrmDriverError {
    OrmDriverError::ConversionError(format!(
        "cannot hydrate {value:?} for column {} ({:?})",
        column.database_name, column.column_type
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn col(ty: ColumnType) -> ColumnDescriptor {
        ColumnDescriptor::new("c", ty)
    }

    #[test]
    fn semantic_types_collapse_to_affinities() {
        assert_eq!(normalize_column_type(&col(ColumnType::BigInt)), "integer");
        assert_eq!(normalize_column_type(&col(ColumnType::Double)), "real");
        assert_eq!(normalize_column_type(&col(ColumnType::Uuid)), "varchar");
        assert_eq!(normalize_column_type(&col(ColumnType::SimpleJson)), "text");
        assert_eq!(normalize_column_type(&col(ColumnType::Text)), "text");
        assert_eq!(normalize_column_type(&col(ColumnType::Binary)), "binary");
        assert_eq!(
            normalize_column_type(&col(ColumnType::Custom("NVARCHAR".into()))),
            "nvarchar"
        );
    }

    #[test]
    fn identifiers_and_tables() {
        assert_eq!(escape("user"), "\"user\"");
        assert_eq!(escape("we\"ird"), "\"we\"\"ird\"");
        assert_eq!(build_table_name("user", Some("main")), "main.user");
        assert_eq!(build_table_name("user", None), "user");
        assert_eq!(create_parameter(3), "?");
    }

    #[test]
    fn defaults_are_normalized() {
        let flag = col(ColumnType::Boolean).with_default("true");
        assert_eq!(normalize_default(&flag).as_deref(), Some("1"));
        let name = col(ColumnType::String).with_default("O'Brien");
        assert_eq!(normalize_default(&name).as_deref(), Some("'O''Brien'"));
        let created = col(ColumnType::DateTime).with_default("CURRENT_TIMESTAMP");
        assert_eq!(normalize_default(&created).as_deref(), Some("CURRENT_TIMESTAMP"));
        assert_eq!(normalize_default(&col(ColumnType::Integer)), None);
    }

    #[test]
    fn simple_array_round_trips_through_text() {
        let tags = col(ColumnType::SimpleArray);
        let stored = preprocess_persistent_value(&tags, RowValues::JSON(json!(["a", "b"]))).unwrap();
        assert_eq!(stored, RowValues::Text("a,b".into()));
        let hydrated = prepare_hydrated_value(&tags, stored).unwrap();
        assert_eq!(hydrated, RowValues::JSON(json!(["a", "b"])));

        let err = preprocess_persistent_value(&tags, RowValues::JSON(json!(["a,b"])));
        assert!(err.is_err());
    }

    #[test]
    fn booleans_and_dates_are_converted() {
        let flag = col(ColumnType::Boolean);
        assert_eq!(
            preprocess_persistent_value(&flag, RowValues::Bool(true)).unwrap(),
            RowValues::Int(1)
        );
        assert_eq!(
            prepare_hydrated_value(&flag, RowValues::Int(0)).unwrap(),
            RowValues::Bool(false)
        );

        let day = col(ColumnType::Date);
        let hydrated = prepare_hydrated_value(&day, RowValues::Text("2023-05-06".into())).unwrap();
        let stored = preprocess_persistent_value(&day, hydrated).unwrap();
        assert_eq!(stored, RowValues::Text("2023-05-06".into()));

        let when = col(ColumnType::DateTime);
        assert!(prepare_hydrated_value(&when, RowValues::Text("yesterday".into())).is_err());
        assert_eq!(
            prepare_hydrated_value(&when, RowValues::Null).unwrap(),
            RowValues::Null
        );
    }

    #[test]
    fn numeric_and_binary_columns_are_checked() {
        let id = col(ColumnType::BigInt);
        assert_eq!(prepare_hydrated_value(&id, RowValues::Int(7)).unwrap(), RowValues::Int(7));
        assert!(prepare_hydrated_value(&id, RowValues::Text("seven".into())).is_err());

        let price = col(ColumnType::Double);
        assert_eq!(
            prepare_hydrated_value(&price, RowValues::Int(3)).unwrap(),
            RowValues::Float(3.0)
        );
        assert_eq!(
            prepare_hydrated_value(&price, RowValues::Float(2.5)).unwrap(),
            RowValues::Float(2.5)
        );
        assert!(prepare_hydrated_value(&price, RowValues::Bool(true)).is_err());

        let avatar = col(ColumnType::Binary);
        assert_eq!(
            prepare_hydrated_value(&avatar, RowValues::Blob(vec![1, 2])).unwrap(),
            RowValues::Blob(vec![1, 2])
        );
        assert_eq!(
            prepare_hydrated_value(&avatar, RowValues::Text("ab".into())).unwrap(),
            RowValues::Blob(b"ab".to_vec())
        );
        assert!(prepare_hydrated_value(&avatar, RowValues::Int(1)).is_err());
    }
}
