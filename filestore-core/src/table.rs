/*!
In-memory tabular data model shared by every tabular codec.

A [`Table`] is a named-column, row-major 2-D dataset of [`Cell`] values.
Shape is validated on construction: every row must match the column count,
ragged input is rejected as an invalid payload.
*/

use crate::{Result, StoreError};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

/// A single typed cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    DateTime(DateTime<Utc>),
}

impl Cell {
    /// Convert to a JSON value for the JSON/YAML codecs.
    ///
    /// Temporal values are coerced to RFC 3339 strings and non-finite floats
    /// to null so that encoding never fails; the coercion is one-way (decode
    /// yields plain strings and numbers).
    pub fn to_json(&self) -> Value {
        match self {
            Cell::Null => Value::Null,
            Cell::Bool(b) => Value::Bool(*b),
            Cell::Int(i) => Value::from(*i),
            Cell::Float(f) if f.is_finite() => Value::from(*f),
            Cell::Float(_) => Value::Null,
            Cell::Str(s) => Value::String(s.clone()),
            Cell::DateTime(dt) => {
                Value::String(dt.to_rfc3339_opts(SecondsFormat::Secs, true))
            }
        }
    }

    /// Build a cell from a decoded JSON value.
    pub fn from_json(value: &Value) -> Result<Cell> {
        match value {
            Value::Null => Ok(Cell::Null),
            Value::Bool(b) => Ok(Cell::Bool(*b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Cell::Int(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(Cell::Float(f))
                } else {
                    Ok(Cell::Str(n.to_string()))
                }
            }
            Value::String(s) => Ok(Cell::Str(s.clone())),
            other => Err(StoreError::invalid_payload(format!(
                "nested value {other} cannot be stored in a table cell"
            ))),
        }
    }

    /// Render the cell as a flat text field (CSV, spreadsheet fallback).
    pub fn to_field(&self) -> String {
        match self {
            Cell::Null => String::new(),
            Cell::Bool(b) => b.to_string(),
            Cell::Int(i) => i.to_string(),
            Cell::Float(f) => f.to_string(),
            Cell::Str(s) => s.clone(),
            Cell::DateTime(dt) => dt.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }

    /// Parse a flat text field back into the narrowest matching type.
    pub fn parse_field(field: &str) -> Cell {
        if field.is_empty() {
            return Cell::Null;
        }
        if let Ok(i) = field.parse::<i64>() {
            return Cell::Int(i);
        }
        if let Ok(f) = field.parse::<f64>() {
            return Cell::Float(f);
        }
        match field {
            "true" => Cell::Bool(true),
            "false" => Cell::Bool(false),
            _ => Cell::Str(field.to_string()),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Str(s.to_string())
    }
}

impl From<i64> for Cell {
    fn from(i: i64) -> Self {
        Cell::Int(i)
    }
}

impl From<f64> for Cell {
    fn from(f: f64) -> Self {
        Cell::Float(f)
    }
}

impl From<bool> for Cell {
    fn from(b: bool) -> Self {
        Cell::Bool(b)
    }
}

/// A named-column 2-D dataset.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Create an empty table with the given column names.
    pub fn new<S: Into<String>>(columns: Vec<S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Create a table from columns and rows, validating the shape.
    pub fn with_rows<S: Into<String>>(columns: Vec<S>, rows: Vec<Vec<Cell>>) -> Result<Self> {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    /// Append one row; the width must match the column count.
    pub fn push_row(&mut self, row: Vec<Cell>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(StoreError::invalid_payload(format!(
                "ragged table: row has {} cells, expected {}",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Convert to a list of JSON records (one object per row).
    pub fn to_records(&self) -> Vec<Value> {
        self.rows
            .iter()
            .map(|row| {
                let mut record = Map::new();
                for (column, cell) in self.columns.iter().zip(row) {
                    record.insert(column.clone(), cell.to_json());
                }
                Value::Object(record)
            })
            .collect()
    }

    /// Build a table from a list of JSON records.
    ///
    /// Columns are the sorted union of all record keys; keys missing from a
    /// record decode as null cells.
    pub fn from_records(records: &[Value]) -> Result<Table> {
        let mut columns: Vec<String> = Vec::new();
        for record in records {
            let object = record.as_object().ok_or_else(|| {
                StoreError::invalid_payload("tabular records must be objects")
            })?;
            for key in object.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }
        columns.sort();

        let mut table = Table::new(columns.clone());
        for record in records {
            let object = record.as_object().expect("validated above");
            let row = columns
                .iter()
                .map(|column| match object.get(column) {
                    Some(value) => Cell::from_json(value),
                    None => Ok(Cell::Null),
                })
                .collect::<Result<Vec<_>>>()?;
            table.push_row(row)?;
        }
        Ok(table)
    }

    /// Build a table from a decoded JSON payload: either a list of records
    /// or a mapping of records (rows ordered by outer key; the key itself is
    /// not preserved as a column).
    pub fn from_json_payload(value: &Value) -> Result<Table> {
        match value {
            Value::Array(records) => Self::from_records(records),
            Value::Object(map) => {
                let mut keys: Vec<&String> = map.keys().collect();
                keys.sort();
                let records: Vec<Value> =
                    keys.into_iter().map(|k| map[k].clone()).collect();
                Self::from_records(&records)
            }
            _ => Err(StoreError::invalid_payload(
                "tabular payload must be a list of records or a mapping of records",
            )),
        }
    }
}

/// Payload accepted by the tabular save entry points: one table, or an
/// ordered set of named tables (workbook sheets or per-name files).
#[derive(Debug, Clone, PartialEq)]
pub enum TabularPayload {
    Single(Table),
    Many(Vec<(String, Table)>),
}

impl From<Table> for TabularPayload {
    fn from(table: Table) -> Self {
        TabularPayload::Single(table)
    }
}

impl From<Vec<(String, Table)>> for TabularPayload {
    fn from(tables: Vec<(String, Table)>) -> Self {
        TabularPayload::Many(tables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn ragged_row_rejected() {
        let mut table = Table::new(vec!["a", "b"]);
        let err = table.push_row(vec![Cell::from(1i64)]).unwrap_err();
        assert!(matches!(err, StoreError::InvalidPayload(_)));
    }

    #[test]
    fn records_roundtrip_sorts_columns() {
        let table = Table::with_rows(
            vec!["b", "a"],
            vec![vec![Cell::from(1i64), Cell::from(2i64)]],
        )
        .unwrap();
        let records = table.to_records();
        let rebuilt = Table::from_records(&records).unwrap();
        assert_eq!(rebuilt.columns(), &["a".to_string(), "b".to_string()]);
        assert_eq!(rebuilt.rows()[0], vec![Cell::Int(2), Cell::Int(1)]);
    }

    #[test]
    fn missing_record_keys_decode_as_null() {
        let records = vec![
            serde_json::json!({"a": 1, "b": "x"}),
            serde_json::json!({"a": 2}),
        ];
        let table = Table::from_records(&records).unwrap();
        assert_eq!(table.rows()[1][1], Cell::Null);
    }

    #[test]
    fn datetime_coerces_to_rfc3339_one_way() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        let json = Cell::DateTime(dt).to_json();
        assert_eq!(json, Value::String("2024-03-01T12:30:00Z".to_string()));
        // Decoding yields a plain string, not the original typed value.
        assert_eq!(
            Cell::from_json(&json).unwrap(),
            Cell::Str("2024-03-01T12:30:00Z".to_string())
        );
    }

    #[test]
    fn non_finite_floats_encode_as_null() {
        assert_eq!(Cell::Float(f64::NAN).to_json(), Value::Null);
        assert_eq!(Cell::Float(f64::INFINITY).to_json(), Value::Null);
    }

    #[test]
    fn field_parsing_narrows_types() {
        assert_eq!(Cell::parse_field(""), Cell::Null);
        assert_eq!(Cell::parse_field("42"), Cell::Int(42));
        assert_eq!(Cell::parse_field("4.5"), Cell::Float(4.5));
        assert_eq!(Cell::parse_field("true"), Cell::Bool(true));
        assert_eq!(Cell::parse_field("hello"), Cell::Str("hello".to_string()));
    }

    #[test]
    fn mapping_payload_orders_rows_by_key() {
        let value = serde_json::json!({
            "z": {"v": 3},
            "a": {"v": 1},
        });
        let table = Table::from_json_payload(&value).unwrap();
        assert_eq!(table.rows()[0][0], Cell::Int(1));
        assert_eq!(table.rows()[1][0], Cell::Int(3));
    }
}
