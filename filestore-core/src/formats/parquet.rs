//! Parquet columnar codec.
//!
//! Columns are typed per the narrowest arrow type that fits every cell in
//! the column (int64, float64, boolean, else utf8); temporal cells are
//! stored as RFC 3339 strings.

use super::TabularCodec;
use crate::table::{Cell, Table};
use crate::{Result, StoreError};
use arrow_array::{
    Array, ArrayRef, BooleanArray, Float64Array, Int64Array, RecordBatch, StringArray,
};
use arrow_schema::{DataType, Field, Schema};
use bytes::Bytes;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use std::sync::Arc;

#[derive(Debug)]
pub struct ParquetCodec;

fn codec_error<E: std::fmt::Display>(e: E) -> StoreError {
    StoreError::storage(format!("parquet codec failed: {e}"))
}

#[derive(Clone, Copy, PartialEq)]
enum ColumnType {
    Int,
    Float,
    Bool,
    Text,
}

fn infer_column_type(table: &Table, col: usize) -> ColumnType {
    let mut inferred: Option<ColumnType> = None;
    for row in table.rows() {
        let cell_type = match &row[col] {
            Cell::Null => continue,
            Cell::Int(_) => ColumnType::Int,
            Cell::Float(_) => ColumnType::Float,
            Cell::Bool(_) => ColumnType::Bool,
            Cell::Str(_) | Cell::DateTime(_) => ColumnType::Text,
        };
        inferred = Some(match (inferred, cell_type) {
            (None, t) => t,
            (Some(current), t) if current == t => current,
            (Some(ColumnType::Int), ColumnType::Float)
            | (Some(ColumnType::Float), ColumnType::Int) => ColumnType::Float,
            _ => return ColumnType::Text,
        });
    }
    inferred.unwrap_or(ColumnType::Text)
}

fn build_array(table: &Table, col: usize, ty: ColumnType) -> ArrayRef {
    match ty {
        ColumnType::Int => {
            let values: Vec<Option<i64>> = table
                .rows()
                .iter()
                .map(|row| match &row[col] {
                    Cell::Int(i) => Some(*i),
                    _ => None,
                })
                .collect();
            Arc::new(Int64Array::from(values))
        }
        ColumnType::Float => {
            let values: Vec<Option<f64>> = table
                .rows()
                .iter()
                .map(|row| match &row[col] {
                    Cell::Int(i) => Some(*i as f64),
                    Cell::Float(f) => Some(*f),
                    _ => None,
                })
                .collect();
            Arc::new(Float64Array::from(values))
        }
        ColumnType::Bool => {
            let values: Vec<Option<bool>> = table
                .rows()
                .iter()
                .map(|row| match &row[col] {
                    Cell::Bool(b) => Some(*b),
                    _ => None,
                })
                .collect();
            Arc::new(BooleanArray::from(values))
        }
        ColumnType::Text => {
            let values: Vec<Option<String>> = table
                .rows()
                .iter()
                .map(|row| match &row[col] {
                    Cell::Null => None,
                    cell => Some(cell.to_field()),
                })
                .collect();
            Arc::new(StringArray::from(values))
        }
    }
}

impl TabularCodec for ParquetCodec {
    fn encode(&self, table: &Table) -> Result<Vec<u8>> {
        if table.n_cols() == 0 {
            return Err(StoreError::invalid_payload(
                "parquet output requires at least one column",
            ));
        }

        let mut fields = Vec::with_capacity(table.n_cols());
        let mut arrays: Vec<ArrayRef> = Vec::with_capacity(table.n_cols());
        for (col, name) in table.columns().iter().enumerate() {
            let ty = infer_column_type(table, col);
            let data_type = match ty {
                ColumnType::Int => DataType::Int64,
                ColumnType::Float => DataType::Float64,
                ColumnType::Bool => DataType::Boolean,
                ColumnType::Text => DataType::Utf8,
            };
            fields.push(Field::new(name, data_type, true));
            arrays.push(build_array(table, col, ty));
        }

        let schema = Arc::new(Schema::new(fields));
        let batch = RecordBatch::try_new(schema.clone(), arrays).map_err(codec_error)?;

        let mut buffer = Vec::new();
        let mut writer = ArrowWriter::try_new(&mut buffer, schema, None).map_err(codec_error)?;
        writer.write(&batch).map_err(codec_error)?;
        writer.close().map_err(codec_error)?;
        Ok(buffer)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Table> {
        let builder = ParquetRecordBatchReaderBuilder::try_new(Bytes::copy_from_slice(bytes))
            .map_err(codec_error)?;
        let schema = builder.schema().clone();
        let reader = builder.build().map_err(codec_error)?;

        let columns: Vec<String> = schema
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect();
        let mut table = Table::new(columns);

        for batch in reader {
            let batch = batch.map_err(codec_error)?;
            for row in 0..batch.num_rows() {
                let mut cells = Vec::with_capacity(batch.num_columns());
                for col in 0..batch.num_columns() {
                    cells.push(read_cell(batch.column(col), row)?);
                }
                table.push_row(cells)?;
            }
        }
        Ok(table)
    }
}

fn read_cell(array: &ArrayRef, row: usize) -> Result<Cell> {
    if array.is_null(row) {
        return Ok(Cell::Null);
    }
    match array.data_type() {
        DataType::Int64 => {
            let values = array
                .as_any()
                .downcast_ref::<Int64Array>()
                .expect("int64 column");
            Ok(Cell::Int(values.value(row)))
        }
        DataType::Float64 => {
            let values = array
                .as_any()
                .downcast_ref::<Float64Array>()
                .expect("float64 column");
            Ok(Cell::Float(values.value(row)))
        }
        DataType::Boolean => {
            let values = array
                .as_any()
                .downcast_ref::<BooleanArray>()
                .expect("boolean column");
            Ok(Cell::Bool(values.value(row)))
        }
        DataType::Utf8 => {
            let values = array
                .as_any()
                .downcast_ref::<StringArray>()
                .expect("utf8 column");
            Ok(Cell::Str(values.value(row).to_string()))
        }
        other => Err(StoreError::invalid_payload(format!(
            "unsupported parquet column type {other}"
        ))),
    }
}
