//! XLSX workbook codec.
//!
//! The one workbook-capable tabular format: an ordered set of named sheets
//! renders into a single file, and loads can return either the first sheet
//! or every sheet in workbook order.

use super::TabularCodec;
use crate::table::{Cell, Table};
use crate::{Result, StoreError};
use calamine::{Data, Reader, Xlsx};
use rust_xlsxwriter::Workbook;
use std::io::Cursor;

#[derive(Debug)]
pub struct XlsxCodec;

fn write_error(e: rust_xlsxwriter::XlsxError) -> StoreError {
    StoreError::storage(format!("xlsx write failed: {e}"))
}

fn read_error(e: calamine::XlsxError) -> StoreError {
    StoreError::invalid_payload(format!("xlsx read failed: {e}"))
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Null,
        Data::String(s) => Cell::Str(s.clone()),
        // Spreadsheet numbers are always floats on read; fold integral
        // values back to integers.
        Data::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
            Cell::Int(*f as i64)
        }
        Data::Float(f) => Cell::Float(*f),
        Data::Int(i) => Cell::Int(*i),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(_) => Cell::Str(data.to_string()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Str(s.clone()),
        Data::Error(e) => Cell::Str(format!("#ERR:{e:?}")),
    }
}

impl TabularCodec for XlsxCodec {
    fn encode(&self, table: &Table) -> Result<Vec<u8>> {
        self.encode_workbook(&[("Sheet1".to_string(), table.clone())])
    }

    fn decode(&self, bytes: &[u8]) -> Result<Table> {
        let mut sheets = self.decode_workbook(bytes)?;
        if sheets.is_empty() {
            return Err(StoreError::invalid_payload("workbook has no sheets"));
        }
        Ok(sheets.remove(0).1)
    }

    fn encode_workbook(&self, sheets: &[(String, Table)]) -> Result<Vec<u8>> {
        if sheets.is_empty() {
            return Err(StoreError::invalid_payload(
                "workbook output requires at least one named dataset",
            ));
        }

        let mut workbook = Workbook::new();
        for (name, table) in sheets {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(name).map_err(write_error)?;

            for (col, column) in table.columns().iter().enumerate() {
                worksheet
                    .write_string(0, col as u16, column)
                    .map_err(write_error)?;
            }
            for (row_index, row) in table.rows().iter().enumerate() {
                let row_number = row_index as u32 + 1;
                for (col, cell) in row.iter().enumerate() {
                    let col = col as u16;
                    match cell {
                        Cell::Null => {}
                        Cell::Bool(b) => {
                            worksheet
                                .write_boolean(row_number, col, *b)
                                .map_err(write_error)?;
                        }
                        Cell::Int(i) => {
                            worksheet
                                .write_number(row_number, col, *i as f64)
                                .map_err(write_error)?;
                        }
                        Cell::Float(f) => {
                            worksheet
                                .write_number(row_number, col, *f)
                                .map_err(write_error)?;
                        }
                        Cell::Str(s) => {
                            worksheet
                                .write_string(row_number, col, s)
                                .map_err(write_error)?;
                        }
                        Cell::DateTime(_) => {
                            worksheet
                                .write_string(row_number, col, cell.to_field())
                                .map_err(write_error)?;
                        }
                    }
                }
            }
        }

        workbook.save_to_buffer().map_err(write_error)
    }

    fn decode_workbook(&self, bytes: &[u8]) -> Result<Vec<(String, Table)>> {
        let mut workbook: Xlsx<_> =
            Xlsx::new(Cursor::new(bytes.to_vec())).map_err(read_error)?;
        let names: Vec<String> = workbook.sheet_names().to_vec();

        let mut sheets = Vec::with_capacity(names.len());
        for name in names {
            let range = workbook.worksheet_range(&name).map_err(read_error)?;
            let mut rows = range.rows();

            let columns: Vec<String> = match rows.next() {
                Some(header) => header.iter().map(|d| d.to_string()).collect(),
                None => Vec::new(),
            };

            let mut table = Table::new(columns);
            for row in rows {
                table.push_row(row.iter().map(cell_from_data).collect())?;
            }
            sheets.push((name, table));
        }
        Ok(sheets)
    }
}
