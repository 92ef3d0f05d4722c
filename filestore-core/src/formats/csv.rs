//! CSV tabular codec.
//!
//! Saves use the configured delimiter. Loads infer the delimiter by trying
//! the candidate set and accepting the first candidate that parses the
//! header into more than one column, falling back to the configured
//! delimiter for genuinely single-column files.

use super::TabularCodec;
use crate::config::CsvOptions;
use crate::table::{Cell, Table};
use crate::{Result, StoreError};

const CANDIDATE_DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

#[derive(Debug)]
pub struct CsvCodec {
    delimiter: u8,
}

impl CsvCodec {
    pub fn new(options: CsvOptions) -> Self {
        Self {
            delimiter: options.delimiter as u8,
        }
    }

    fn parse(&self, bytes: &[u8], delimiter: u8) -> Result<Table> {
        let mut reader = ::csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(false)
            .from_reader(bytes);

        let columns: Vec<String> = reader
            .headers()
            .map_err(|e| StoreError::invalid_payload(format!("bad CSV header: {e}")))?
            .iter()
            .map(str::to_string)
            .collect();

        let mut table = Table::new(columns);
        for record in reader.records() {
            let record =
                record.map_err(|e| StoreError::invalid_payload(format!("bad CSV record: {e}")))?;
            table.push_row(record.iter().map(Cell::parse_field).collect())?;
        }
        Ok(table)
    }
}

impl TabularCodec for CsvCodec {
    fn encode(&self, table: &Table) -> Result<Vec<u8>> {
        let mut writer = ::csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(Vec::new());

        writer
            .write_record(table.columns())
            .map_err(|e| StoreError::storage(format!("CSV write failed: {e}")))?;
        for row in table.rows() {
            let fields: Vec<String> = row.iter().map(Cell::to_field).collect();
            writer
                .write_record(&fields)
                .map_err(|e| StoreError::storage(format!("CSV write failed: {e}")))?;
        }

        writer
            .into_inner()
            .map_err(|e| StoreError::storage(format!("CSV write failed: {e}")))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Table> {
        // Configured delimiter first, then the remaining candidates.
        let mut candidates = vec![self.delimiter];
        candidates.extend(CANDIDATE_DELIMITERS.iter().filter(|d| **d != self.delimiter));

        for delimiter in &candidates {
            if let Ok(table) = self.parse(bytes, *delimiter) {
                if table.n_cols() > 1 {
                    return Ok(table);
                }
            }
        }
        self.parse(bytes, self.delimiter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> CsvCodec {
        CsvCodec::new(CsvOptions { delimiter: ';' })
    }

    fn sample() -> Table {
        Table::with_rows(
            vec!["name", "score", "active"],
            vec![
                vec![Cell::from("ada"), Cell::from(95i64), Cell::from(true)],
                vec![Cell::from("grace"), Cell::from(88.5), Cell::from(false)],
            ],
        )
        .unwrap()
    }

    #[test]
    fn roundtrip() {
        let codec = codec();
        let encoded = codec.encode(&sample()).unwrap();
        let decoded = codec.decode(&encoded).unwrap();
        assert_eq!(decoded, sample());
    }

    #[test]
    fn delimiter_is_inferred_on_load() {
        let codec = codec();
        let comma_separated = b"a,b\n1,2\n";
        let table = codec.decode(comma_separated).unwrap();
        assert_eq!(table.columns(), &["a".to_string(), "b".to_string()]);
        assert_eq!(table.rows()[0], vec![Cell::Int(1), Cell::Int(2)]);
    }

    #[test]
    fn single_column_file_falls_back_to_configured_delimiter() {
        let codec = codec();
        let table = codec.decode(b"value\n1\n2\n").unwrap();
        assert_eq!(table.n_cols(), 1);
        assert_eq!(table.n_rows(), 2);
    }

    #[test]
    fn fields_with_embedded_delimiters_are_quoted() {
        let codec = codec();
        let table = Table::with_rows(
            vec!["text"],
            vec![vec![Cell::from("a;b;c")]],
        )
        .unwrap();
        let encoded = codec.encode(&table).unwrap();
        let decoded = codec.decode(&encoded).unwrap();
        assert_eq!(decoded.rows()[0][0], Cell::Str("a;b;c".to_string()));
    }
}
