use std::io;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use serde::de::DeserializeOwned;
use tracing::info;

use crate::error::{PlotError, Result};
use crate::perf::{parse_decimal, DECIMAL_COLUMNS};

const DELIMITER: u8 = b';';

/// A measurement file held in memory: the header row plus every data row as text.
/// Numeric fields are decoded when rows are deserialized, so decimal commas
/// survive until then.
#[derive(Debug, Clone)]
pub struct Table {
    headers: StringRecord,
    records: Vec<StringRecord>,
}

impl Table {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let reader = builder().from_path(path)?;
        let table = Self::read(reader)?;

        info!(
            path = %path.display(),
            rows = table.len(),
            columns = ?table.headers(),
            "loaded measurements"
        );
        Ok(table)
    }

    #[cfg(test)]
    pub fn from_reader<R: io::Read>(rdr: R) -> Result<Self> {
        Self::read(builder().from_reader(rdr))
    }

    fn read<R: io::Read>(mut reader: csv::Reader<R>) -> Result<Self> {
        let headers = reader.headers()?.clone();
        let records = reader.records().collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { headers, records })
    }

    pub fn headers(&self) -> Vec<&str> {
        self.headers.iter().collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h == name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[StringRecord] {
        &self.records
    }

    /// Deserializes every row into `T`, matching struct fields to columns by header name.
    /// Columns `T` does not name are ignored.
    pub fn rows<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        self.records()
            .iter()
            .enumerate()
            .map(|(i, record)| {
                record
                    .deserialize(Some(&self.headers))
                    .map_err(|err| self.parse_error(i + 1, record, err))
            })
            .collect()
    }

    // Row numbers are 1-based and count data rows only. csv only knows the
    // field for its own parse failures; decimal failures are located by
    // re-parsing the decimal columns of the row.
    fn parse_error(&self, row: usize, record: &StringRecord, err: csv::Error) -> PlotError {
        if let csv::ErrorKind::Deserialize { err: de, .. } = err.kind() {
            let field = match de.field() {
                Some(field) => Some(field as usize),
                None => self.bad_decimal_field(record),
            };
            if let Some(field) = field {
                return PlotError::Parse {
                    column: self.headers.get(field).unwrap_or_default().to_string(),
                    row,
                    value: record.get(field).unwrap_or_default().to_string(),
                };
            }
        }
        PlotError::Csv(err)
    }

    fn bad_decimal_field(&self, record: &StringRecord) -> Option<usize> {
        self.headers
            .iter()
            .zip(record.iter())
            .position(|(header, value)| {
                DECIMAL_COLUMNS.contains(&header) && parse_decimal(value).is_none()
            })
    }
}

fn builder() -> ReaderBuilder {
    let mut builder = ReaderBuilder::new();
    builder.delimiter(DELIMITER).trim(Trim::All);
    builder
}
