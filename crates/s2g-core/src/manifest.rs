//! Manifest loading.
//!
//! The manifest is a CSV release artifact listing the tables to reconcile:
//! one row per table with `database_name`, `table_name` and `s3_path`
//! columns. Rows are yielded lazily; the reader never restarts.

use crate::error::ManifestError;
use crate::Result;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Columns every manifest row must supply, with a non-empty value.
const REQUIRED_FIELDS: [&str; 3] = ["database_name", "table_name", "s3_path"];

/// One row of the manifest: which table to create and where its data lives.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestRow {
    pub database_name: String,
    pub table_name: String,
    pub s3_path: String,
}

/// Lazy reader over manifest rows.
pub struct ManifestReader<R: Read> {
    headers: csv::StringRecord,
    records: csv::StringRecordsIntoIter<R>,
    row: usize,
}

impl ManifestReader<File> {
    /// Open a manifest file from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let reader = csv::Reader::from_path(path.as_ref()).map_err(ManifestError::Csv)?;
        Self::from_csv(reader)
    }
}

impl<R: Read> ManifestReader<R> {
    /// Read a manifest from any byte source. Used by tests and callers that
    /// already hold the manifest in memory.
    pub fn from_reader(reader: R) -> Result<Self> {
        Self::from_csv(csv::Reader::from_reader(reader))
    }

    fn from_csv(mut reader: csv::Reader<R>) -> Result<Self> {
        let headers = reader.headers().map_err(ManifestError::Csv)?.clone();
        Ok(Self {
            headers,
            records: reader.into_records(),
            row: 0,
        })
    }

    fn field<'a>(
        &self,
        record: &'a csv::StringRecord,
        field: &'static str,
    ) -> std::result::Result<&'a str, ManifestError> {
        let value = self
            .headers
            .iter()
            .position(|h| h == field)
            .and_then(|idx| record.get(idx))
            .map(str::trim)
            .unwrap_or("");

        if value.is_empty() {
            Err(ManifestError::MissingField {
                field,
                row: self.row,
            })
        } else {
            Ok(value)
        }
    }

    fn parse_row(&self, record: &csv::StringRecord) -> std::result::Result<ManifestRow, ManifestError> {
        // Validate all three up front so the first reported error names the
        // first missing field in column order.
        let [database_name, table_name, s3_path] = REQUIRED_FIELDS;
        Ok(ManifestRow {
            database_name: self.field(record, database_name)?.to_string(),
            table_name: self.field(record, table_name)?.to_string(),
            s3_path: self.field(record, s3_path)?.to_string(),
        })
    }
}

impl<R: Read> Iterator for ManifestReader<R> {
    type Item = Result<ManifestRow>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = match self.records.next()? {
            Ok(record) => record,
            Err(e) => return Some(Err(ManifestError::Csv(e).into())),
        };
        let row = self.parse_row(&record).map_err(Into::into);
        self.row += 1;
        Some(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ManifestError};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn reader(content: &str) -> ManifestReader<&[u8]> {
        ManifestReader::from_reader(content.as_bytes()).unwrap()
    }

    #[test]
    fn test_reads_rows_in_order() {
        let rows: Vec<_> = reader(
            "database_name,table_name,s3_path\n\
             sales,orders,s3://bucket/sales/orders/\n\
             sales,customers,s3://bucket/sales/customers/\n",
        )
        .collect::<Result<_>>()
        .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0],
            ManifestRow {
                database_name: "sales".into(),
                table_name: "orders".into(),
                s3_path: "s3://bucket/sales/orders/".into(),
            }
        );
        assert_eq!(rows[1].table_name, "customers");
    }

    #[test]
    fn test_extra_columns_are_ignored() {
        let rows: Vec<_> = reader(
            "owner,database_name,table_name,s3_path\n\
             alice,sales,orders,s3://bucket/sales/orders/\n",
        )
        .collect::<Result<_>>()
        .unwrap();
        assert_eq!(rows[0].database_name, "sales");
    }

    #[test]
    fn test_missing_field_reports_name_and_row() {
        let mut r = reader(
            "database_name,table_name,s3_path\n\
             sales,orders,s3://bucket/sales/orders/\n\
             sales,,s3://bucket/sales/customers/\n",
        );

        assert!(r.next().unwrap().is_ok());
        match r.next().unwrap() {
            Err(Error::Manifest(ManifestError::MissingField { field, row })) => {
                assert_eq!(field, "table_name");
                assert_eq!(row, 1);
            }
            other => panic!("expected MissingField, got {:?}", other),
        }
    }

    #[test]
    fn test_absent_column_reports_missing_field() {
        let mut r = reader(
            "database_name,table_name\n\
             sales,orders\n",
        );
        match r.next().unwrap() {
            Err(Error::Manifest(ManifestError::MissingField { field, row })) => {
                assert_eq!(field, "s3_path");
                assert_eq!(row, 0);
            }
            other => panic!("expected MissingField, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_manifest_yields_nothing() {
        let mut r = reader("database_name,table_name,s3_path\n");
        assert!(r.next().is_none());
    }

    #[test]
    fn test_open_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "database_name,table_name,s3_path").unwrap();
        writeln!(file, "sales,orders,s3://bucket/sales/orders/").unwrap();
        file.flush().unwrap();

        let rows: Vec<_> = ManifestReader::open(file.path())
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].s3_path, "s3://bucket/sales/orders/");
    }

    #[test]
    fn test_open_missing_file_fails() {
        assert!(ManifestReader::open("/nonexistent/manifest.csv").is_err());
    }
}
