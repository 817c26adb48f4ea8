// policyguard-core/src/infrastructure/tabular/mod.rs
//
// Delimited tabular IO. Large inputs are read as fixed-size row chunks so
// the pipeline never holds more than one raw chunk plus the accumulated
// results. A malformed file is fatal for the run: no partial output.

use std::fs::File;
use std::path::Path;

use crate::domain::table::{TransactionTable, Value};
use crate::error::PolicyGuardError;
use crate::infrastructure::error::InfrastructureError;
use crate::infrastructure::fs::atomic_write;

/// Streams a transactions CSV as `TransactionTable` chunks.
pub struct ChunkedCsvReader {
    reader: csv::Reader<File>,
    headers: Vec<String>,
    chunk_size: usize,
}

impl ChunkedCsvReader {
    pub fn open(path: &Path, chunk_size: usize) -> Result<Self, InfrastructureError> {
        let file = File::open(path)?;
        let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(file);
        let headers = reader
            .headers()?
            .iter()
            .map(|h| h.to_string())
            .collect();
        Ok(Self {
            reader,
            headers,
            chunk_size: chunk_size.max(1),
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Read the next chunk, `None` once the file is exhausted.
    pub fn next_chunk(&mut self) -> Result<Option<TransactionTable>, PolicyGuardError> {
        let mut rows: Vec<Vec<Value>> = Vec::new();

        for record in self.reader.records() {
            let record = record.map_err(InfrastructureError::Csv)?;
            rows.push(record.iter().map(Value::infer).collect());
            if rows.len() >= self.chunk_size {
                break;
            }
        }

        if rows.is_empty() {
            return Ok(None);
        }
        let table = TransactionTable::new(self.headers.clone(), rows)?;
        Ok(Some(table))
    }
}

/// Serialize a scored table (source columns plus the five derived columns)
/// and write it atomically.
pub fn write_scored_csv(table: &TransactionTable, path: &Path) -> Result<(), PolicyGuardError> {
    let bytes = scored_csv_bytes(table)?;
    atomic_write(path, bytes).map_err(PolicyGuardError::from)
}

/// The scored table as CSV bytes (used for both files and downloads).
pub fn scored_csv_bytes(table: &TransactionTable) -> Result<Vec<u8>, PolicyGuardError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(table.export_header())
        .map_err(InfrastructureError::Csv)?;
    for row in 0..table.len() {
        writer
            .write_record(table.export_row(row))
            .map_err(InfrastructureError::Csv)?;
    }
    writer
        .into_inner()
        .map_err(|e| PolicyGuardError::InternalError(format!("CSV buffer flush: {}", e)))
}

/// Read a whole CSV back as strings, headers first. Used to re-load scored
/// output for reporting without re-inferring cell types.
pub fn read_csv_strings(
    path: &Path,
) -> Result<(Vec<String>, Vec<Vec<String>>), InfrastructureError> {
    let file = File::open(path)?;
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(file);
    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(|c| c.to_string()).collect());
    }
    Ok((headers, rows))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::io::Write;

    const SAMPLE: &str = "\
Timestamp,From Bank,Amount Received,Amount Paid,Payment Format
2022-09-01 00:08,10,15000,15000,Cash
2022-09-01 00:21,3208,500,,Cheque
2022-09-01 01:10,12,250000,249000,Wire
";

    fn write_sample(dir: &tempfile::TempDir) -> Result<std::path::PathBuf> {
        let path = dir.path().join("transactions.csv");
        let mut f = File::create(&path)?;
        f.write_all(SAMPLE.as_bytes())?;
        Ok(path)
    }

    #[test]
    fn test_reads_whole_file_in_one_chunk() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = write_sample(&dir)?;
        let mut reader = ChunkedCsvReader::open(&path, 50_000)?;
        let chunk = reader.next_chunk()?.unwrap();
        assert_eq!(chunk.len(), 3);
        assert_eq!(chunk.columns()[2], "Amount Received");
        assert_eq!(chunk.cell(0, 2), &Value::Int(15_000));
        assert_eq!(chunk.cell(1, 3), &Value::Null); // empty Amount Paid
        assert!(reader.next_chunk()?.is_none());
        Ok(())
    }

    #[test]
    fn test_chunking_splits_and_preserves_order() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = write_sample(&dir)?;
        let mut reader = ChunkedCsvReader::open(&path, 2)?;
        let first = reader.next_chunk()?.unwrap();
        let second = reader.next_chunk()?.unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 1);
        assert_eq!(second.cell(0, 4), &Value::Str("Wire".into()));
        assert!(reader.next_chunk()?.is_none());
        Ok(())
    }

    #[test]
    fn test_ragged_row_is_fatal() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("bad.csv");
        let mut f = File::create(&path)?;
        f.write_all(b"A,B\n1,2\n3\n")?;
        let mut reader = ChunkedCsvReader::open(&path, 10)?;
        assert!(reader.next_chunk().is_err());
        Ok(())
    }

    #[test]
    fn test_scored_csv_round_trip() -> Result<()> {
        let mut table = TransactionTable::new(
            vec!["Amount_Received".into()],
            vec![vec![Value::Int(15_000)]],
        )?;
        table.analysis_mut()[0].anomaly = true;
        let bytes = scored_csv_bytes(&table)?;
        let text = String::from_utf8(bytes)?;
        assert!(text.starts_with(
            "Amount_Received,Violated_Rule,Violation_Reason,Anomaly_Flag,Risk_Score,Risk_Level"
        ));
        assert!(text.contains("15000,,,True,0,Low"));
        Ok(())
    }
}
