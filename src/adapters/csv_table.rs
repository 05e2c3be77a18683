//! CSV codec for [`Table`]. The first record is the header row.

use crate::domain::model::Table;
use crate::utils::error::{EtlError, Result};

pub fn read_table(data: &[u8]) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(EtlError::ProcessingError {
            message: "Input table has no header row".to_string(),
        });
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.len() > headers.len() {
            let line = record.position().map_or(0, |p| p.line());
            return Err(EtlError::ProcessingError {
                message: format!(
                    "Line {} has {} fields but the header has {}",
                    line,
                    record.len(),
                    headers.len()
                ),
            });
        }
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(Table::new(headers, rows))
}

pub fn write_table(table: &Table) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());

    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }

    writer.into_inner().map_err(|e| EtlError::IoError(e.into_error()))
}
