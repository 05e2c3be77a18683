use crate::utils::error::{EtlError, Result, TaskError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One unit of work: a source row and the value posted for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub row_index: usize,
    pub input_value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub name: String,
    pub url: String,
    /// Appended to every output column this endpoint writes.
    #[serde(default)]
    pub column_suffix: String,
}

impl Endpoint {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            column_suffix: String::new(),
        }
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.column_suffix = suffix.into();
        self
    }

    pub fn column(&self, base: &str) -> String {
        format!("{}{}", base, self.column_suffix)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(serde_json::Map<String, serde_json::Value>),
    Failure(TaskError),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskResult {
    pub row_index: usize,
    pub endpoint_name: String,
    pub outcome: Outcome,
}

/// Header row plus string cells, the in-memory form of a CSV file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width.max(row.len()), String::new());
                row
            })
            .collect();
        Self { headers, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.column_index(column)?;
        self.rows.get(row)?.get(col).map(String::as_str)
    }

    /// Appends `name` as an empty column unless it already exists.
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(idx) = self.column_index(name) {
            return idx;
        }
        self.headers.push(name.to_string());
        for row in &mut self.rows {
            row.push(String::new());
        }
        self.headers.len() - 1
    }
}

/// Row-indexed output store. Every cell is writable once per run.
#[derive(Debug, Clone)]
pub struct OutputTable {
    table: Table,
    written: HashSet<(usize, usize)>,
}

impl OutputTable {
    pub fn new(mut table: Table, columns: &[String]) -> Self {
        for column in columns {
            table.ensure_column(column);
        }
        Self {
            table,
            written: HashSet::new(),
        }
    }

    pub fn set(&mut self, row: usize, column: &str, value: impl Into<String>) -> Result<()> {
        let col = self
            .table
            .column_index(column)
            .ok_or_else(|| EtlError::ProcessingError {
                message: format!("Output column '{}' was not declared", column),
            })?;
        let row_count = self.table.row_count();
        let cells = self
            .table
            .rows
            .get_mut(row)
            .ok_or_else(|| EtlError::ProcessingError {
                message: format!("Row {} is out of range ({} rows)", row, row_count),
            })?;
        if !self.written.insert((row, col)) {
            return Err(EtlError::ProcessingError {
                message: format!("Cell ({}, '{}') was already written in this run", row, column),
            });
        }
        cells[col] = value.into();
        Ok(())
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        self.table.cell(row, column)
    }

    pub fn writes(&self) -> usize {
        self.written.len()
    }

    pub fn row_count(&self) -> usize {
        self.table.row_count()
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn into_table(self) -> Table {
        self.table
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchSummary {
    pub submitted: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl DispatchSummary {
    pub fn record(&mut self, outcome: &Outcome) {
        if outcome.is_success() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnrichedTable {
    pub table: OutputTable,
    pub summary: DispatchSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub output_path: String,
    pub rows: usize,
    pub summary: DispatchSummary,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}
