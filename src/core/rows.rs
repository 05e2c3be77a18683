use crate::domain::model::{Table, WorkItem};

/// One work item per table row, in row order. Blank cells and a missing
/// URL column both yield `input_value: None`.
pub fn work_items(table: &Table, url_column: &str) -> Vec<WorkItem> {
    let column = table.column_index(url_column);
    if column.is_none() {
        tracing::warn!(
            "⚠️ Column '{}' not found in input; every row will be marked as missing a value",
            url_column
        );
    }

    table
        .rows
        .iter()
        .enumerate()
        .map(|(row_index, row)| {
            let input_value = column
                .and_then(|col| row.get(col))
                .map(|cell| cell.trim())
                .filter(|cell| !cell.is_empty())
                .map(str::to_string);
            WorkItem {
                row_index,
                input_value,
            }
        })
        .collect()
}
