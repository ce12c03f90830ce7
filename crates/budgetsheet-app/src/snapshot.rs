// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::Serialize;
use serde_json::Value;

use crate::{Markers, SheetTable};

/// Editable cell text of a table, row by row, label column excluded.
///
/// Values decoded from storage may contain holes (`None`) where the stored
/// JSON held something other than a string; holes never overwrite a cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Snapshot {
    rows: Vec<Vec<Option<String>>>,
}

impl Snapshot {
    pub fn from_rows<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(|value| Some(value.into())).collect())
                .collect(),
        }
    }

    /// Lenient conversion from parsed JSON: non-array rows become empty rows,
    /// non-string values become holes. Returns `None` if `value` is not an array.
    pub fn from_json(value: &Value) -> Option<Self> {
        let rows = value.as_array()?;
        let rows = rows
            .iter()
            .map(|row| match row.as_array() {
                Some(values) => values
                    .iter()
                    .map(|value| value.as_str().map(str::to_owned))
                    .collect(),
                None => Vec::new(),
            })
            .collect();
        Some(Self { rows })
    }

    pub fn rows(&self) -> &[Vec<Option<String>>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

pub fn capture(table: &SheetTable, markers: &Markers) -> Snapshot {
    let rows = table
        .rows
        .iter()
        .map(|row| {
            row.editable_cells(&markers.label_column)
                .map(|(_, cell)| Some(cell.text.clone()))
                .collect()
        })
        .collect();
    Snapshot { rows }
}

/// Writes snapshot values back by position. Shape mismatches are tolerated:
/// cells without a matching string value keep their text.
pub fn restore(table: &mut SheetTable, snapshot: &Snapshot, markers: &Markers) {
    for (row_index, row) in table.rows.iter_mut().enumerate() {
        let Some(values) = snapshot.rows.get(row_index) else {
            continue;
        };
        for (cell, value) in row.editable_cells_mut(&markers.label_column).zip(values) {
            if let Some(text) = value {
                cell.text.clone_from(text);
            }
        }
    }
}
