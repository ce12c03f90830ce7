// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const DEFAULT_TABLE_CLASS: &str = "excel-table";
pub const DEFAULT_LABEL_CLASS: &str = "col-a";
pub const DEFAULT_CONTROLS_CLASS: &str = "excel-controls";

/// Class names the editor reads from and writes to the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Markers {
    pub table: String,
    pub label_column: String,
    pub controls: String,
    pub editor_button: String,
    pub editable_cell: String,
    pub dirty_cell: String,
    pub secondary_button: String,
    pub danger_button: String,
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            table: DEFAULT_TABLE_CLASS.to_owned(),
            label_column: DEFAULT_LABEL_CLASS.to_owned(),
            controls: DEFAULT_CONTROLS_CLASS.to_owned(),
            editor_button: "editor-btn".to_owned(),
            editable_cell: "cell-editable".to_owned(),
            dirty_cell: "cell-dirty".to_owned(),
            secondary_button: "secondary".to_owned(),
            danger_button: "danger".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub path: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub tables: Vec<SheetTable>,
    #[serde(default)]
    pub controls: Vec<ControlsContainer>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetTable {
    #[serde(default)]
    pub classes: BTreeSet<String>,
    #[serde(default)]
    pub header: Vec<String>,
    #[serde(default)]
    pub rows: Vec<TableRow>,
}

impl SheetTable {
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }

    pub fn cell(&self, cell: CellRef) -> Option<&TableCell> {
        self.rows.get(cell.row)?.cells.get(cell.column)
    }

    pub fn cell_mut(&mut self, cell: CellRef) -> Option<&mut TableCell> {
        self.rows.get_mut(cell.row)?.cells.get_mut(cell.column)
    }

    pub fn column_count(&self) -> usize {
        self.rows
            .iter()
            .map(|row| row.cells.len())
            .max()
            .unwrap_or(0)
            .max(self.header.len())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    #[serde(default)]
    pub cells: Vec<TableCell>,
}

impl TableRow {
    /// Cells outside the label column, in column order, with their full column index.
    pub fn editable_cells<'a>(
        &'a self,
        label_class: &'a str,
    ) -> impl Iterator<Item = (usize, &'a TableCell)> + 'a {
        self.cells
            .iter()
            .enumerate()
            .filter(move |(_, cell)| !cell.has_class(label_class))
    }

    pub fn editable_cells_mut<'a>(
        &'a mut self,
        label_class: &'a str,
    ) -> impl Iterator<Item = &'a mut TableCell> + 'a {
        self.cells
            .iter_mut()
            .filter(move |cell| !cell.has_class(label_class))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCell {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub classes: BTreeSet<String>,
    #[serde(default)]
    pub editable: bool,
}

impl TableCell {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.insert(class.into());
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }

    pub fn toggle_class(&mut self, class: &str, on: bool) {
        if on {
            self.classes.insert(class.to_owned());
        } else {
            self.classes.remove(class);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlsContainer {
    #[serde(default)]
    pub classes: BTreeSet<String>,
    #[serde(default)]
    pub buttons: Vec<Button>,
}

impl ControlsContainer {
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }

    pub fn button(&self, action: ControlAction) -> Option<&Button> {
        self.buttons
            .iter()
            .find(|button| button.action == Some(action))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub label: String,
    #[serde(default)]
    pub classes: BTreeSet<String>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub action: Option<ControlAction>,
}

impl Button {
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ControlAction {
    ToggleEdit,
    Save,
    Undo,
}

impl ControlAction {
    pub const ALL: [Self; 3] = [Self::ToggleEdit, Self::Save, Self::Undo];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ToggleEdit => "toggle_edit",
            Self::Save => "save",
            Self::Undo => "undo",
        }
    }
}

/// Position of a live cell: body row index and full column index (label column included).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct CellRef {
    pub row: usize,
    pub column: usize,
}

impl CellRef {
    pub const fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

#[cfg(test)]
mod tests {
    use super::{CellRef, Page, SheetTable, TableCell, TableRow};

    #[test]
    fn editable_cells_skip_label_column() {
        let row = TableRow {
            cells: vec![
                TableCell::text("Revenue").with_class("col-a"),
                TableCell::text("10"),
                TableCell::text("20"),
            ],
        };
        let columns = row
            .editable_cells("col-a")
            .map(|(column, cell)| (column, cell.text.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(columns, vec![(1, "10"), (2, "20")]);
    }

    #[test]
    fn cell_lookup_returns_none_out_of_range() {
        let table = SheetTable {
            rows: vec![TableRow {
                cells: vec![TableCell::text("1")],
            }],
            ..SheetTable::default()
        };
        assert_eq!(
            table.cell(CellRef::new(0, 0)).map(|cell| cell.text.as_str()),
            Some("1")
        );
        assert!(table.cell(CellRef::new(0, 1)).is_none());
        assert!(table.cell(CellRef::new(3, 0)).is_none());
    }

    #[test]
    fn page_deserializes_with_missing_optional_fields() {
        let page: Page = serde_json::from_str(
            r#"{"path":"/budgets/q1.html","tables":[{"classes":["excel-table"],"rows":[{"cells":[{"text":"Revenue","classes":["col-a"]},{"text":"10"}]}]}]}"#,
        )
        .expect("page json should parse");
        assert_eq!(page.tables.len(), 1);
        assert!(page.controls.is_empty());
        let row = &page.tables[0].rows[0];
        assert!(row.cells[0].has_class("col-a"));
        assert!(!row.cells[1].editable);
    }
}
