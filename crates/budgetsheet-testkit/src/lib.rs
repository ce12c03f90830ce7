// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use budgetsheet_app::{
    ControlsContainer, MemoryStorage, Page, SheetStorage, SheetTable, StorageError, TableCell,
    TableRow,
};
use std::collections::BTreeSet;
use std::path::PathBuf;

pub const TABLE_CLASS: &str = "excel-table";
pub const LABEL_CLASS: &str = "col-a";
pub const CONTROLS_CLASS: &str = "excel-controls";

const PROGRAMS: [&str; 16] = [
    "Road Maintenance",
    "Public Transit",
    "Parks and Recreation",
    "Public Library",
    "Fire Services",
    "Police Services",
    "Emergency Management",
    "Water Utility",
    "Wastewater Treatment",
    "Solid Waste",
    "Housing Assistance",
    "Public Health",
    "Building Inspections",
    "Economic Development",
    "Information Technology",
    "Records and Licensing",
];

const QUARTERS: [&str; 4] = ["Q1", "Q2", "Q3", "Q4"];

pub const DEMO_SEED: u64 = 2026;
pub const DEMO_PATH: &str = "/budgets/fy2026-operating.html";

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// One budget line: a program name and its quarterly amounts in thousands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetLine {
    pub program: String,
    pub quarters: [u32; 4],
}

impl BudgetLine {
    pub fn total(&self) -> u32 {
        self.quarters.iter().sum()
    }
}

/// Seeded generator of plausible municipal budget tables.
#[derive(Debug, Clone)]
pub struct BudgetFaker {
    rng: DeterministicRng,
}

impl BudgetFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
        }
    }

    pub fn budget_line(&mut self) -> BudgetLine {
        let program = PROGRAMS[self.rng.int_n(PROGRAMS.len())].to_owned();
        let base = 150 + self.rng.int_n(4_850) as u32;
        let mut quarters = [0_u32; 4];
        for quarter in &mut quarters {
            let swing = self.rng.int_n(21) as u32;
            // +/- 10% around the base, in whole thousands.
            *quarter = base * (90 + swing) / 100;
        }
        BudgetLine {
            program,
            quarters,
        }
    }

    /// Distinct programs, in generation order.
    pub fn budget_lines(&mut self, count: usize) -> Vec<BudgetLine> {
        let mut seen = BTreeSet::new();
        let mut lines = Vec::with_capacity(count);
        let mut attempts = 0;
        while lines.len() < count.min(PROGRAMS.len()) && attempts < count * 64 {
            attempts += 1;
            let line = self.budget_line();
            if seen.insert(line.program.clone()) {
                lines.push(line);
            }
        }
        lines
    }

    pub fn page(&mut self, path: &str, rows: usize) -> Page {
        let lines = self.budget_lines(rows);
        let table_rows = lines
            .iter()
            .map(|line| TableRow {
                cells: std::iter::once(label_cell(&line.program))
                    .chain(line.quarters.iter().map(|amount| TableCell::text(amount.to_string())))
                    .collect(),
            })
            .collect();
        let mut header = vec!["Program".to_owned()];
        header.extend(QUARTERS.iter().map(|quarter| (*quarter).to_owned()));
        Page {
            path: path.to_owned(),
            title: "Operating Budget (thousands USD)".to_owned(),
            tables: vec![SheetTable {
                classes: BTreeSet::from([TABLE_CLASS.to_owned()]),
                header,
                rows: table_rows,
            }],
            controls: vec![controls_container()],
        }
    }
}

pub fn demo_page() -> Page {
    BudgetFaker::new(DEMO_SEED).page(DEMO_PATH, 8)
}

/// Page with one marked table and one controls container. The first value
/// of every row is placed in the label column.
pub fn budget_page(path: &str, rows: &[&[&str]]) -> Page {
    Page {
        path: path.to_owned(),
        title: String::new(),
        tables: vec![budget_table(rows)],
        controls: vec![controls_container()],
    }
}

pub fn budget_table(rows: &[&[&str]]) -> SheetTable {
    SheetTable {
        classes: BTreeSet::from([TABLE_CLASS.to_owned()]),
        header: Vec::new(),
        rows: rows
            .iter()
            .map(|values| TableRow {
                cells: values
                    .iter()
                    .enumerate()
                    .map(|(column, value)| {
                        if column == 0 {
                            label_cell(value)
                        } else {
                            TableCell::text(*value)
                        }
                    })
                    .collect(),
            })
            .collect(),
    }
}

pub fn controls_container() -> ControlsContainer {
    ControlsContainer {
        classes: BTreeSet::from([CONTROLS_CLASS.to_owned()]),
        buttons: Vec::new(),
    }
}

fn label_cell(text: &str) -> TableCell {
    TableCell::text(text).with_class(LABEL_CLASS)
}

/// Text of every cell, label column included.
pub fn table_texts(table: &SheetTable) -> Vec<Vec<String>> {
    table
        .rows
        .iter()
        .map(|row| row.cells.iter().map(|cell| cell.text.clone()).collect())
        .collect()
}

/// Reads pass through to an in-memory store; writes fail with a fixed error
/// until [`FailingStorage::recover`] is called.
#[derive(Debug, Clone)]
pub struct FailingStorage {
    inner: MemoryStorage,
    write_error: Option<StorageError>,
    failed_writes: usize,
}

impl FailingStorage {
    pub fn new(inner: MemoryStorage, write_error: StorageError) -> Self {
        Self {
            inner,
            write_error: Some(write_error),
            failed_writes: 0,
        }
    }

    pub fn recover(&mut self) {
        self.write_error = None;
    }

    pub fn failed_writes(&self) -> usize {
        self.failed_writes
    }

    pub fn inner(&self) -> &MemoryStorage {
        &self.inner
    }
}

impl SheetStorage for FailingStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Some(error) = &self.write_error {
            self.failed_writes += 1;
            return Err(error.clone());
        }
        self.inner.set(key, value)
    }
}

pub fn temp_db_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let db_path = dir.path().join("budgetsheet.db");
    Ok((dir, db_path))
}
