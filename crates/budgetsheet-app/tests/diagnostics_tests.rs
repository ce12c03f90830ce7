// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use budgetsheet_app::{
    BudgetSheetEditor, CellRef, ControlAction, Markers, MemoryStorage, SheetStorage, StorageError,
    locate_sheet,
};
use budgetsheet_testkit::{FailingStorage, budget_page};
use std::io;
use std::sync::{Arc, Mutex};

const Q1_KEY: &str = "budgetSheet:q1.html";

#[derive(Clone, Default)]
struct CapturedLog(Arc<Mutex<Vec<u8>>>);

impl CapturedLog {
    fn lines(&self) -> Vec<String> {
        let bytes = self.0.lock().map(|buf| buf.clone()).unwrap_or_default();
        String::from_utf8_lossy(&bytes)
            .lines()
            .map(str::to_owned)
            .collect()
    }
}

impl io::Write for CapturedLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Ok(mut captured) = self.0.lock() {
            captured.extend_from_slice(buf);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn with_captured_log<T>(run: impl FnOnce() -> T) -> (T, Vec<String>) {
    let log = CapturedLog::default();
    let writer = log.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::TRACE)
        .finish();
    let value = tracing::subscriber::with_default(subscriber, run);
    (value, log.lines())
}

fn q1_editor<S: SheetStorage>(storage: S) -> Result<BudgetSheetEditor<S>> {
    let page = budget_page(
        "/budgets/q1.html",
        &[&["Revenue", "10", "20"], &["Expenses", "30", "40"]],
    );
    let markers = Markers::default();
    let location = locate_sheet(&page, &markers)?;
    BudgetSheetEditor::init(page, location, markers, storage)
}

#[test]
fn malformed_stored_value_logs_a_warning_naming_the_key() -> Result<()> {
    let storage = MemoryStorage::new().with_entry(Q1_KEY, "{not valid");
    let (editor, lines) = with_captured_log(|| q1_editor(storage));
    assert_eq!(editor?.saved_snapshot(), None);
    assert!(
        lines
            .iter()
            .any(|line| line.contains("WARN") && line.contains(Q1_KEY)),
        "expected a WARN line naming {Q1_KEY}, got {lines:#?}"
    );
    Ok(())
}

#[test]
fn failed_save_logs_an_error_naming_the_key() -> Result<()> {
    let storage = FailingStorage::new(MemoryStorage::new(), StorageError::QuotaExceeded);
    let mut editor = q1_editor(storage)?;
    editor.press(ControlAction::ToggleEdit);
    editor.input(CellRef::new(0, 2), "99");

    let (_, lines) = with_captured_log(|| editor.press(ControlAction::Save));
    assert!(
        lines
            .iter()
            .any(|line| {
                line.contains("ERROR") && line.contains("save failed") && line.contains(Q1_KEY)
            }),
        "expected an ERROR line for the failed save, got {lines:#?}"
    );
    Ok(())
}

#[test]
fn clean_load_and_save_log_no_warnings() -> Result<()> {
    let (result, lines) = with_captured_log(|| -> Result<()> {
        let mut editor = q1_editor(MemoryStorage::new())?;
        editor.press(ControlAction::ToggleEdit);
        editor.input(CellRef::new(1, 1), "35");
        editor.press(ControlAction::Save);
        Ok(())
    });
    result?;
    assert!(
        lines
            .iter()
            .all(|line| !line.contains("WARN") && !line.contains("ERROR")),
        "unexpected diagnostics: {lines:#?}"
    );
    Ok(())
}
