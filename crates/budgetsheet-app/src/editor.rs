// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

use crate::{
    CellRef, ControlAction, ControlsContainer, Markers, Page, SheetCommand, SheetEvent, SheetKey,
    SheetLocation, SheetMode, SheetState, SheetStorage, SheetTable, Snapshot, capture,
    inject_controls, load_snapshot, restore, save_snapshot, sync_controls,
};

/// One page's budget sheet editor. Owns the page model but only touches the
/// table and controls container named by its [`SheetLocation`].
#[derive(Debug)]
pub struct BudgetSheetEditor<S> {
    page: Page,
    location: SheetLocation,
    markers: Markers,
    key: SheetKey,
    storage: S,
    state: SheetState,
    original: Snapshot,
    saved: Option<Snapshot>,
    notice: Option<String>,
}

impl<S: SheetStorage> BudgetSheetEditor<S> {
    /// Captures the original content, applies any saved snapshot, and
    /// injects the controls. Calling this again on the same page replaces
    /// the buttons rather than adding a second set.
    pub fn init(
        page: Page,
        location: SheetLocation,
        markers: Markers,
        storage: S,
    ) -> Result<Self> {
        if location.table >= page.tables.len() {
            bail!(
                "sheet table index {} is out of range for page {:?} with {} tables",
                location.table,
                page.path,
                page.tables.len()
            );
        }
        if let Some(controls) = location.controls
            && controls >= page.controls.len()
        {
            bail!(
                "controls index {} is out of range for page {:?} with {} containers",
                controls,
                page.path,
                page.controls.len()
            );
        }

        let key = SheetKey::from_path(&page.path);
        let original = capture(&page.tables[location.table], &markers);
        let saved = load_snapshot(&storage, &key);

        let mut editor = Self {
            page,
            location,
            markers,
            key,
            storage,
            state: SheetState::default(),
            original,
            saved,
            notice: None,
        };

        if let Some(saved) = &editor.saved {
            restore(
                &mut editor.page.tables[editor.location.table],
                saved,
                &editor.markers,
            );
        }
        if let Some(index) = editor.location.controls {
            inject_controls(&mut editor.page.controls[index], &editor.markers);
        }
        let controls = editor.state.controls();
        editor.apply(&[SheetEvent::CellsLocked, SheetEvent::ControlsChanged(controls)]);

        info!(
            key = %editor.key,
            rows = editor.original.row_count(),
            restored = editor.saved.is_some(),
            controls = editor.location.controls.is_some(),
            "budget sheet editor ready"
        );
        Ok(editor)
    }

    pub fn key(&self) -> &SheetKey {
        &self.key
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn markers(&self) -> &Markers {
        &self.markers
    }

    pub fn table(&self) -> &SheetTable {
        &self.page.tables[self.location.table]
    }

    pub fn controls(&self) -> Option<&ControlsContainer> {
        self.location
            .controls
            .and_then(|index| self.page.controls.get(index))
    }

    pub fn state(&self) -> &SheetState {
        &self.state
    }

    pub fn mode(&self) -> SheetMode {
        self.state.mode()
    }

    pub fn dirty_cells(&self) -> &BTreeSet<CellRef> {
        self.state.dirty_cells()
    }

    pub fn original_snapshot(&self) -> &Snapshot {
        &self.original
    }

    pub fn saved_snapshot(&self) -> Option<&Snapshot> {
        self.saved.as_ref()
    }

    pub fn current_snapshot(&self) -> Snapshot {
        capture(self.table(), &self.markers)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Message of the last failed save, until taken.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }

    pub fn into_parts(self) -> (Page, S) {
        (self.page, self.storage)
    }

    /// Whether `cell` currently accepts input: editable, and not a label cell.
    pub fn accepts_input(&self, cell: CellRef) -> bool {
        self.table()
            .cell(cell)
            .is_some_and(|live| live.editable && !live.has_class(&self.markers.label_column))
    }

    /// Click on one of the three controls. Disabled controls do nothing.
    pub fn press(&mut self, action: ControlAction) -> Vec<SheetEvent> {
        if !self.state.controls().enabled(action) {
            debug!(action = action.as_str(), "ignoring press on disabled control");
            return Vec::new();
        }
        match action {
            ControlAction::ToggleEdit => self.toggle_edit(),
            ControlAction::Save => self.save(),
            ControlAction::Undo => self.undo(),
        }
    }

    pub fn toggle_edit(&mut self) -> Vec<SheetEvent> {
        self.run(SheetCommand::ToggleEdit)
    }

    /// Input landing on `cell`. Ignored unless the cell accepts input.
    pub fn input(&mut self, cell: CellRef, text: &str) -> Vec<SheetEvent> {
        if !self.state.is_editing() || !self.accepts_input(cell) {
            debug!(row = cell.row, column = cell.column, "ignoring input on locked cell");
            return Vec::new();
        }
        let Some(live) = self.page.tables[self.location.table].cell_mut(cell) else {
            return Vec::new();
        };
        if live.text == text {
            debug!(row = cell.row, column = cell.column, "input left cell unchanged");
            return Vec::new();
        }
        text.clone_into(&mut live.text);
        self.run(SheetCommand::CellModified(cell))
    }

    /// Writes the current content. Only a dirty sheet is written.
    pub fn save(&mut self) -> Vec<SheetEvent> {
        if !self.state.is_dirty() {
            debug!(key = %self.key, "nothing to save");
            return Vec::new();
        }
        let snapshot = self.current_snapshot();
        match save_snapshot(&mut self.storage, &self.key, &snapshot) {
            Ok(()) => {
                info!(key = %self.key, rows = snapshot.row_count(), "sheet saved");
                self.saved = Some(snapshot);
                self.run(SheetCommand::SaveSucceeded)
            }
            Err(error) => {
                warn!(key = %self.key, %error, "save aborted; edits kept in memory");
                self.notice = Some(error.user_message().to_owned());
                self.run(SheetCommand::SaveFailed(error))
            }
        }
    }

    /// Restores the last saved snapshot, or the original content if nothing
    /// was saved yet.
    pub fn undo(&mut self) -> Vec<SheetEvent> {
        if !self.state.is_editing() {
            return Vec::new();
        }
        let base = self.saved.as_ref().unwrap_or(&self.original);
        restore(
            &mut self.page.tables[self.location.table],
            base,
            &self.markers,
        );
        info!(key = %self.key, from_save = self.saved.is_some(), "sheet restored");
        self.run(SheetCommand::Undo)
    }

    fn run(&mut self, command: SheetCommand) -> Vec<SheetEvent> {
        let events = self.state.dispatch(command);
        self.apply(&events);
        events
    }

    fn apply(&mut self, events: &[SheetEvent]) {
        let markers = &self.markers;
        let table = &mut self.page.tables[self.location.table];
        for event in events {
            match event {
                SheetEvent::ModeChanged(mode) => {
                    debug!(key = %self.key, mode = mode.label(), "mode changed");
                }
                SheetEvent::CellsUnlocked => set_cells_editable(table, markers, true),
                SheetEvent::CellsLocked => set_cells_editable(table, markers, false),
                SheetEvent::CellMarkedDirty(cell) => {
                    if let Some(live) = table.cell_mut(*cell) {
                        live.toggle_class(&markers.dirty_cell, true);
                    }
                }
                SheetEvent::DirtyMarkersCleared => clear_dirty_markers(table, markers),
                SheetEvent::ControlsChanged(controls) => {
                    if let Some(container) = self
                        .location
                        .controls
                        .and_then(|index| self.page.controls.get_mut(index))
                    {
                        sync_controls(container, *controls, markers);
                    }
                }
                SheetEvent::Saved | SheetEvent::SaveFailed(_) | SheetEvent::Restored => {}
            }
        }
    }
}

fn set_cells_editable(table: &mut SheetTable, markers: &Markers, editable: bool) {
    for row in &mut table.rows {
        for cell in row.editable_cells_mut(&markers.label_column) {
            cell.editable = editable;
            cell.toggle_class(&markers.editable_cell, editable);
            if !editable {
                cell.toggle_class(&markers.dirty_cell, false);
            }
        }
    }
}

fn clear_dirty_markers(table: &mut SheetTable, markers: &Markers) {
    for row in &mut table.rows {
        for cell in &mut row.cells {
            cell.toggle_class(&markers.dirty_cell, false);
        }
    }
}
