// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeSet;

use crate::{CellRef, ControlAction, StorageError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SheetMode {
    #[default]
    Viewing,
    EditingClean,
    EditingDirty,
}

impl SheetMode {
    pub const fn is_editing(self) -> bool {
        !matches!(self, Self::Viewing)
    }

    pub const fn is_dirty(self) -> bool {
        matches!(self, Self::EditingDirty)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Viewing => "VIEW",
            Self::EditingClean => "EDIT",
            Self::EditingDirty => "EDIT*",
        }
    }
}

/// Enablement of the three controls. Always derived from [`SheetMode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlStates {
    pub editing: bool,
    pub save_enabled: bool,
    pub undo_enabled: bool,
}

impl ControlStates {
    pub const fn for_mode(mode: SheetMode) -> Self {
        Self {
            editing: mode.is_editing(),
            save_enabled: mode.is_editing() && mode.is_dirty(),
            undo_enabled: mode.is_editing(),
        }
    }

    pub const fn enabled(self, action: ControlAction) -> bool {
        match action {
            ControlAction::ToggleEdit => true,
            ControlAction::Save => self.save_enabled,
            ControlAction::Undo => self.undo_enabled,
        }
    }

    pub const fn edit_label(self) -> &'static str {
        if self.editing { "Stop" } else { "Edit" }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetCommand {
    ToggleEdit,
    CellModified(CellRef),
    SaveSucceeded,
    SaveFailed(StorageError),
    Undo,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetEvent {
    ModeChanged(SheetMode),
    CellsUnlocked,
    CellsLocked,
    CellMarkedDirty(CellRef),
    DirtyMarkersCleared,
    Saved,
    SaveFailed(StorageError),
    Restored,
    ControlsChanged(ControlStates),
}

/// Edit-mode state machine. Pure: commands in, events out, no page access.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetState {
    mode: SheetMode,
    dirty_cells: BTreeSet<CellRef>,
}

impl SheetState {
    pub const fn mode(&self) -> SheetMode {
        self.mode
    }

    pub const fn is_editing(&self) -> bool {
        self.mode.is_editing()
    }

    pub const fn is_dirty(&self) -> bool {
        self.mode.is_dirty()
    }

    pub fn dirty_cells(&self) -> &BTreeSet<CellRef> {
        &self.dirty_cells
    }

    pub const fn controls(&self) -> ControlStates {
        ControlStates::for_mode(self.mode)
    }

    pub fn dispatch(&mut self, command: SheetCommand) -> Vec<SheetEvent> {
        let mut events = match command {
            SheetCommand::ToggleEdit => self.toggle_edit(),
            SheetCommand::CellModified(cell) => self.cell_modified(cell),
            SheetCommand::SaveSucceeded => {
                if self.mode != SheetMode::EditingDirty {
                    return Vec::new();
                }
                let mut events = self.settle();
                events.insert(0, SheetEvent::Saved);
                events
            }
            SheetCommand::SaveFailed(error) => {
                if self.mode != SheetMode::EditingDirty {
                    return Vec::new();
                }
                vec![SheetEvent::SaveFailed(error)]
            }
            SheetCommand::Undo => {
                if !self.is_editing() {
                    return Vec::new();
                }
                let mut events = self.settle();
                events.insert(0, SheetEvent::Restored);
                events
            }
        };
        if !events.is_empty() {
            events.push(SheetEvent::ControlsChanged(self.controls()));
        }
        events
    }

    fn toggle_edit(&mut self) -> Vec<SheetEvent> {
        let had_markers = !self.dirty_cells.is_empty();
        self.dirty_cells.clear();
        if self.is_editing() {
            self.mode = SheetMode::Viewing;
            let mut events = vec![SheetEvent::ModeChanged(self.mode), SheetEvent::CellsLocked];
            if had_markers {
                events.push(SheetEvent::DirtyMarkersCleared);
            }
            events
        } else {
            self.mode = SheetMode::EditingClean;
            vec![SheetEvent::ModeChanged(self.mode), SheetEvent::CellsUnlocked]
        }
    }

    fn cell_modified(&mut self, cell: CellRef) -> Vec<SheetEvent> {
        if !self.is_editing() {
            return Vec::new();
        }
        let mut events = Vec::new();
        if self.mode != SheetMode::EditingDirty {
            self.mode = SheetMode::EditingDirty;
            events.push(SheetEvent::ModeChanged(self.mode));
        }
        if self.dirty_cells.insert(cell) {
            events.push(SheetEvent::CellMarkedDirty(cell));
        }
        events
    }

    /// Back to a clean editing state after a save or an undo.
    fn settle(&mut self) -> Vec<SheetEvent> {
        let mut events = Vec::new();
        if self.mode != SheetMode::EditingClean {
            self.mode = SheetMode::EditingClean;
            events.push(SheetEvent::ModeChanged(self.mode));
        }
        if !self.dirty_cells.is_empty() {
            self.dirty_cells.clear();
            events.push(SheetEvent::DirtyMarkersCleared);
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::{ControlStates, SheetCommand, SheetEvent, SheetMode, SheetState};
    use crate::{CellRef, ControlAction, StorageError};

    fn editing_dirty() -> SheetState {
        let mut state = SheetState::default();
        state.dispatch(SheetCommand::ToggleEdit);
        state.dispatch(SheetCommand::CellModified(CellRef::new(0, 2)));
        state
    }

    #[test]
    fn starts_viewing_with_controls_disabled() {
        let state = SheetState::default();
        assert_eq!(state.mode(), SheetMode::Viewing);
        assert!(!state.controls().save_enabled);
        assert!(!state.controls().undo_enabled);
        assert_eq!(state.controls().edit_label(), "Edit");
    }

    #[test]
    fn entering_edit_mode_enables_undo_only() {
        let mut state = SheetState::default();
        let events = state.dispatch(SheetCommand::ToggleEdit);
        assert_eq!(state.mode(), SheetMode::EditingClean);
        assert_eq!(
            events,
            vec![
                SheetEvent::ModeChanged(SheetMode::EditingClean),
                SheetEvent::CellsUnlocked,
                SheetEvent::ControlsChanged(ControlStates {
                    editing: true,
                    save_enabled: false,
                    undo_enabled: true,
                }),
            ]
        );
    }

    #[test]
    fn first_modification_marks_cell_and_enables_save() {
        let mut state = SheetState::default();
        state.dispatch(SheetCommand::ToggleEdit);
        let cell = CellRef::new(0, 2);
        let events = state.dispatch(SheetCommand::CellModified(cell));
        assert!(state.is_dirty());
        assert_eq!(
            events,
            vec![
                SheetEvent::ModeChanged(SheetMode::EditingDirty),
                SheetEvent::CellMarkedDirty(cell),
                SheetEvent::ControlsChanged(ControlStates {
                    editing: true,
                    save_enabled: true,
                    undo_enabled: true,
                }),
            ]
        );

        let again = state.dispatch(SheetCommand::CellModified(cell));
        assert!(again.is_empty(), "re-editing a marked cell changes nothing");
        assert!(state.controls().save_enabled);
    }

    #[test]
    fn modification_while_viewing_is_ignored() {
        let mut state = SheetState::default();
        let events = state.dispatch(SheetCommand::CellModified(CellRef::new(1, 1)));
        assert!(events.is_empty());
        assert!(!state.is_dirty());
        assert!(state.dirty_cells().is_empty());
    }

    #[test]
    fn leaving_edit_mode_clears_dirty_and_markers() {
        let mut state = editing_dirty();
        let events = state.dispatch(SheetCommand::ToggleEdit);
        assert_eq!(state.mode(), SheetMode::Viewing);
        assert!(!state.is_dirty());
        assert!(state.dirty_cells().is_empty());
        assert!(events.contains(&SheetEvent::CellsLocked));
        assert!(events.contains(&SheetEvent::DirtyMarkersCleared));
        assert_eq!(
            events.last(),
            Some(&SheetEvent::ControlsChanged(ControlStates {
                editing: false,
                save_enabled: false,
                undo_enabled: false,
            }))
        );
    }

    #[test]
    fn reentering_edit_mode_starts_clean() {
        let mut state = editing_dirty();
        state.dispatch(SheetCommand::ToggleEdit);
        state.dispatch(SheetCommand::ToggleEdit);
        assert_eq!(state.mode(), SheetMode::EditingClean);
        assert!(!state.controls().save_enabled);
    }

    #[test]
    fn save_success_returns_to_clean_editing() {
        let mut state = editing_dirty();
        let events = state.dispatch(SheetCommand::SaveSucceeded);
        assert_eq!(state.mode(), SheetMode::EditingClean);
        assert_eq!(events.first(), Some(&SheetEvent::Saved));
        assert!(events.contains(&SheetEvent::DirtyMarkersCleared));
        assert!(!state.controls().save_enabled);
        assert!(state.controls().undo_enabled);
    }

    #[test]
    fn save_failure_keeps_dirty_state() {
        let mut state = editing_dirty();
        let events = state.dispatch(SheetCommand::SaveFailed(StorageError::QuotaExceeded));
        assert_eq!(state.mode(), SheetMode::EditingDirty);
        assert_eq!(state.dirty_cells().len(), 1);
        assert_eq!(
            events,
            vec![
                SheetEvent::SaveFailed(StorageError::QuotaExceeded),
                SheetEvent::ControlsChanged(ControlStates {
                    editing: true,
                    save_enabled: true,
                    undo_enabled: true,
                }),
            ]
        );
    }

    #[test]
    fn save_outcomes_are_ignored_while_clean() {
        let mut state = SheetState::default();
        state.dispatch(SheetCommand::ToggleEdit);
        assert!(state.dispatch(SheetCommand::SaveSucceeded).is_empty());
        assert!(
            state
                .dispatch(SheetCommand::SaveFailed(StorageError::QuotaExceeded))
                .is_empty()
        );
        assert_eq!(state.mode(), SheetMode::EditingClean);
    }

    #[test]
    fn undo_returns_to_clean_editing() {
        let mut state = editing_dirty();
        let events = state.dispatch(SheetCommand::Undo);
        assert_eq!(state.mode(), SheetMode::EditingClean);
        assert_eq!(events.first(), Some(&SheetEvent::Restored));
        assert!(state.dirty_cells().is_empty());
    }

    #[test]
    fn save_and_undo_are_ignored_while_viewing() {
        let mut state = SheetState::default();
        assert!(state.dispatch(SheetCommand::SaveSucceeded).is_empty());
        assert!(state.dispatch(SheetCommand::Undo).is_empty());
        assert!(
            state
                .dispatch(SheetCommand::SaveFailed(StorageError::AccessDenied))
                .is_empty()
        );
        assert_eq!(state.mode(), SheetMode::Viewing);
    }

    #[test]
    fn control_enablement_follows_mode_for_every_state() {
        for mode in [
            SheetMode::Viewing,
            SheetMode::EditingClean,
            SheetMode::EditingDirty,
        ] {
            let controls = ControlStates::for_mode(mode);
            assert!(controls.enabled(ControlAction::ToggleEdit));
            assert_eq!(
                controls.enabled(ControlAction::Save),
                mode.is_editing() && mode.is_dirty()
            );
            assert_eq!(controls.enabled(ControlAction::Undo), mode.is_editing());
        }
    }
}
