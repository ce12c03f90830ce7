// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeSet;

use crate::{Button, ControlAction, ControlStates, ControlsContainer, Markers};

/// Replaces any previously injected editor buttons with a fresh Edit/Save/Undo set.
pub fn inject_controls(container: &mut ControlsContainer, markers: &Markers) {
    container
        .buttons
        .retain(|button| !button.has_class(&markers.editor_button));
    for action in ControlAction::ALL {
        container.buttons.push(editor_button(action, markers));
    }
}

/// Rewrites labels, variants, and disabled flags of the injected buttons.
pub fn sync_controls(
    container: &mut ControlsContainer,
    controls: ControlStates,
    markers: &Markers,
) {
    for button in &mut container.buttons {
        let Some(action) = button.action else {
            continue;
        };
        if !button.has_class(&markers.editor_button) {
            continue;
        }
        button.disabled = !controls.enabled(action);
        if action == ControlAction::ToggleEdit {
            controls.edit_label().clone_into(&mut button.label);
            if controls.editing {
                button.classes.remove(&markers.secondary_button);
            } else {
                button.classes.insert(markers.secondary_button.clone());
            }
        }
    }
}

fn editor_button(action: ControlAction, markers: &Markers) -> Button {
    let mut classes = BTreeSet::from([markers.editor_button.clone()]);
    let label = match action {
        ControlAction::ToggleEdit => {
            classes.insert(markers.secondary_button.clone());
            "Edit"
        }
        ControlAction::Save => "Save",
        ControlAction::Undo => {
            classes.insert(markers.danger_button.clone());
            "Undo"
        }
    };
    Button {
        label: label.to_owned(),
        classes,
        disabled: action != ControlAction::ToggleEdit,
        action: Some(action),
    }
}

#[cfg(test)]
mod tests {
    use super::{inject_controls, sync_controls};
    use crate::{Button, ControlAction, ControlStates, ControlsContainer, Markers, SheetMode};

    fn container() -> ControlsContainer {
        ControlsContainer {
            buttons: vec![Button {
                label: "Export".to_owned(),
                ..Button::default()
            }],
            ..ControlsContainer::default()
        }
    }

    #[test]
    fn injection_appends_three_buttons_after_existing_ones() {
        let mut controls = container();
        inject_controls(&mut controls, &Markers::default());
        let labels = controls
            .buttons
            .iter()
            .map(|button| button.label.as_str())
            .collect::<Vec<_>>();
        assert_eq!(labels, vec!["Export", "Edit", "Save", "Undo"]);
        assert!(!controls.buttons[1].disabled);
        assert!(controls.buttons[2].disabled);
        assert!(controls.buttons[3].disabled);
        assert!(controls.buttons[3].has_class("danger"));
    }

    #[test]
    fn repeated_injection_does_not_duplicate_buttons() {
        let mut controls = container();
        let markers = Markers::default();
        inject_controls(&mut controls, &markers);
        inject_controls(&mut controls, &markers);
        assert_eq!(controls.buttons.len(), 4);
        for action in ControlAction::ALL {
            let count = controls
                .buttons
                .iter()
                .filter(|button| button.action == Some(action))
                .count();
            assert_eq!(count, 1, "{action:?} injected once");
        }
    }

    #[test]
    fn sync_relabels_edit_button_and_toggles_variant() {
        let markers = Markers::default();
        let mut controls = container();
        inject_controls(&mut controls, &markers);

        sync_controls(
            &mut controls,
            ControlStates::for_mode(SheetMode::EditingDirty),
            &markers,
        );
        let edit = controls
            .button(ControlAction::ToggleEdit)
            .expect("edit button");
        assert_eq!(edit.label, "Stop");
        assert!(!edit.has_class("secondary"));
        assert!(!controls.button(ControlAction::Save).expect("save").disabled);
        assert!(!controls.button(ControlAction::Undo).expect("undo").disabled);

        sync_controls(
            &mut controls,
            ControlStates::for_mode(SheetMode::Viewing),
            &markers,
        );
        let edit = controls
            .button(ControlAction::ToggleEdit)
            .expect("edit button");
        assert_eq!(edit.label, "Edit");
        assert!(edit.has_class("secondary"));
        assert!(controls.button(ControlAction::Save).expect("save").disabled);
    }

    #[test]
    fn sync_leaves_foreign_buttons_alone() {
        let markers = Markers::default();
        let mut controls = container();
        controls.buttons[0].disabled = true;
        inject_controls(&mut controls, &markers);
        sync_controls(
            &mut controls,
            ControlStates::for_mode(SheetMode::EditingClean),
            &markers,
        );
        assert!(controls.buttons[0].disabled);
        assert_eq!(controls.buttons[0].label, "Export");
    }
}
