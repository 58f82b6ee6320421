// SPDX-FileCopyrightText: 2025 Ashton Warner
//
// SPDX-License-Identifier: GPL-3.0-or-later

use enum_map::{EnumArray, EnumMap};
use pal::{Button, InputDevice, Pal};

/// The main input interface for the game, created and maintained in game
/// code.
///
/// `K` should be an enum that represents the various actions that can be
/// triggered by the player. Once per update, [`InputDeviceState::update`]
/// should be called to poll the platform's instantaneous button state,
/// and then the [`Action::pressed`] status of the values in
/// [`InputDeviceState::actions`] drives whatever the game does with them.
/// There is no event buffering: a press shorter than one update interval
/// can be missed, which at the fixed update rate has yet to matter.
pub struct InputDeviceState<K: EnumArray<Action>> {
    /// The device this [`InputDeviceState`] tracks.
    pub device: InputDevice,
    /// Each action's current state, updated based on the polled button
    /// state in [`InputDeviceState::update`].
    pub actions: EnumMap<K, Action>,
}

impl<K: EnumArray<Action>> InputDeviceState<K> {
    /// Polls `platform` for the mapped buttons' state and reinterprets
    /// it into each action's [`Action::pressed`].
    pub fn update(&mut self, platform: &dyn Pal) {
        for action in self.actions.values_mut() {
            let raw_down = platform.button_state(self.device, action.mapping);
            let down = !action.disabled && raw_down;
            let pressed_this_update = down && !action.was_down;
            match action.kind {
                ActionKind::Instant => action.pressed = pressed_this_update,
                ActionKind::Held => action.pressed = down,
                ActionKind::Toggle => {
                    if pressed_this_update {
                        action.pressed = !action.pressed;
                    }
                }
            }
            // Tracks the physical button, not the masked state, so
            // re-enabling an action mid-hold doesn't read as a fresh
            // press.
            action.was_down = raw_down;
        }
    }
}

/// A rebindable action and its current state.
pub struct Action {
    /// How the polled button state is used to change the status of
    /// [`Action::pressed`].
    pub kind: ActionKind,
    /// Button which triggers this action.
    pub mapping: Button,
    /// If true, the button is ignored entirely. Can be used to e.g.
    /// disable jumping while in-air. A press that starts while disabled
    /// doesn't count as a new press once re-enabled, the button has to
    /// be released first.
    pub disabled: bool,
    /// True if the action should be triggered, per the action's
    /// [`ActionKind`].
    pub pressed: bool,
    /// Whether the mapped button was down at the previous update, for
    /// edge detection.
    was_down: bool,
}

impl Action {
    pub fn new(kind: ActionKind, mapping: Button) -> Action {
        Action {
            kind,
            mapping,
            disabled: false,
            pressed: false,
            was_down: false,
        }
    }
}

/// The button press pattern to be used to trigger a specific action.
pub enum ActionKind {
    /// Actions that happen on the update where the button goes down, and
    /// stop happening until the next press.
    Instant,
    /// Actions that happen for as long as the button is held.
    Held,
    /// (Accessible alternative for [`ActionKind::Held`], gameplay logic
    /// shouldn't really change between these two.) Actions that start
    /// happening when the button is pressed one time, and stop happening
    /// when it's pressed again.
    Toggle,
}
