// SPDX-FileCopyrightText: 2025 Ashton Warner
//
// SPDX-License-Identifier: GPL-3.0-or-later

/// A specific input device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputDevice(u64);

impl InputDevice {
    /// Creates a new [`InputDevice`]. Should only be created in the
    /// platform implementation, which also knows how the inner value is
    /// going to be used.
    pub fn new(id: u64) -> InputDevice {
        InputDevice(id)
    }

    /// Returns the inner value passed into [`InputDevice::new`].
    /// Generally only relevant to the platform implementation.
    pub fn inner(self) -> u64 {
        self.0
    }
}

/// The digital buttons of a generic gamepad-style device. Platforms map
/// their native keys or buttons onto these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Button {
    South,
    East,
    West,
    North,
    L1,
    R1,
    L2,
    R2,
    Start,
    Select,
    ThumbL,
    ThumbR,
}

/// The analog axes of a generic gamepad-style device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Axis {
    LeftX,
    LeftY,
    RightX,
    RightY,
}

/// The instantaneous state of a directional hat (d-pad), one step per
/// axis. `x` is -1 for left, 1 for right; `y` is -1 for up, 1 for down;
/// 0 for centered.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HatState {
    pub x: i8,
    pub y: i8,
}

impl HatState {
    pub const CENTERED: HatState = HatState { x: 0, y: 0 };
}
