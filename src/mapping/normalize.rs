//! Normalizer - turns raw axes into boolean signals
//!
//! The left stick is read as four "faux" buttons: a ring inset from the edge
//! of the stick's range counts as pressed once the stick crosses it on an
//! axis. Trigger axes count as pressed past an activation threshold.

use crate::controller::layout::{StandardAxis, StandardButton, Trigger};
use crate::controller::raw_state::{ButtonState, RawControllerState};
use crate::controller::BUTTON_COUNT;
use std::fmt::{self, Display};

/// Width of the pressed ring at each end of a stick axis, in axis units
pub const RING_WIDTH: f32 = 0.15;

/// Trigger axis value from which a trigger counts as pressed
pub const ACTIVATION_THRESHOLD: f32 = 0.9;

/// Left stick direction read as a button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StickDirection {
    Up,
    Down,
    Left,
    Right,
}

impl StickDirection {
    /// Dispatch order
    pub const ALL: [StickDirection; 4] = [
        StickDirection::Down,
        StickDirection::Left,
        StickDirection::Right,
        StickDirection::Up,
    ];

    /// The button whose keymap entry this direction shares
    pub const fn as_button(self) -> StandardButton {
        match self {
            StickDirection::Up => StandardButton::LeftClusterTop,
            StickDirection::Down => StandardButton::LeftClusterBottom,
            StickDirection::Left => StandardButton::LeftClusterLeft,
            StickDirection::Right => StandardButton::LeftClusterRight,
        }
    }

    pub const fn slot(self) -> usize {
        match self {
            StickDirection::Up => 0,
            StickDirection::Down => 1,
            StickDirection::Left => 2,
            StickDirection::Right => 3,
        }
    }
}

impl Display for StickDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StickDirection::Up => write!(f, "stick-up"),
            StickDirection::Down => write!(f, "stick-down"),
            StickDirection::Left => write!(f, "stick-left"),
            StickDirection::Right => write!(f, "stick-right"),
        }
    }
}

/// Stick directions as flags, indexed by [`StickDirection::slot`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FauxAxisButtons([bool; 4]);

impl FauxAxisButtons {
    pub fn new(up: bool, down: bool, left: bool, right: bool) -> Self {
        Self([up, down, left, right])
    }

    pub fn pressed(&self, direction: StickDirection) -> bool {
        self.0[direction.slot()]
    }
}

/// Triggers as flags, indexed by [`Trigger::slot`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TriggerButtons([bool; 2]);

impl TriggerButtons {
    pub fn new(left: bool, right: bool) -> Self {
        Self([left, right])
    }

    pub fn pressed(&self, trigger: Trigger) -> bool {
        self.0[trigger.slot()]
    }
}

/// Normalized state of one tick
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedState {
    pub buttons: [ButtonState; BUTTON_COUNT],
    pub faux_axis_buttons: FauxAxisButtons,
    pub trigger_buttons: TriggerButtons,
}

/// Normalizes raw controller state. Total over any raw state.
pub fn normalize(raw: &RawControllerState) -> NormalizedState {
    NormalizedState {
        buttons: raw.buttons,
        faux_axis_buttons: compute_faux_axis_buttons(raw),
        trigger_buttons: compute_trigger_buttons(raw),
    }
}

pub fn compute_faux_axis_buttons(raw: &RawControllerState) -> FauxAxisButtons {
    let vertical = raw.axis(StandardAxis::LeftStickVertical);
    let horizontal = raw.axis(StandardAxis::LeftStickHorizontal);

    FauxAxisButtons::new(
        vertical < -1.0 + RING_WIDTH,
        vertical > 1.0 - RING_WIDTH,
        horizontal < -1.0 + RING_WIDTH,
        horizontal > 1.0 - RING_WIDTH,
    )
}

pub fn compute_trigger_buttons(raw: &RawControllerState) -> TriggerButtons {
    TriggerButtons::new(
        raw.trigger(Trigger::Left) >= ACTIVATION_THRESHOLD,
        raw.trigger(Trigger::Right) >= ACTIVATION_THRESHOLD,
    )
}
