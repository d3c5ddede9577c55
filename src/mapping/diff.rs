//! Differencer - compares two snapshots signal by signal
//!
//! Comparisons are exact: booleans by equality, analog values by float
//! inequality with no tolerance. Without a previous snapshot every field of
//! every family reports a change; whether that leads to dispatch is decided by
//! the caller.

use crate::controller::layout::{StandardAxis, StandardButton, Trigger, BUTTON_COUNT};
use crate::controller::raw_state::ButtonState;
use crate::mapping::normalize::StickDirection;
use crate::mapping::snapshot::Snapshot;

/// Which fields of one button changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonChange {
    pub pressed: bool,
    pub touched: bool,
    pub value: bool,
}

impl ButtonChange {
    pub const ALL: ButtonChange = ButtonChange {
        pressed: true,
        touched: true,
        value: true,
    };

    fn between(previous: &ButtonState, current: &ButtonState) -> Self {
        Self {
            pressed: previous.pressed != current.pressed,
            touched: previous.touched != current.touched,
            value: is_different_float(previous.value, current.value),
        }
    }

    pub fn any(&self) -> bool {
        self.pressed || self.touched || self.value
    }
}

/// Per-signal changes between two ticks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSet {
    buttons: [ButtonChange; BUTTON_COUNT],
    axes: [bool; 4],
    faux_axis_buttons: [bool; 4],
    triggers: [bool; 2],
}

impl ChangeSet {
    fn everything() -> Self {
        Self {
            buttons: [ButtonChange::ALL; BUTTON_COUNT],
            axes: [true; 4],
            faux_axis_buttons: [true; 4],
            triggers: [true; 2],
        }
    }

    pub fn button(&self, button: StandardButton) -> ButtonChange {
        self.buttons[button.index()]
    }

    /// Raw stick axis value changed. Not used for dispatch.
    pub fn axis(&self, axis: StandardAxis) -> bool {
        self.axes[axis.index()]
    }

    pub fn stick_direction(&self, direction: StickDirection) -> bool {
        self.faux_axis_buttons[direction.slot()]
    }

    pub fn trigger(&self, trigger: Trigger) -> bool {
        self.triggers[trigger.slot()]
    }

    /// True if no field of any family changed
    pub fn is_empty(&self) -> bool {
        !self.buttons.iter().any(ButtonChange::any)
            && !self.axes.iter().any(|&c| c)
            && !self.faux_axis_buttons.iter().any(|&c| c)
            && !self.triggers.iter().any(|&c| c)
    }
}

pub fn diff(previous: Option<&Snapshot>, current: &Snapshot) -> ChangeSet {
    let Some(previous) = previous else {
        return ChangeSet::everything();
    };

    let mut buttons = [ButtonChange::default(); BUTTON_COUNT];
    for (change, (prev, curr)) in buttons
        .iter_mut()
        .zip(previous.buttons().iter().zip(current.buttons().iter()))
    {
        *change = ButtonChange::between(prev, curr);
    }

    let axes = StandardAxis::ALL.map(|axis| {
        is_different_float(
            previous.axes()[axis.index()],
            current.axes()[axis.index()],
        )
    });

    let (prev_faux, curr_faux) = (previous.faux_axis_buttons(), current.faux_axis_buttons());
    let mut faux_axis_buttons = [false; 4];
    for direction in StickDirection::ALL {
        faux_axis_buttons[direction.slot()] =
            prev_faux.pressed(direction) ^ curr_faux.pressed(direction);
    }

    let (prev_triggers, curr_triggers) = (previous.trigger_buttons(), current.trigger_buttons());
    let mut triggers = [false; 2];
    for trigger in Trigger::ALL {
        triggers[trigger.slot()] = prev_triggers.pressed(trigger) ^ curr_triggers.pressed(trigger);
    }

    ChangeSet {
        buttons,
        axes,
        faux_axis_buttons,
        triggers,
    }
}

// Kept as its own function so a tolerance could be introduced in one place
fn is_different_float(a: f32, b: f32) -> bool {
    a != b
}
