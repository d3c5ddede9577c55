use crate::controller::layout::{AXIS_COUNT, BUTTON_COUNT};
use crate::controller::raw_state::{ButtonState, RawControllerState};
use crate::mapping::normalize::{FauxAxisButtons, NormalizedState, TriggerButtons};

/// Owned copy of one tick's state, kept as the next tick's "previous"
///
/// All fields are plain values; nothing borrows from the live source.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    buttons: [ButtonState; BUTTON_COUNT],
    axes: [f32; AXIS_COUNT],
    faux_axis_buttons: FauxAxisButtons,
    trigger_buttons: TriggerButtons,
}

impl Snapshot {
    pub fn capture(raw: &RawControllerState, normalized: &NormalizedState) -> Self {
        Self {
            buttons: normalized.buttons,
            axes: raw.axes,
            faux_axis_buttons: normalized.faux_axis_buttons,
            trigger_buttons: normalized.trigger_buttons,
        }
    }

    pub fn buttons(&self) -> &[ButtonState; BUTTON_COUNT] {
        &self.buttons
    }

    pub fn axes(&self) -> &[f32; AXIS_COUNT] {
        &self.axes
    }

    pub fn faux_axis_buttons(&self) -> FauxAxisButtons {
        self.faux_axis_buttons
    }

    pub fn trigger_buttons(&self) -> TriggerButtons {
        self.trigger_buttons
    }
}
