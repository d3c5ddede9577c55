use crate::controller::layout::{StandardAxis, StandardButton, Trigger, AXIS_COUNT, BUTTON_COUNT};
use thiserror::Error;
use tracing::debug;

// State of a single physical button
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ButtonState {
    pub pressed: bool,
    pub touched: bool,
    pub value: f32,
}

impl ButtonState {
    pub fn digital(pressed: bool) -> Self {
        Self {
            pressed,
            touched: pressed,
            value: if pressed { 1.0 } else { 0.0 },
        }
    }
}

// Raw state shape errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("expected at least {expected} buttons, source reported {actual}")]
    TooFewButtons { expected: usize, actual: usize },

    #[error("expected at least {expected} axes, source reported {actual}")]
    TooFewAxes { expected: usize, actual: usize },
}

/// Raw state of one controller for a single tick
///
/// Buttons and axes are stored in fixed-size arrays laid out by the standard
/// mapping, so once a value exists every index lookup is in range. Axis values
/// are expected in `[-1, 1]` (triggers in `[0, 1]`) but not clamped here.
#[derive(Debug, Clone, PartialEq)]
pub struct RawControllerState {
    pub buttons: [ButtonState; BUTTON_COUNT],
    pub axes: [f32; AXIS_COUNT],
}

impl Default for RawControllerState {
    fn default() -> Self {
        Self {
            buttons: [ButtonState::default(); BUTTON_COUNT],
            axes: [0.0; AXIS_COUNT],
        }
    }
}

impl RawControllerState {
    /// Builds a state from positional slices as reported by a device backend.
    ///
    /// Short slices break the layout contract and are rejected. Entries past
    /// the standard layout (vendor extras) are ignored.
    pub fn from_slices(buttons: &[ButtonState], axes: &[f32]) -> Result<Self, ShapeError> {
        if buttons.len() < BUTTON_COUNT {
            return Err(ShapeError::TooFewButtons {
                expected: BUTTON_COUNT,
                actual: buttons.len(),
            });
        }
        if axes.len() < AXIS_COUNT {
            return Err(ShapeError::TooFewAxes {
                expected: AXIS_COUNT,
                actual: axes.len(),
            });
        }
        if buttons.len() > BUTTON_COUNT || axes.len() > AXIS_COUNT {
            debug!(
                "Ignoring {} extra buttons and {} extra axes",
                buttons.len() - BUTTON_COUNT,
                axes.len() - AXIS_COUNT
            );
        }

        let mut state = Self::default();
        state.buttons.copy_from_slice(&buttons[..BUTTON_COUNT]);
        state.axes.copy_from_slice(&axes[..AXIS_COUNT]);
        Ok(state)
    }

    pub fn button(&self, button: StandardButton) -> &ButtonState {
        &self.buttons[button.index()]
    }

    pub fn axis(&self, axis: StandardAxis) -> f32 {
        self.axes[axis.index()]
    }

    pub fn trigger(&self, trigger: Trigger) -> f32 {
        self.axes[trigger.axis_index()]
    }

    // Builder helpers, mostly for sources that assemble state field by field
    pub fn with_button(mut self, button: StandardButton, state: ButtonState) -> Self {
        self.buttons[button.index()] = state;
        self
    }

    pub fn with_axis(mut self, axis: StandardAxis, value: f32) -> Self {
        self.axes[axis.index()] = value;
        self
    }

    pub fn with_trigger(mut self, trigger: Trigger, value: f32) -> Self {
        self.axes[trigger.axis_index()] = value;
        self
    }
}
