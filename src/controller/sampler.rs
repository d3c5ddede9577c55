//! Sampler - reads the live state of one controller
//!
//! [`ControllerSource`] is the boundary to whatever owns the device. The
//! [`GilrsSource`] implementation polls gilrs, follows one gamepad at a time
//! and reports its state in the standard layout. When the followed gamepad
//! goes away, the next one still plugged in takes over.

use crate::controller::layout::{StandardAxis, StandardButton, Trigger, AXIS_COUNT, BUTTON_COUNT};
use crate::controller::raw_state::{ButtonState, RawControllerState, ShapeError};
use gilrs::{Axis, Button, Event, EventType, Gamepad, GamepadId, Gilrs};
use std::collections::VecDeque;
use std::fmt::Display;
use tracing::{debug, error, info, warn};

/// Connection notifications from a controller source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    Connected { name: String },
    Disconnected,
}

// Source errors
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Failed to initialize controller backend: {0}")]
    InitializationError(String),

    #[error("Invalid controller layout: {0}")]
    InvalidLayout(String),
}

/// Live controller state provider
pub trait ControllerSource {
    /// Next pending connection notification, if any
    fn poll_connection(&mut self) -> Option<ConnectionEvent>;

    /// Samples the connected controller.
    ///
    /// Returns `None` when no controller is reachable anymore.
    fn sample(&mut self) -> Option<Result<RawControllerState, ShapeError>>;
}

/// gilrs buttons in standard layout order
const BUTTON_LAYOUT: [Button; BUTTON_COUNT] = [
    Button::South,
    Button::East,
    Button::West,
    Button::North,
    Button::LeftTrigger,
    Button::RightTrigger,
    Button::LeftTrigger2,
    Button::RightTrigger2,
    Button::Select,
    Button::Start,
    Button::LeftThumb,
    Button::RightThumb,
    Button::DPadUp,
    Button::DPadDown,
    Button::DPadLeft,
    Button::DPadRight,
    Button::Mode,
];

/// gilrs stick axes in standard layout order
const STICK_LAYOUT: [Axis; 4] = [
    Axis::LeftStickX,
    Axis::LeftStickY,
    Axis::RightStickX,
    Axis::RightStickY,
];

/// Triggers are read from the analog value of these buttons
fn trigger_button(trigger: Trigger) -> Button {
    match trigger {
        Trigger::Left => Button::LeftTrigger2,
        Trigger::Right => Button::RightTrigger2,
    }
}

/// Positional gilrs inputs resolved to standard identifiers
#[derive(Debug, Clone)]
struct StandardLayout {
    buttons: Vec<(StandardButton, Button)>,
    sticks: Vec<(StandardAxis, Axis)>,
}

impl StandardLayout {
    /// Resolves every layout position once. Fails on a position without a
    /// standard identifier or a gilrs input used twice.
    fn resolve() -> Result<Self, SourceError> {
        let mut buttons = Vec::with_capacity(BUTTON_COUNT);
        for (index, &gilrs_button) in BUTTON_LAYOUT.iter().enumerate() {
            let button = StandardButton::try_from(index)
                .map_err(|e| SourceError::InvalidLayout(e.to_string()))?;
            if let Some((taken, _)) = buttons.iter().find(|(_, b)| *b == gilrs_button) {
                return Err(SourceError::InvalidLayout(format!(
                    "{:?} is mapped to both {} and {}",
                    gilrs_button, taken, button
                )));
            }
            buttons.push((button, gilrs_button));
        }

        let mut sticks = Vec::with_capacity(STICK_LAYOUT.len());
        for (index, &gilrs_axis) in STICK_LAYOUT.iter().enumerate() {
            let axis = StandardAxis::try_from(index)
                .map_err(|e| SourceError::InvalidLayout(e.to_string()))?;
            sticks.push((axis, gilrs_axis));
        }

        debug!(
            "Resolved standard layout: {} buttons, {} stick axes",
            buttons.len(),
            sticks.len()
        );
        Ok(Self { buttons, sticks })
    }
}

/// Follows one pad at a time. Other pads wait until the followed one leaves.
#[derive(Debug)]
struct PadSelector<Id> {
    active: Option<Id>,
    pending: VecDeque<ConnectionEvent>,
}

impl<Id: Copy + PartialEq + Display> PadSelector<Id> {
    fn new() -> Self {
        Self {
            active: None,
            pending: VecDeque::new(),
        }
    }

    fn active(&self) -> Option<Id> {
        self.active
    }

    /// Follows the first candidate unless a pad is already followed
    fn adopt(&mut self, candidates: impl IntoIterator<Item = (Id, String)>) -> bool {
        if self.active.is_some() {
            return false;
        }
        match candidates.into_iter().next() {
            Some((id, name)) => {
                info!("Following controller {} ({})", name, id);
                self.active = Some(id);
                self.pending.push_back(ConnectionEvent::Connected { name });
                true
            }
            None => false,
        }
    }

    fn connected(&mut self, id: Id, name: String) {
        if !self.adopt([(id, name)]) {
            debug!("Ignoring additional controller: {}", id);
        }
    }

    /// `still_connected` lists the pads that can take over
    fn disconnected(&mut self, id: Id, still_connected: impl IntoIterator<Item = (Id, String)>) {
        if self.active != Some(id) {
            debug!("Unfollowed controller {} disconnected", id);
            return;
        }

        warn!("Controller disconnected: {}", id);
        self.active = None;
        self.pending.push_back(ConnectionEvent::Disconnected);

        let others = still_connected
            .into_iter()
            .filter(|(other, _)| *other != id);
        if !self.adopt(others) {
            info!("No other controller connected, waiting for one");
        }
    }

    fn next_event(&mut self) -> Option<ConnectionEvent> {
        self.pending.pop_front()
    }
}

pub struct GilrsSource {
    gilrs: Gilrs,
    layout: StandardLayout,
    selector: PadSelector<GamepadId>,
}

impl GilrsSource {
    pub fn new() -> Result<Self, SourceError> {
        let layout = StandardLayout::resolve()?;

        info!("Initializing gilrs controller interface");
        let gilrs = match Gilrs::new() {
            Ok(g) => {
                info!("Successfully initialized gilrs");
                g
            }
            Err(e) => {
                error!("Failed to initialize gilrs: {}", e);
                return Err(SourceError::InitializationError(e.to_string()));
            }
        };

        let mut selector = PadSelector::new();
        // Pads already plugged in before startup count as connected
        if !selector.adopt(connected_pads(&gilrs)) {
            warn!("No gamepad connected, waiting for one");
        }

        Ok(Self {
            gilrs,
            layout,
            selector,
        })
    }

    fn drain_events(&mut self) {
        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            match event {
                EventType::Connected => {
                    let name = self.gilrs.gamepad(id).name().to_string();
                    self.selector.connected(id, name);
                }
                EventType::Disconnected => {
                    self.selector.disconnected(id, connected_pads(&self.gilrs));
                }
                // Button and axis events only refresh gilrs' cached state
                _ => {}
            }
        }
    }
}

fn connected_pads(gilrs: &Gilrs) -> impl Iterator<Item = (GamepadId, String)> + '_ {
    gilrs
        .gamepads()
        .filter(|(_, gamepad)| gamepad.is_connected())
        .map(|(id, gamepad)| (id, gamepad.name().to_string()))
}

impl ControllerSource for GilrsSource {
    fn poll_connection(&mut self) -> Option<ConnectionEvent> {
        self.drain_events();
        self.selector.next_event()
    }

    fn sample(&mut self) -> Option<Result<RawControllerState, ShapeError>> {
        let id = self.selector.active()?;
        let gamepad = self.gilrs.connected_gamepad(id)?;
        let (buttons, axes) = read_standard_layout(&self.layout, &gamepad);
        Some(RawControllerState::from_slices(&buttons, &axes))
    }
}

fn read_standard_layout(layout: &StandardLayout, gamepad: &Gamepad<'_>) -> (Vec<ButtonState>, Vec<f32>) {
    let buttons = layout
        .buttons
        .iter()
        .map(|&(_, button)| {
            let pressed = gamepad.is_pressed(button);
            let value = gamepad
                .button_data(button)
                .map(|data| data.value())
                .unwrap_or(if pressed { 1.0 } else { 0.0 });
            ButtonState {
                pressed,
                // No touch sensing in gilrs
                touched: pressed,
                value,
            }
        })
        .collect();

    let mut axes = Vec::with_capacity(AXIS_COUNT);
    for &(axis, gilrs_axis) in &layout.sticks {
        let value = gamepad.value(gilrs_axis);
        axes.push(match axis {
            StandardAxis::LeftStickVertical | StandardAxis::RightStickVertical => {
                to_standard_vertical(value)
            }
            StandardAxis::LeftStickHorizontal | StandardAxis::RightStickHorizontal => value,
        });
    }
    for trigger in Trigger::ALL {
        let value = gamepad
            .button_data(trigger_button(trigger))
            .map(|data| data.value())
            .unwrap_or(0.0);
        axes.push(value);
    }

    (buttons, axes)
}

/// gilrs reports "up" as positive, the standard layout as negative
fn to_standard_vertical(value: f32) -> f32 {
    -value
}
