//! Frame loop state machine
//!
//! ```text
//! Disconnected ──connect──► AwaitingFirstSample ──first_tick──► Running ──tick──┐
//!      ▲                           │                               ▲   │         │
//!      └─────────disconnect────────┴───────────────────────────────┼───┘         │
//!                                                                  └─────────────┘
//! ```
//!
//! The typestate [`FrameLoop`] enforces which operations exist in which
//! phase. [`LoopState`] wraps the three phases for the scheduler, which only
//! learns about connects, disconnects and samples at runtime.

use crate::controller::raw_state::{RawControllerState, ShapeError};
use crate::controller::sampler::ConnectionEvent;
use crate::mapping::dispatch::{dispatch, KeyEventSink};
use crate::mapping::engine::step;
use crate::mapping::keymap::Keymap;
use crate::mapping::snapshot::Snapshot;
use chrono::{DateTime, Local};
use statum::{machine, state};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[state]
#[derive(Debug, Clone)]
pub enum LoopPhase {
    Disconnected,
    AwaitingFirstSample,
    Running,
}

#[machine]
#[derive(Debug)]
pub struct FrameLoop<S: LoopPhase> {
    // Immutable for the lifetime of the process
    keymap: Arc<Keymap>,

    // Only state carried from one tick to the next
    previous: Option<Snapshot>,

    controller: Option<String>,

    ticks: u64,
}

impl<S: LoopPhase> FrameLoop<S> {
    pub fn keymap(&self) -> &Keymap {
        &self.keymap
    }

    pub fn controller(&self) -> Option<&str> {
        self.controller.as_deref()
    }

    /// Ticks run since the last connect
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

impl FrameLoop<Disconnected> {
    pub fn create(keymap: Arc<Keymap>) -> Self {
        Self::new(keymap, None, None, 0)
    }

    pub fn connect(mut self, controller: String) -> FrameLoop<AwaitingFirstSample> {
        info!("Controller {} connected, waiting for first sample", controller);
        self.controller = Some(controller);
        self.previous = None;
        self.ticks = 0;
        self.transition()
    }
}

impl FrameLoop<AwaitingFirstSample> {
    /// Takes the baseline sample. Never emits events.
    pub fn first_tick(
        mut self,
        raw: &RawControllerState,
        timestamp: DateTime<Local>,
    ) -> FrameLoop<Running> {
        let output = step(None, raw, &self.keymap, timestamp);
        debug_assert!(output.events.is_empty());
        self.previous = Some(output.snapshot);
        self.ticks += 1;
        info!("Baseline sample taken, frame loop running");
        self.transition()
    }

    pub fn disconnect(mut self) -> FrameLoop<Disconnected> {
        warn!("Controller disconnected before first sample");
        self.controller = None;
        self.transition()
    }
}

impl FrameLoop<Running> {
    /// Runs one tick and emits its events. Returns the number emitted.
    pub fn tick(
        &mut self,
        raw: &RawControllerState,
        timestamp: DateTime<Local>,
        sink: &mut impl KeyEventSink,
    ) -> usize {
        let output = step(self.previous.as_ref(), raw, &self.keymap, timestamp);
        self.previous = Some(output.snapshot);
        self.ticks += 1;
        dispatch(output.events, sink)
    }

    pub fn previous(&self) -> Option<&Snapshot> {
        self.previous.as_ref()
    }

    pub fn disconnect(mut self) -> FrameLoop<Disconnected> {
        info!(
            "Controller {} disconnected after {} ticks, frame loop stopped",
            self.controller.as_deref().unwrap_or("?"),
            self.ticks
        );
        self.previous = None;
        self.controller = None;
        self.transition()
    }
}

/// Runtime view of the frame loop
#[derive(Debug)]
pub enum LoopState {
    Disconnected(FrameLoop<Disconnected>),
    AwaitingFirstSample(FrameLoop<AwaitingFirstSample>),
    Running(FrameLoop<Running>),
}

impl LoopState {
    pub fn new(keymap: Arc<Keymap>) -> Self {
        LoopState::Disconnected(FrameLoop::create(keymap))
    }

    pub fn phase(&self) -> &'static str {
        match self {
            LoopState::Disconnected(_) => "disconnected",
            LoopState::AwaitingFirstSample(_) => "awaiting-first-sample",
            LoopState::Running(_) => "running",
        }
    }

    pub fn is_connected(&self) -> bool {
        !matches!(self, LoopState::Disconnected(_))
    }

    pub fn on_connection(self, event: ConnectionEvent) -> Self {
        match (self, event) {
            (LoopState::Disconnected(frame_loop), ConnectionEvent::Connected { name }) => {
                LoopState::AwaitingFirstSample(frame_loop.connect(name))
            }
            (LoopState::AwaitingFirstSample(frame_loop), ConnectionEvent::Disconnected) => {
                LoopState::Disconnected(frame_loop.disconnect())
            }
            (LoopState::Running(frame_loop), ConnectionEvent::Disconnected) => {
                LoopState::Disconnected(frame_loop.disconnect())
            }
            (state, event) => {
                debug!("Ignoring {:?} while {}", event, state.phase());
                state
            }
        }
    }

    /// Feeds one frame's sample through the loop.
    ///
    /// A missing sample means the controller went away without notice and is
    /// handled like a disconnect. A malformed sample skips the frame.
    pub fn on_frame(
        self,
        sample: Option<Result<RawControllerState, ShapeError>>,
        timestamp: DateTime<Local>,
        sink: &mut impl KeyEventSink,
    ) -> (Self, usize) {
        let raw = match sample {
            Some(Ok(raw)) => raw,
            Some(Err(e)) => {
                warn!("Skipping frame with malformed controller state: {}", e);
                return (self, 0);
            }
            None => return (self.on_connection(ConnectionEvent::Disconnected), 0),
        };

        match self {
            LoopState::Disconnected(frame_loop) => (LoopState::Disconnected(frame_loop), 0),
            LoopState::AwaitingFirstSample(frame_loop) => {
                (LoopState::Running(frame_loop.first_tick(&raw, timestamp)), 0)
            }
            LoopState::Running(mut frame_loop) => {
                let emitted = frame_loop.tick(&raw, timestamp, sink);
                (LoopState::Running(frame_loop), emitted)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::layout::{StandardButton, Trigger};
    use crate::controller::raw_state::ButtonState;
    use crate::mapping::dispatch::{KeyEvent, KeyEventKind};

    fn connected() -> ConnectionEvent {
        ConnectionEvent::Connected {
            name: "Test Pad".to_string(),
        }
    }

    fn pressed(button: StandardButton) -> RawControllerState {
        RawControllerState::default().with_button(button, ButtonState::digital(true))
    }

    #[test]
    fn test_typestate_lifecycle() {
        let mut sink: Vec<KeyEvent> = Vec::new();
        let frame_loop = FrameLoop::create(Arc::new(Keymap::default()));
        let awaiting = frame_loop.connect("Test Pad".to_string());
        assert_eq!(awaiting.controller(), Some("Test Pad"));

        let mut running = awaiting.first_tick(&RawControllerState::default(), Local::now());
        assert!(running.previous().is_some());
        assert_eq!(running.ticks(), 1);

        let emitted = running.tick(&pressed(StandardButton::TopRight), Local::now(), &mut sink);
        assert_eq!(emitted, 1);
        assert_eq!(sink[0].key, "r");

        let disconnected = running.disconnect();
        assert_eq!(disconnected.controller(), None);
    }

    #[test]
    fn test_first_sample_after_connect_is_silent() {
        let mut sink: Vec<KeyEvent> = Vec::new();
        let state = LoopState::new(Arc::new(Keymap::default())).on_connection(connected());
        assert_eq!(state.phase(), "awaiting-first-sample");

        let held = RawControllerState::default()
            .with_button(StandardButton::RightClusterBottom, ButtonState::digital(true))
            .with_trigger(Trigger::Left, 1.0);
        let (state, emitted) = state.on_frame(Some(Ok(held)), Local::now(), &mut sink);
        assert_eq!(state.phase(), "running");
        assert_eq!(emitted, 0);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_disconnect_stops_and_reconnect_rebaselines() {
        let mut sink: Vec<KeyEvent> = Vec::new();
        let state = LoopState::new(Arc::new(Keymap::default())).on_connection(connected());
        let (state, _) = state.on_frame(Some(Ok(RawControllerState::default())), Local::now(), &mut sink);
        let (state, _) = state.on_frame(
            Some(Ok(pressed(StandardButton::RightClusterBottom))),
            Local::now(),
            &mut sink,
        );
        assert_eq!(sink.len(), 1);

        let state = state.on_connection(ConnectionEvent::Disconnected);
        assert_eq!(state.phase(), "disconnected");
        assert!(!state.is_connected());

        // Samples are ignored while disconnected
        let (state, emitted) = state.on_frame(Some(Ok(RawControllerState::default())), Local::now(), &mut sink);
        assert_eq!(emitted, 0);

        // The button released while away: the new baseline swallows that edge
        let state = state.on_connection(connected());
        let (state, emitted) = state.on_frame(Some(Ok(RawControllerState::default())), Local::now(), &mut sink);
        assert_eq!(state.phase(), "running");
        assert_eq!(emitted, 0);
        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].kind, KeyEventKind::KeyDown);
    }

    #[test]
    fn test_missing_sample_counts_as_disconnect() {
        let mut sink: Vec<KeyEvent> = Vec::new();
        let state = LoopState::new(Arc::new(Keymap::default())).on_connection(connected());
        let (state, _) = state.on_frame(Some(Ok(RawControllerState::default())), Local::now(), &mut sink);
        let (state, emitted) = state.on_frame(None, Local::now(), &mut sink);
        assert_eq!(state.phase(), "disconnected");
        assert_eq!(emitted, 0);
    }

    #[test]
    fn test_malformed_sample_skips_frame() {
        let mut sink: Vec<KeyEvent> = Vec::new();
        let state = LoopState::new(Arc::new(Keymap::default())).on_connection(connected());
        let (state, _) = state.on_frame(Some(Ok(RawControllerState::default())), Local::now(), &mut sink);
        let (state, emitted) = state.on_frame(
            Some(Err(ShapeError::TooFewAxes {
                expected: 6,
                actual: 4,
            })),
            Local::now(),
            &mut sink,
        );
        assert_eq!(state.phase(), "running");
        assert_eq!(emitted, 0);

        // Previous snapshot is still the last good one
        let (_, emitted) = state.on_frame(
            Some(Ok(pressed(StandardButton::CenterLeft))),
            Local::now(),
            &mut sink,
        );
        assert_eq!(emitted, 1);
        assert_eq!(sink[0].key, "c");
    }

    #[test]
    fn test_second_connect_is_ignored() {
        let state = LoopState::new(Arc::new(Keymap::default()))
            .on_connection(connected())
            .on_connection(connected());
        assert_eq!(state.phase(), "awaiting-first-sample");
    }
}
