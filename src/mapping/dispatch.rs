//! Dispatcher - turns signal edges into synthetic key events
//!
//! Only the `pressed` edge of a signal produces an event; touch and analog
//! value changes are ignored. Events come out in a fixed order: buttons by
//! index, then stick directions, then triggers.

use crate::controller::layout::{StandardButton, Trigger};
use crate::mapping::diff::ChangeSet;
use crate::mapping::keymap::{KeyDescriptor, Keymap};
use crate::mapping::normalize::StickDirection;
use crate::mapping::snapshot::Snapshot;
use chrono::{DateTime, Local};
use std::fmt::{self, Display};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Any individually tracked boolean input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Button(StandardButton),
    StickDirection(StickDirection),
    Trigger(Trigger),
}

impl Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Button(button) => write!(f, "{}", button),
            Signal::StickDirection(direction) => write!(f, "{}", direction),
            Signal::Trigger(trigger) => write!(f, "{}", trigger),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEventKind {
    KeyDown,
    KeyUp,
}

impl KeyEventKind {
    fn from_pressed(pressed: bool) -> Self {
        if pressed {
            KeyEventKind::KeyDown
        } else {
            KeyEventKind::KeyUp
        }
    }
}

impl Display for KeyEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyEventKind::KeyDown => write!(f, "keydown"),
            KeyEventKind::KeyUp => write!(f, "keyup"),
        }
    }
}

/// Synthetic keyboard event
#[derive(Debug, Clone, PartialEq)]
pub struct KeyEvent {
    pub kind: KeyEventKind,
    pub key: String,
    pub signal: Signal,
    pub timestamp: DateTime<Local>,
}

/// Destination for synthetic key events
pub trait KeyEventSink {
    fn emit(&mut self, event: KeyEvent);
}

impl KeyEventSink for Vec<KeyEvent> {
    fn emit(&mut self, event: KeyEvent) {
        self.push(event);
    }
}

/// Forwards events into a bounded channel without ever blocking the tick
///
/// A full or closed channel drops the event.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::Sender<KeyEvent>,
    dropped: u64,
}

impl ChannelSink {
    pub fn new(sender: mpsc::Sender<KeyEvent>) -> Self {
        Self { sender, dropped: 0 }
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl KeyEventSink for ChannelSink {
    fn emit(&mut self, event: KeyEvent) {
        if let Err(e) = self.sender.try_send(event) {
            self.dropped += 1;
            warn!("Dropping key event: {}", e);
        }
    }
}

/// Builds the key events for one tick.
///
/// Nothing is produced without a previous snapshot, whatever the change set
/// says: the first sample after connecting only establishes a baseline.
pub fn synthesize(
    previous: Option<&Snapshot>,
    current: &Snapshot,
    changes: &ChangeSet,
    keymap: &Keymap,
    timestamp: DateTime<Local>,
) -> Vec<KeyEvent> {
    let mut events = Vec::new();
    if previous.is_none() {
        debug!("No previous snapshot, skipping dispatch");
        return events;
    }

    let mut push = |signal: Signal, changed: bool, descriptor: Option<&KeyDescriptor>, pressed: bool| {
        if !changed {
            return;
        }
        let Some(descriptor) = descriptor else {
            debug!("Unbound signal changed: {}", signal);
            return;
        };
        let event = KeyEvent {
            kind: KeyEventKind::from_pressed(pressed),
            key: descriptor.key.clone(),
            signal,
            timestamp,
        };
        debug!("{} {:?} from {}", event.kind, event.key, signal);
        events.push(event);
    };

    for button in StandardButton::ALL {
        push(
            Signal::Button(button),
            changes.button(button).pressed,
            keymap.button(button),
            current.buttons()[button.index()].pressed,
        );
    }

    let faux = current.faux_axis_buttons();
    for direction in StickDirection::ALL {
        push(
            Signal::StickDirection(direction),
            changes.stick_direction(direction),
            keymap.stick_direction(direction),
            faux.pressed(direction),
        );
    }

    let triggers = current.trigger_buttons();
    for trigger in Trigger::ALL {
        push(
            Signal::Trigger(trigger),
            changes.trigger(trigger),
            keymap.trigger(trigger),
            triggers.pressed(trigger),
        );
    }

    events
}

/// Emits events to the sink in order
pub fn dispatch(events: Vec<KeyEvent>, sink: &mut impl KeyEventSink) -> usize {
    let count = events.len();
    for event in events {
        sink.emit(event);
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::layout::StandardAxis;
    use crate::controller::raw_state::{ButtonState, RawControllerState};
    use crate::mapping::diff::diff;
    use crate::mapping::keymap::KeymapConfig;
    use crate::mapping::normalize::normalize;

    fn snapshot(raw: &RawControllerState) -> Snapshot {
        Snapshot::capture(raw, &normalize(raw))
    }

    fn events_between(previous: &RawControllerState, current: &RawControllerState, keymap: &Keymap) -> Vec<KeyEvent> {
        let previous = snapshot(previous);
        let current = snapshot(current);
        let changes = diff(Some(&previous), &current);
        synthesize(Some(&previous), &current, &changes, keymap, Local::now())
    }

    #[test]
    fn test_no_previous_no_events() {
        let raw = RawControllerState::default()
            .with_button(StandardButton::RightClusterBottom, ButtonState::digital(true))
            .with_trigger(Trigger::Left, 1.0);
        let current = snapshot(&raw);
        let changes = diff(None, &current);
        let events = synthesize(None, &current, &changes, &Keymap::default(), Local::now());
        assert!(events.is_empty());
    }

    #[test]
    fn test_press_and_release_direction() {
        let released = RawControllerState::default();
        let pressed = RawControllerState::default()
            .with_button(StandardButton::RightClusterRight, ButtonState::digital(true));

        let down = events_between(&released, &pressed, &Keymap::default());
        assert_eq!(down.len(), 1);
        assert_eq!(down[0].kind, KeyEventKind::KeyDown);
        assert_eq!(down[0].key, "x");
        assert_eq!(down[0].signal, Signal::Button(StandardButton::RightClusterRight));

        let up = events_between(&pressed, &released, &Keymap::default());
        assert_eq!(up.len(), 1);
        assert_eq!(up[0].kind, KeyEventKind::KeyUp);
        assert_eq!(up[0].key, "x");
    }

    #[test]
    fn test_unbound_signal_is_silent() {
        let released = RawControllerState::default();
        let pressed = RawControllerState::default()
            .with_button(StandardButton::Center, ButtonState::digital(true))
            .with_button(StandardButton::BottomLeft, ButtonState::digital(true));
        let keymap = Keymap::default();
        for _ in 0..3 {
            assert!(events_between(&released, &pressed, &keymap).is_empty());
            assert!(events_between(&pressed, &released, &keymap).is_empty());
        }
    }

    #[test]
    fn test_touch_and_value_changes_do_not_dispatch() {
        let idle = RawControllerState::default();
        let resting_finger = RawControllerState::default().with_button(
            StandardButton::RightClusterBottom,
            ButtonState {
                pressed: false,
                touched: true,
                value: 0.2,
            },
        );
        assert!(events_between(&idle, &resting_finger, &Keymap::default()).is_empty());
    }

    #[test]
    fn test_button_then_trigger_order() {
        let released = RawControllerState::default();
        let current = RawControllerState::default()
            .with_button(StandardButton::RightClusterBottom, ButtonState::digital(true))
            .with_trigger(Trigger::Left, 0.95);
        let events = events_between(&released, &current, &Keymap::default());

        let summary: Vec<_> = events.iter().map(|e| (e.kind, e.key.as_str())).collect();
        assert_eq!(
            summary,
            vec![(KeyEventKind::KeyDown, "z"), (KeyEventKind::KeyDown, "e")]
        );
    }

    #[test]
    fn test_full_family_order() {
        let released = RawControllerState::default();
        let current = RawControllerState::default()
            .with_trigger(Trigger::Right, 1.0)
            .with_axis(StandardAxis::LeftStickHorizontal, 1.0)
            .with_axis(StandardAxis::LeftStickVertical, 1.0)
            .with_button(StandardButton::CenterRight, ButtonState::digital(true))
            .with_button(StandardButton::TopLeft, ButtonState::digital(true));
        let events = events_between(&released, &current, &Keymap::default());

        let signals: Vec<_> = events.iter().map(|e| e.signal).collect();
        assert_eq!(
            signals,
            vec![
                Signal::Button(StandardButton::TopLeft),
                Signal::Button(StandardButton::CenterRight),
                Signal::StickDirection(StickDirection::Down),
                Signal::StickDirection(StickDirection::Right),
                Signal::Trigger(Trigger::Right),
            ]
        );
        assert!(events.iter().all(|e| e.kind == KeyEventKind::KeyDown));
    }

    #[test]
    fn test_stick_uses_button_keymap() {
        let mut config = KeymapConfig::default_config();
        config.buttons.left_cluster_left = Some("a".to_string());
        let keymap = Keymap::from_config(&config).unwrap();

        let centered = RawControllerState::default();
        let pushed = RawControllerState::default().with_axis(StandardAxis::LeftStickHorizontal, -0.9);
        let events = events_between(&centered, &pushed, &keymap);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].key, "a");
        assert_eq!(events[0].signal, Signal::StickDirection(StickDirection::Left));
    }

    #[test]
    fn test_no_change_no_events() {
        let raw = RawControllerState::default()
            .with_button(StandardButton::RightClusterTop, ButtonState::digital(true))
            .with_axis(StandardAxis::LeftStickVertical, -1.0)
            .with_trigger(Trigger::Right, 0.97);
        assert!(events_between(&raw, &raw, &Keymap::default()).is_empty());
    }

    #[test]
    fn test_dispatch_preserves_order() {
        let released = RawControllerState::default();
        let current = RawControllerState::default()
            .with_button(StandardButton::RightClusterBottom, ButtonState::digital(true))
            .with_button(StandardButton::RightClusterRight, ButtonState::digital(true));
        let events = events_between(&released, &current, &Keymap::default());

        let mut sink: Vec<KeyEvent> = Vec::new();
        assert_eq!(dispatch(events.clone(), &mut sink), 2);
        assert_eq!(sink, events);
    }

    #[tokio::test]
    async fn test_channel_sink_drops_when_full() {
        let (tx, mut rx) = mpsc::channel(1);
        let mut sink = ChannelSink::new(tx);
        let event = KeyEvent {
            kind: KeyEventKind::KeyDown,
            key: "z".to_string(),
            signal: Signal::Button(StandardButton::RightClusterBottom),
            timestamp: Local::now(),
        };

        sink.emit(event.clone());
        sink.emit(event.clone());
        assert_eq!(sink.dropped(), 1);
        assert_eq!(rx.recv().await, Some(event));
    }
}
