//! Per-tick pipeline
//!
//! ```text
//! RawControllerState ──► normalize ──► Snapshot ──► diff(previous) ──► synthesize ──► KeyEvent*
//!                                         │
//!                                         └──► next tick's previous
//! ```
//!
//! [`step`] is pure: the previous snapshot comes in as an argument and the
//! next one goes out in the result, so ticks can be replayed without a device.

use crate::controller::raw_state::RawControllerState;
use crate::mapping::diff::diff;
use crate::mapping::dispatch::{synthesize, KeyEvent};
use crate::mapping::keymap::Keymap;
use crate::mapping::normalize::normalize;
use crate::mapping::snapshot::Snapshot;
use chrono::{DateTime, Local};

/// Result of one tick
#[derive(Debug, Clone)]
pub struct TickOutput {
    pub events: Vec<KeyEvent>,
    pub snapshot: Snapshot,
}

pub fn step(
    previous: Option<&Snapshot>,
    raw: &RawControllerState,
    keymap: &Keymap,
    timestamp: DateTime<Local>,
) -> TickOutput {
    let normalized = normalize(raw);
    let snapshot = Snapshot::capture(raw, &normalized);
    let changes = diff(previous, &snapshot);
    let events = synthesize(previous, &snapshot, &changes, keymap, timestamp);

    TickOutput { events, snapshot }
}
