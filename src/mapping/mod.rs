//! Mapping of controller state onto synthetic keyboard events.
//!
//! The pipeline runs once per tick and only carries the previous
//! [`Snapshot`] across ticks. Everything else is recomputed from the raw
//! state every time.

pub mod diff;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod keymap;
pub mod normalize;
pub mod snapshot;

// Re-exports for easier access
pub use diff::{diff, ButtonChange, ChangeSet};
pub use dispatch::{dispatch, ChannelSink, KeyEvent, KeyEventKind, KeyEventSink, Signal};
pub use engine::{step, TickOutput};
pub use error::MappingError;
pub use keymap::{KeyDescriptor, Keymap, KeymapConfig};
pub use normalize::{normalize, NormalizedState, StickDirection, ACTIVATION_THRESHOLD, RING_WIDTH};
pub use snapshot::Snapshot;
