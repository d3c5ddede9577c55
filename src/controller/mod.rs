//! Controller subsystem for gamepad input sampling
//!
//! 1. [`layout`] - Standard button/axis index layout and signal identifiers
//! 2. [`raw_state`] - Per-tick raw controller state
//! 3. [`sampler`] - Device backend producing raw state and connection events
//!
//! # Architecture
//!
//! ```text
//! Gamepad ──► Sampler ──► RawControllerState ──► mapping engine
//!               │
//!               └──► ConnectionEvent ──► frame loop
//! ```

pub mod layout;
pub mod raw_state;
pub mod sampler;

pub use layout::{StandardAxis, StandardButton, Trigger, AXIS_COUNT, BUTTON_COUNT};
pub use raw_state::{ButtonState, RawControllerState, ShapeError};
pub use sampler::{ConnectionEvent, ControllerSource, GilrsSource, SourceError};
