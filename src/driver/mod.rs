//! Loop driver: ties sampling, the mapping pipeline and the event sink
//! together once per frame.
//!
//! - [`frame_loop`] - connection lifecycle and the retained previous snapshot
//! - [`scheduler`] - tokio timer adapter that invokes the loop every frame

pub mod frame_loop;
pub mod scheduler;

pub use frame_loop::{FrameLoop, LoopState};
pub use scheduler::{FrameScheduler, SchedulerSettings, SchedulerStats};
