//! Frame scheduler - drives the frame loop from a fixed-rate timer
//!
//! The timer plays the role of a display's "next paint" callback: it is armed
//! for the next frame independently of how long the current frame takes, and
//! a frame that is missed is skipped rather than made up in a burst. While no
//! controller is connected the frame timer is not used at all; the scheduler
//! only polls for connection notifications at a slower rate.

use crate::controller::sampler::ControllerSource;
use crate::driver::frame_loop::LoopState;
use crate::mapping::dispatch::KeyEventSink;
use crate::mapping::keymap::Keymap;
use chrono::{DateTime, Local, TimeDelta};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

// Scheduler settings
#[derive(Clone, Debug)]
pub struct SchedulerSettings {
    pub frame_interval_ms: u64,
    pub reconnect_poll_ms: u64,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            frame_interval_ms: 16,   // ~60 Hz display refresh
            reconnect_poll_ms: 250,
        }
    }
}

/// Counters of a scheduler run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub frames: u64,
    pub events: u64,
}

pub struct FrameScheduler<C: ControllerSource, K: KeyEventSink> {
    source: C,
    sink: K,
    keymap: Arc<Keymap>,
    settings: SchedulerSettings,
    stats: SchedulerStats,
}

impl<C: ControllerSource, K: KeyEventSink> FrameScheduler<C, K> {
    pub fn new(source: C, sink: K, keymap: Arc<Keymap>, settings: Option<SchedulerSettings>) -> Self {
        let settings = settings.unwrap_or_default();
        debug!("Creating frame scheduler with settings: {:?}", settings);
        Self {
            source,
            sink,
            keymap,
            settings,
            stats: SchedulerStats::default(),
        }
    }

    /// Runs until cancelled. Returns the final state and the run's counters.
    pub async fn run(mut self, cancel: CancellationToken) -> (LoopState, SchedulerStats) {
        info!(
            "Starting frame scheduler: frame every {}ms, reconnect poll every {}ms",
            self.settings.frame_interval_ms, self.settings.reconnect_poll_ms
        );

        let mut frames = interval(Duration::from_millis(self.settings.frame_interval_ms));
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let reconnect_poll = Duration::from_millis(self.settings.reconnect_poll_ms);

        let mut state = LoopState::new(self.keymap.clone());

        let mut window_events = 0;
        let mut last_log_time = Local::now();
        let log_interval = TimeDelta::seconds(10);

        loop {
            if state.is_connected() {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = frames.tick() => {
                        let before = self.stats.events;
                        state = self.frame(state, Local::now());
                        window_events += self.stats.events - before;
                    }
                }
            } else {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = sleep(reconnect_poll) => {
                        state = self.poll_connection(state);
                        if state.is_connected() {
                            // Start the frame cadence fresh from the connect
                            frames.reset();
                        }
                    }
                }
            }

            let now = Local::now();
            if now - last_log_time > log_interval {
                info!(
                    "Frame scheduler stats: {} events in last {} seconds, state {}",
                    window_events,
                    log_interval.num_seconds(),
                    state.phase()
                );
                window_events = 0;
                last_log_time = now;
            }
        }

        info!(
            "Frame scheduler stopped after {} frames and {} events",
            self.stats.frames, self.stats.events
        );
        (state, self.stats)
    }

    fn poll_connection(&mut self, mut state: LoopState) -> LoopState {
        while let Some(event) = self.source.poll_connection() {
            state = state.on_connection(event);
        }
        state
    }

    /// Processes one frame: connection notifications first, then a sample.
    pub fn frame(&mut self, state: LoopState, timestamp: DateTime<Local>) -> LoopState {
        let state = self.poll_connection(state);
        if !state.is_connected() {
            return state;
        }

        let sample = self.source.sample();
        let (state, emitted) = state.on_frame(sample, timestamp, &mut self.sink);
        self.stats.frames += 1;
        self.stats.events += emitted as u64;
        state
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::layout::{StandardButton, Trigger};
    use crate::controller::raw_state::{ButtonState, RawControllerState, ShapeError};
    use crate::controller::sampler::ConnectionEvent;
    use crate::mapping::dispatch::{ChannelSink, KeyEvent, KeyEventKind};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    /// Connects on the first poll, plays back samples, then disconnects
    struct ScriptedSource {
        announced: bool,
        samples: VecDeque<RawControllerState>,
        gone: Arc<AtomicBool>,
    }

    impl ScriptedSource {
        fn new(samples: Vec<RawControllerState>) -> Self {
            Self {
                announced: false,
                samples: samples.into(),
                gone: Arc::new(AtomicBool::new(false)),
            }
        }

        /// Set once the disconnect has been handed out
        fn gone_flag(&self) -> Arc<AtomicBool> {
            self.gone.clone()
        }
    }

    impl ControllerSource for ScriptedSource {
        fn poll_connection(&mut self) -> Option<ConnectionEvent> {
            if !self.announced {
                self.announced = true;
                return Some(ConnectionEvent::Connected {
                    name: "Scripted Pad".to_string(),
                });
            }
            if self.samples.is_empty() && !self.gone.load(Ordering::SeqCst) {
                self.gone.store(true, Ordering::SeqCst);
                return Some(ConnectionEvent::Disconnected);
            }
            None
        }

        fn sample(&mut self) -> Option<Result<RawControllerState, ShapeError>> {
            self.samples.pop_front().map(Ok)
        }
    }

    fn press_then_release() -> Vec<RawControllerState> {
        let idle = RawControllerState::default();
        let pressed = RawControllerState::default()
            .with_button(StandardButton::RightClusterBottom, ButtonState::digital(true))
            .with_trigger(Trigger::Left, 0.95);
        vec![idle.clone(), pressed.clone(), pressed, idle]
    }

    #[test]
    fn test_frames_drive_loop_until_disconnect() {
        let source = ScriptedSource::new(press_then_release());
        let mut scheduler = FrameScheduler::new(source, Vec::<KeyEvent>::new(), Arc::new(Keymap::default()), None);

        let mut state = LoopState::new(Arc::new(Keymap::default()));
        for _ in 0..6 {
            state = scheduler.frame(state, Local::now());
        }

        assert_eq!(state.phase(), "disconnected");
        assert_eq!(scheduler.stats().frames, 4);
        assert_eq!(scheduler.stats().events, 4);

        let summary: Vec<_> = scheduler
            .sink()
            .iter()
            .map(|e| (e.kind, e.key.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (KeyEventKind::KeyDown, "z"),
                (KeyEventKind::KeyDown, "e"),
                (KeyEventKind::KeyUp, "z"),
                (KeyEventKind::KeyUp, "e"),
            ]
        );
    }

    #[tokio::test]
    async fn test_run_until_cancelled() {
        let (tx, mut rx) = mpsc::channel(16);
        let settings = SchedulerSettings {
            frame_interval_ms: 1,
            reconnect_poll_ms: 1,
        };
        let source = ScriptedSource::new(press_then_release());
        let gone = source.gone_flag();
        let scheduler = FrameScheduler::new(
            source,
            ChannelSink::new(tx),
            Arc::new(Keymap::default()),
            Some(settings),
        );

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(scheduler.run(cancel.clone()));

        let mut received = Vec::new();
        for _ in 0..4 {
            let event = timeout(Duration::from_secs(5), rx.recv())
                .await
                .expect("timed out waiting for key event")
                .expect("channel closed");
            received.push((event.kind, event.key));
        }
        assert_eq!(received[0], (KeyEventKind::KeyDown, "z".to_string()));
        assert_eq!(received[3], (KeyEventKind::KeyUp, "e".to_string()));

        // The disconnect arrives on the frame after the last sample
        timeout(Duration::from_secs(5), async {
            while !gone.load(Ordering::SeqCst) {
                sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("timed out waiting for disconnect");

        cancel.cancel();
        let (state, stats) = handle.await.unwrap();
        assert_eq!(stats.events, 4);
        assert!(!state.is_connected());
    }
}
