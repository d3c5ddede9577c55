pub mod config;
pub mod controller;
pub mod driver;
pub mod mapping;

use crate::controller::sampler::GilrsSource;
use crate::driver::scheduler::FrameScheduler;
use crate::mapping::dispatch::{ChannelSink, KeyEvent};
use color_eyre::{eyre::eyre, Result};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let path = config::config_path();
    config::ensure_default_config(&path).await?;
    let settings = config::load_settings(&path).await?;

    let keymap = Arc::new(
        settings
            .build_keymap()
            .map_err(|e| eyre!("Failed to build keymap: {}", e))?,
    );

    let (event_sender, event_receiver) = mpsc::channel(1000);
    let consumer_handle = tokio::spawn(consume_key_events(event_receiver));

    info!("Initializing gamepad source");
    let source = GilrsSource::new().map_err(|e| eyre!("Failed to initialize gamepad source: {}", e))?;

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutdown requested"),
            Err(e) => error!("Failed to listen for shutdown signal: {}", e),
        }
        shutdown.cancel();
    });

    // gilrs is not Send, so the scheduler stays on the main task
    let scheduler = FrameScheduler::new(
        source,
        ChannelSink::new(event_sender),
        keymap,
        Some(settings.scheduler_settings()),
    );
    let (state, stats) = scheduler.run(cancel).await;

    // The sink went down with the scheduler, so the consumer drains and ends
    let delivered = consumer_handle
        .await
        .map_err(|e| eyre!("Key event consumer failed: {}", e))?;

    info!(
        "Stopped in state {} after {} frames, {} key events ({} delivered)",
        state.phase(),
        stats.frames,
        stats.events,
        delivered
    );
    Ok(())
}

/// Receives synthesized key events. Stands in for the page the events would be
/// delivered to.
async fn consume_key_events(mut receiver: mpsc::Receiver<KeyEvent>) -> u64 {
    let mut delivered = 0;
    while let Some(event) = receiver.recv().await {
        delivered += 1;
        info!(
            "{} {} ({}) at {}",
            event.kind,
            event.key,
            event.signal,
            event.timestamp.format("%H:%M:%S%.3f")
        );
    }
    info!("Key event channel closed after {} events", delivered);
    delivered
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
