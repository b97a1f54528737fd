//! Capture loops
//!
//! A pipeline pulls frames from a [`FrameSource`] and feeds them to a
//! [`FrameHandler`] until the stream ends, a read fails, a quit key arrives
//! or shutdown is signalled. Config reloads are applied between frames.

pub mod game;
pub mod keys;

pub use game::{run_detection, ZoneDetector};
pub use keys::{run_keys, KeysController, KeysPipeline};

use std::fmt;
use std::time::Instant;

use tracing::{error, info};

use crate::config::{AppConfig, ConfigWatcher};
use crate::gesture::Direction;
use crate::input::{FrameSource, HandFrame};
use crate::shutdown::ShutdownSignal;

/// What one frame produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameOutcome {
    /// Classifier output before rate limiting
    pub gesture: Option<Direction>,
    /// Command that passed the rate limiter
    pub accepted: Option<Direction>,
    pub quit: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    EndOfStream,
    QuitKey,
    Shutdown,
    SourceFailed(String),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::EndOfStream => f.write_str("end of stream"),
            StopReason::QuitKey => f.write_str("quit key"),
            StopReason::Shutdown => f.write_str("shutdown"),
            StopReason::SourceFailed(e) => write!(f, "source failed: {}", e),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u64,
    pub accepted: u64,
    pub stop: StopReason,
}

/// Per-frame logic of a pipeline
pub trait FrameHandler {
    fn name(&self) -> &'static str;

    fn handle_frame(&mut self, frame: &HandFrame, now: Instant) -> FrameOutcome;

    /// Apply the live-tunable parts of a reloaded config
    fn apply_config(&mut self, config: &AppConfig);

    /// Called once when the loop exits
    fn finish(&mut self, _stop: &StopReason) {}
}

/// Run `handler` over `source` until something stops the loop
pub async fn drive<H: FrameHandler>(
    source: &mut dyn FrameSource,
    handler: &mut H,
    watcher: &mut ConfigWatcher,
    mut shutdown: ShutdownSignal,
) -> RunSummary {
    info!("Starting {} pipeline on {}", handler.name(), source.describe());

    let mut frames = 0u64;
    let mut accepted = 0u64;

    let stop = loop {
        tokio::select! {
            read = source.next_frame() => match read {
                Ok(Some(frame)) => {
                    frames += 1;
                    let outcome = handler.handle_frame(&frame, Instant::now());
                    if outcome.accepted.is_some() {
                        accepted += 1;
                    }
                    if outcome.quit {
                        break StopReason::QuitKey;
                    }
                }
                Ok(None) => break StopReason::EndOfStream,
                Err(e) => {
                    error!("Failed to read frame from {}: {}", source.describe(), e);
                    break StopReason::SourceFailed(e.to_string());
                }
            },

            Some(new_config) = watcher.next_config() => {
                info!("📝 Configuration file changed, applying to {} pipeline", handler.name());
                handler.apply_config(&new_config);
            }

            _ = shutdown.wait() => break StopReason::Shutdown,
        }
    };

    handler.finish(&stop);
    info!(
        "{} pipeline stopped ({}): {} frames, {} commands",
        handler.name(),
        stop,
        frames,
        accepted
    );

    RunSummary {
        frames,
        accepted,
        stop,
    }
}
