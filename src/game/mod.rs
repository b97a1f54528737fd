//! Runner game driven by gesture commands
//!
//! The window runs on the main thread and blocks until it is closed.

mod app;
pub mod state;
pub mod status;

pub use app::{GameApp, GameClock};
pub use state::{GameState, PlayerRect};
pub use status::{shared_status, DetectorStatus, SharedStatus};

use anyhow::Result;

use crate::config::GameConfig;
use crate::dispatch::CommandSlot;
use crate::shutdown::ShutdownSignal;

pub const WINDOW_TITLE: &str = "Subway Runner - Gesture Controlled";

/// Open the game window and block until it closes
///
/// Must be called on the main thread.
pub fn run_game_window(
    config: &GameConfig,
    slot: CommandSlot,
    status: SharedStatus,
    shutdown: ShutdownSignal,
) -> Result<()> {
    let size = [config.width as f32, config.height as f32];
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(WINDOW_TITLE)
            .with_inner_size(size)
            .with_resizable(false),
        ..Default::default()
    };

    let app = GameApp::new(config, slot, status).with_shutdown(shutdown);
    eframe::run_native(
        WINDOW_TITLE,
        native_options,
        Box::new(move |_cc| Ok(Box::new(app))),
    )
    .map_err(|e| anyhow::anyhow!("Game window failed: {}", e))
}
