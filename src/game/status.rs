//! Detector status shared with the game window HUD

use std::sync::Arc;

use parking_lot::RwLock;

use crate::gesture::{command_label, Direction};

/// What the detection task last saw
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectorStatus {
    /// Zone of the current frame, before the cooldown
    pub zone: Option<Direction>,
    /// Last command that made it through the cooldown
    pub last_command: Option<Direction>,
    pub hand_visible: bool,
    pub running: bool,
    pub frames: u64,
}

impl DetectorStatus {
    pub fn zone_label(&self) -> &'static str {
        command_label(self.zone)
    }

    /// One-line summary for the HUD
    pub fn summary(&self) -> String {
        let detector = if self.running { "running" } else { "stopped" };
        let hand = if self.hand_visible { "hand" } else { "no hand" };
        format!(
            "detector {} | {} | last {} | frames {}",
            detector,
            hand,
            command_label(self.last_command),
            self.frames
        )
    }
}

pub type SharedStatus = Arc<RwLock<DetectorStatus>>;

pub fn shared_status() -> SharedStatus {
    Arc::new(RwLock::new(DetectorStatus::default()))
}
