//! Configuration management for Hand Joystick
//!
//! Handles loading, parsing, validation, and hot-reloading of YAML
//! configuration files. Every field has a default, so a missing file or an
//! empty document yields a working setup.

pub mod watcher;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

pub use watcher::ConfigWatcher;

/// Replay pacing bounds, in frames per second
pub const MIN_REPLAY_FPS: f32 = 0.1;
pub const MAX_REPLAY_FPS: f32 = 1000.0;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub zones: ZonesConfig,
    #[serde(default)]
    pub calibrated: CalibratedConfig,
    #[serde(default)]
    pub game: GameConfig,
}

/// Where frame reports come from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Spawn a detector helper and read its stdout
    #[default]
    Command,
    /// Read reports from standard input
    Stdin,
    /// Replay a recorded JSON-lines file
    File,
}

/// Position source configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SourceConfig {
    #[serde(rename = "type", default)]
    pub kind: SourceKind,
    #[serde(default = "default_program")]
    pub program: String,
    #[serde(default = "default_args")]
    pub args: Vec<String>,
    /// Recording to replay (file sources)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Replay pacing; unpaced when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fps: Option<f32>,
    #[serde(default = "default_camera_index")]
    pub camera_index: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture_height: Option<u32>,
    /// Detector tracking confidence; each mode has its own default when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_confidence: Option<f32>,
    /// Flip x so the reference point matches a mirrored selfie view
    #[serde(default = "default_true")]
    pub mirror: bool,
    #[serde(default = "default_min_hand_score")]
    pub min_hand_score: f32,
}

/// Fixed-zone classifier and cooldown (game mode)
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ZonesConfig {
    #[serde(default = "default_zone_low")]
    pub low: f64,
    #[serde(default = "default_zone_high")]
    pub high: f64,
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
}

/// Calibrated dead-zone classifier and change gate (keys mode)
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CalibratedConfig {
    #[serde(default = "default_deadzone_px")]
    pub deadzone_px: i32,
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    /// Capture size requested from the detector when the source leaves it unset
    #[serde(default = "default_capture_width")]
    pub capture_width: u32,
    #[serde(default = "default_capture_height")]
    pub capture_height: u32,
    /// Tracking confidence requested from the detector when the source leaves it unset
    #[serde(default = "default_tracking_confidence")]
    pub tracking_confidence: f32,
}

/// Runner game canvas and physics
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GameConfig {
    #[serde(default = "default_game_width")]
    pub width: u32,
    #[serde(default = "default_game_height")]
    pub height: u32,
    #[serde(default = "default_player_size")]
    pub player_size: u32,
    #[serde(default = "default_slide_height")]
    pub slide_height: u32,
    #[serde(default = "default_step_px")]
    pub step_px: i32,
    #[serde(default = "default_jump_frames")]
    pub jump_frames: i32,
    #[serde(default = "default_tick_hz")]
    pub tick_hz: u32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::default(),
            program: default_program(),
            args: default_args(),
            path: None,
            fps: None,
            camera_index: default_camera_index(),
            capture_width: None,
            capture_height: None,
            tracking_confidence: None,
            mirror: true,
            min_hand_score: default_min_hand_score(),
        }
    }
}

impl Default for ZonesConfig {
    fn default() -> Self {
        Self {
            low: default_zone_low(),
            high: default_zone_high(),
            cooldown_ms: default_cooldown_ms(),
        }
    }
}

impl Default for CalibratedConfig {
    fn default() -> Self {
        Self {
            deadzone_px: default_deadzone_px(),
            delay_ms: default_delay_ms(),
            capture_width: default_capture_width(),
            capture_height: default_capture_height(),
            tracking_confidence: default_tracking_confidence(),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: default_game_width(),
            height: default_game_height(),
            player_size: default_player_size(),
            slide_height: default_slide_height(),
            step_px: default_step_px(),
            jump_frames: default_jump_frames(),
            tick_hz: default_tick_hz(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file with validation
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config = Self::from_yaml(&contents)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load the file if it exists, otherwise fall back to defaults
    pub async fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if fs::try_exists(path).await.unwrap_or(false) {
            Self::load(path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Parse and validate a YAML document (an empty document means defaults)
    pub fn from_yaml(contents: &str) -> Result<Self> {
        let config: AppConfig = if contents.trim().is_empty() {
            AppConfig::default()
        } else {
            serde_yaml::from_str(contents).context("Failed to parse YAML config")?
        };

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let yaml = serde_yaml::to_string(self).context("Failed to serialize config to YAML")?;

        fs::write(path, yaml)
            .await
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration for correctness and consistency
    pub fn validate(&self) -> Result<()> {
        let source = &self.source;
        match source.kind {
            SourceKind::Command if source.program.trim().is_empty() => {
                anyhow::bail!("source.program cannot be empty for a command source");
            }
            SourceKind::File => {
                let has_path = source.path.as_ref().is_some_and(|p| !p.as_os_str().is_empty());
                if !has_path {
                    anyhow::bail!("source.path is required for a file source");
                }
            }
            _ => {}
        }

        if let Some(fps) = source.fps {
            if !(MIN_REPLAY_FPS..=MAX_REPLAY_FPS).contains(&fps) {
                anyhow::bail!(
                    "source.fps {} is invalid (must be {}-{})",
                    fps,
                    MIN_REPLAY_FPS,
                    MAX_REPLAY_FPS
                );
            }
        }

        let confidences = [
            ("source.tracking_confidence", source.tracking_confidence),
            ("calibrated.tracking_confidence", Some(self.calibrated.tracking_confidence)),
        ];
        for (name, value) in confidences {
            if let Some(value) = value {
                if !(0.0..=1.0).contains(&value) {
                    anyhow::bail!("{} {} is invalid (must be 0.0-1.0)", name, value);
                }
            }
        }

        if !(0.0..=1.0).contains(&self.source.min_hand_score) {
            anyhow::bail!(
                "source.min_hand_score {} is invalid (must be 0.0-1.0)",
                self.source.min_hand_score
            );
        }

        let zones = &self.zones;
        if !(zones.low > 0.0 && zones.low < zones.high && zones.high < 1.0) {
            anyhow::bail!(
                "zones must satisfy 0 < low < high < 1 (got low={}, high={})",
                zones.low,
                zones.high
            );
        }

        if self.calibrated.deadzone_px < 0 {
            anyhow::bail!(
                "calibrated.deadzone_px cannot be negative (got {})",
                self.calibrated.deadzone_px
            );
        }

        let game = &self.game;
        if game.tick_hz == 0 {
            anyhow::bail!("game.tick_hz must be at least 1");
        }
        if game.player_size == 0 || game.player_size > game.width || game.player_size > game.height
        {
            anyhow::bail!(
                "game.player_size {} does not fit a {}x{} canvas",
                game.player_size,
                game.width,
                game.height
            );
        }
        if game.slide_height == 0 || game.slide_height > game.player_size {
            anyhow::bail!(
                "game.slide_height {} must be between 1 and player_size {}",
                game.slide_height,
                game.player_size
            );
        }
        if game.step_px <= 0 {
            anyhow::bail!("game.step_px must be positive (got {})", game.step_px);
        }
        if game.jump_frames <= 0 {
            anyhow::bail!("game.jump_frames must be positive (got {})", game.jump_frames);
        }

        Ok(())
    }
}

// Default value functions
fn default_program() -> String { "python3".to_string() }
fn default_args() -> Vec<String> { vec!["scripts/hand_detect.py".to_string()] }
fn default_camera_index() -> u32 { 1 }
fn default_true() -> bool { true }
fn default_min_hand_score() -> f32 { 0.7 }
fn default_zone_low() -> f64 { 0.3 }
fn default_zone_high() -> f64 { 0.7 }
fn default_cooldown_ms() -> u64 { 500 }
fn default_deadzone_px() -> i32 { 50 }
fn default_delay_ms() -> u64 { 800 }
fn default_capture_width() -> u32 { 640 }
fn default_capture_height() -> u32 { 480 }
fn default_tracking_confidence() -> f32 { 0.6 }
fn default_game_width() -> u32 { 600 }
fn default_game_height() -> u32 { 400 }
fn default_player_size() -> u32 { 50 }
fn default_slide_height() -> u32 { 30 }
fn default_step_px() -> i32 { 50 }
fn default_jump_frames() -> i32 { 10 }
fn default_tick_hz() -> u32 { 30 }

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_document_yields_defaults() {
        let config = AppConfig::from_yaml("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.zones.cooldown_ms, 500);
        assert_eq!(config.calibrated.deadzone_px, 50);
        assert_eq!(config.calibrated.delay_ms, 800);
        assert_eq!(config.calibrated.tracking_confidence, 0.6);
        assert_eq!(config.source.tracking_confidence, None);
        assert_eq!(config.game.width, 600);
        assert_eq!(config.game.height, 400);
        assert_eq!(config.source.camera_index, 1);
        assert_eq!(config.source.kind, SourceKind::Command);
        assert_eq!(config.source.program, "python3");
    }

    #[test]
    fn test_partial_document_keeps_other_defaults() {
        let yaml = r#"
source:
  type: stdin
  mirror: false
calibrated:
  deadzone_px: 80
"#;
        let config = AppConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.source.kind, SourceKind::Stdin);
        assert!(!config.source.mirror);
        assert_eq!(config.source.min_hand_score, 0.7);
        assert_eq!(config.calibrated.deadzone_px, 80);
        assert_eq!(config.calibrated.delay_ms, 800);
        assert_eq!(config.zones.low, 0.3);
    }

    #[test]
    fn test_file_source_parses() {
        let yaml = r#"
source:
  type: file
  path: recordings/session.jsonl
  fps: 30
"#;
        let config = AppConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.source.kind, SourceKind::File);
        assert_eq!(config.source.path, Some(PathBuf::from("recordings/session.jsonl")));
        assert_eq!(config.source.fps, Some(30.0));
    }

    #[test]
    fn test_validation_rejects_inverted_zones() {
        let yaml = "zones:\n  low: 0.8\n  high: 0.2\n";
        let err = AppConfig::from_yaml(yaml).unwrap_err();
        assert!(format!("{:#}", err).contains("0 < low < high < 1"));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.calibrated.deadzone_px = -1;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.game.tick_hz = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.game.player_size = 700;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.game.slide_height = 60;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.source.min_hand_score = 1.5;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.source.tracking_confidence = Some(-0.1);
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.source.program = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.source.kind = SourceKind::File;
        assert!(config.validate().is_err());
        config.source.path = Some(PathBuf::from("session.jsonl"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_bounds_replay_rate() {
        let mut config = AppConfig::default();
        config.source.kind = SourceKind::File;
        config.source.path = Some(PathBuf::from("session.jsonl"));

        for fps in [1e-40, 0.0, -5.0, 0.05, f32::NAN, f32::INFINITY, 5000.0] {
            config.source.fps = Some(fps);
            assert!(config.validate().is_err(), "fps {} should be rejected", fps);
        }
        for fps in [0.1, 30.0, 1000.0] {
            config.source.fps = Some(fps);
            assert!(config.validate().is_ok(), "fps {} should be accepted", fps);
        }

        let err = AppConfig::from_yaml("source:\n  type: file\n  path: a.jsonl\n  fps: 1e-40\n")
            .unwrap_err();
        assert!(format!("{:#}", err).contains("source.fps"));
    }

    #[tokio::test]
    async fn test_save_then_load() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("config.yaml");

        let mut config = AppConfig::default();
        config.zones.cooldown_ms = 250;
        config.source.capture_width = Some(1280);
        config.save(&path).await?;

        let loaded = AppConfig::load(&path).await?;
        assert_eq!(loaded, config);
        Ok(())
    }

    #[tokio::test]
    async fn test_load_or_default_without_file() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config = AppConfig::load_or_default(temp_dir.path().join("missing.yaml")).await?;
        assert_eq!(config, AppConfig::default());
        Ok(())
    }
}
