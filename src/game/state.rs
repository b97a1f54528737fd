//! Runner game state and per-tick physics
//!
//! One call to [`GameState::step`] is one game tick: apply at most one
//! command, advance the jump arc, set the slide pose, clamp to the canvas.

use crate::config::GameConfig;
use crate::gesture::Direction;

/// Distance between the player's feet and the bottom of the canvas
const GROUND_MARGIN: f32 = 10.0;

/// Fraction of the squared jump counter applied per tick
const JUMP_GAIN: f32 = 0.5;

/// Player rectangle in canvas pixels (origin top-left)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone)]
pub struct GameState {
    config: GameConfig,
    x: i32,
    y: f32,
    jump_count: Option<i32>,
    sliding: bool,
    ticks: u64,
}

impl GameState {
    pub fn new(config: &GameConfig) -> Self {
        let size = config.player_size as i32;
        Self {
            config: config.clone(),
            x: config.width as i32 / 2 - size / 2,
            y: Self::ground_y(config),
            jump_count: None,
            sliding: false,
            ticks: 0,
        }
    }

    fn ground_y(config: &GameConfig) -> f32 {
        config.height as f32 - config.player_size as f32 - GROUND_MARGIN
    }

    fn max_x(&self) -> i32 {
        self.config.width as i32 - self.config.player_size as i32
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn is_jumping(&self) -> bool {
        self.jump_count.is_some()
    }

    /// True while the one-tick slide pose is showing
    pub fn is_sliding(&self) -> bool {
        self.sliding
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Advance one tick, applying `command` first
    pub fn step(&mut self, command: Option<Direction>) {
        self.ticks += 1;
        self.sliding = false;

        match command {
            Some(Direction::Left) => self.x -= self.config.step_px,
            Some(Direction::Right) => self.x += self.config.step_px,
            Some(Direction::Up) if self.jump_count.is_none() => {
                self.jump_count = Some(self.config.jump_frames);
            }
            Some(Direction::Down) => self.sliding = true,
            _ => {}
        }

        self.advance_jump();
        self.x = self.x.clamp(0, self.max_x());
    }

    fn advance_jump(&mut self) {
        let Some(count) = self.jump_count else {
            return;
        };

        if count >= -self.config.jump_frames {
            let sign = if count < 0 { -1.0 } else { 1.0 };
            self.y -= (count * count) as f32 * JUMP_GAIN * sign;
            self.jump_count = Some(count - 1);
        } else {
            self.jump_count = None;
            self.y = Self::ground_y(&self.config);
        }
    }

    /// Rectangle to draw this frame; the slide pose shortens it from the bottom
    pub fn player_rect(&self) -> PlayerRect {
        let size = self.config.player_size as f32;
        let height = if self.sliding {
            self.config.slide_height as f32
        } else {
            size
        };

        PlayerRect {
            x: self.x as f32,
            y: self.y,
            width: size,
            height,
        }
    }
}
