//! eframe application for the runner game
//!
//! Repaints continuously but advances the game on a fixed clock, taking at
//! most one command from the [`CommandSlot`] per tick.

use std::time::{Duration, Instant};

use egui::{Align2, Color32, FontId, Pos2, Rect, Vec2};
use tracing::{debug, info};

use super::state::GameState;
use super::status::SharedStatus;
use crate::config::GameConfig;
use crate::dispatch::CommandSlot;
use crate::shutdown::ShutdownSignal;

const BACKGROUND: Color32 = Color32::from_rgb(30, 30, 30);
const PLAYER: Color32 = Color32::from_rgb(0, 128, 255);
const ZONE_TEXT: Color32 = Color32::from_rgb(0, 255, 0);

/// Upper bound on ticks replayed after a stalled frame
const MAX_CATCH_UP_TICKS: u32 = 5;

/// Fixed-rate tick scheduler
#[derive(Debug, Clone)]
pub struct GameClock {
    period: Duration,
    next_tick: Instant,
}

impl GameClock {
    pub fn new(tick_hz: u32, now: Instant) -> Self {
        let period = Duration::from_nanos(1_000_000_000 / u64::from(tick_hz.max(1)));
        Self {
            period,
            next_tick: now + period,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Number of ticks due at `now`; a long stall drops the excess
    pub fn due_ticks(&mut self, now: Instant) -> u32 {
        let mut due = 0;
        while now >= self.next_tick {
            due += 1;
            self.next_tick += self.period;
            if due == MAX_CATCH_UP_TICKS {
                if now >= self.next_tick {
                    self.next_tick = now + self.period;
                }
                break;
            }
        }
        due
    }
}

pub struct GameApp {
    game: GameState,
    clock: GameClock,
    slot: CommandSlot,
    status: SharedStatus,
    shutdown: Option<ShutdownSignal>,
}

impl GameApp {
    pub fn new(config: &GameConfig, slot: CommandSlot, status: SharedStatus) -> Self {
        Self {
            game: GameState::new(config),
            clock: GameClock::new(config.tick_hz, Instant::now()),
            slot,
            status,
            shutdown: None,
        }
    }

    /// Close the window when `signal` fires (Ctrl+C in the terminal)
    pub fn with_shutdown(mut self, signal: ShutdownSignal) -> Self {
        self.shutdown = Some(signal);
        self
    }

    fn should_close(&self, ctx: &egui::Context) -> bool {
        if ctx.input(|i| i.key_pressed(egui::Key::Q)) {
            info!("Quit requested from the game window");
            return true;
        }
        self.shutdown
            .as_ref()
            .is_some_and(ShutdownSignal::is_triggered)
    }

    /// Run the ticks due at `now`
    fn advance(&mut self, now: Instant) {
        for _ in 0..self.clock.due_ticks(now) {
            let command = self.slot.take();
            if let Some(direction) = command {
                debug!("Game tick {} applies {}", self.game.ticks() + 1, direction);
            }
            self.game.step(command);
        }
    }

    fn paint(&self, ui: &mut egui::Ui) {
        let origin = ui.max_rect().min;
        let painter = ui.painter();
        let player = self.game.player_rect();

        painter.rect_filled(
            Rect::from_min_size(
                origin + Vec2::new(player.x, player.y),
                Vec2::new(player.width, player.height),
            ),
            0.0,
            PLAYER,
        );

        let (zone, summary) = {
            let status = self.status.read();
            (status.zone_label(), status.summary())
        };

        painter.text(
            origin + Vec2::new(10.0, 10.0),
            Align2::LEFT_TOP,
            format!("Detected: {}", zone),
            FontId::proportional(24.0),
            ZONE_TEXT,
        );
        painter.text(
            origin + Vec2::new(10.0, 42.0),
            Align2::LEFT_TOP,
            summary,
            FontId::monospace(12.0),
            Color32::from_gray(170),
        );
        painter.text(
            Pos2::new(ui.max_rect().right() - 10.0, origin.y + 10.0),
            Align2::RIGHT_TOP,
            "q: quit",
            FontId::proportional(12.0),
            Color32::from_gray(120),
        );
    }
}

impl eframe::App for GameApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.should_close(ctx) {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }

        self.advance(Instant::now());

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(BACKGROUND))
            .show(ctx, |ui| self.paint(ui));

        ctx.request_repaint_after(self.clock.period());
    }
}
