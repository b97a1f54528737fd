//! Key sinks - turn accepted commands into key presses
//!
//! [`EnigoKeySink`] sends OS-level arrow key clicks. [`ConsoleKeySink`] only
//! logs, which is handy without a desktop session or for checking a
//! detector setup.

use enigo::{Direction as KeyDirection, Enigo, Key, Keyboard, Settings};
use tracing::{debug, info};

use crate::error::DispatchError;
use crate::gesture::Direction;

/// Anything that can press the key for a direction
///
/// Presses are synchronous: the caller's loop waits until the key event has
/// been issued. Not `Send`, since some platform backends are thread-bound.
pub trait KeySink {
    /// Sink name for logs (e.g. "enigo", "console")
    fn name(&self) -> &str;

    fn press(&mut self, direction: Direction) -> Result<(), DispatchError>;
}

/// Synthetic keyboard events through `enigo`
pub struct EnigoKeySink {
    enigo: Enigo,
}

impl EnigoKeySink {
    pub fn new() -> Result<Self, DispatchError> {
        let enigo =
            Enigo::new(&Settings::default()).map_err(|e| DispatchError::Init(e.to_string()))?;
        Ok(Self { enigo })
    }

    fn key_for(direction: Direction) -> Key {
        match direction {
            Direction::Left => Key::LeftArrow,
            Direction::Right => Key::RightArrow,
            Direction::Up => Key::UpArrow,
            Direction::Down => Key::DownArrow,
        }
    }
}

impl KeySink for EnigoKeySink {
    fn name(&self) -> &str {
        "enigo"
    }

    fn press(&mut self, direction: Direction) -> Result<(), DispatchError> {
        self.enigo
            .key(Self::key_for(direction), KeyDirection::Click)
            .map_err(|e| DispatchError::KeyPress {
                key: direction.key_name(),
                reason: e.to_string(),
            })?;
        debug!("Pressed key: {}", direction.key_name());
        Ok(())
    }
}

/// Dry-run sink: logs every press instead of sending it
pub struct ConsoleKeySink {
    presses: u64,
    history: Vec<Direction>,
}

impl ConsoleKeySink {
    pub fn new() -> Self {
        Self {
            presses: 0,
            history: Vec::new(),
        }
    }

    pub fn presses(&self) -> u64 {
        self.presses
    }

    /// Keys pressed so far, oldest first
    pub fn history(&self) -> &[Direction] {
        &self.history
    }
}

impl Default for ConsoleKeySink {
    fn default() -> Self {
        Self::new()
    }
}

impl KeySink for ConsoleKeySink {
    fn name(&self) -> &str {
        "console"
    }

    fn press(&mut self, direction: Direction) -> Result<(), DispatchError> {
        self.presses += 1;
        self.history.push(direction);

        info!(
            "⌨️  [{}] key '{}' [press #{}]",
            chrono::Local::now().format("%H:%M:%S%.3f"),
            direction.key_name(),
            self.presses
        );
        Ok(())
    }
}
