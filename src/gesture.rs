//! Directional gesture commands
//!
//! A gesture command is `Option<Direction>`: `None` is the neutral command
//! emitted when the hand sits in no zone (or inside the dead zone).

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the four directions a hand gesture can express
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Left,
        Direction::Right,
        Direction::Up,
        Direction::Down,
    ];

    /// Key name used by the key sink ("left", "right", "up", "down")
    pub fn key_name(self) -> &'static str {
        match self {
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }

    /// Upper-case label shown in overlays and logs
    pub fn label(self) -> &'static str {
        match self {
            Direction::Left => "LEFT",
            Direction::Right => "RIGHT",
            Direction::Up => "UP",
            Direction::Down => "DOWN",
        }
    }

    /// Compact code for the atomic command slot (0 is reserved for empty)
    pub(crate) fn code(self) -> u8 {
        match self {
            Direction::Left => 1,
            Direction::Right => 2,
            Direction::Up => 3,
            Direction::Down => 4,
        }
    }

    pub(crate) fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Direction::Left),
            2 => Some(Direction::Right),
            3 => Some(Direction::Up),
            4 => Some(Direction::Down),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Label for an optional command, "NONE" for the neutral command
pub fn command_label(command: Option<Direction>) -> &'static str {
    command.map(Direction::label).unwrap_or("NONE")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip_and_zero_is_empty() {
        for dir in Direction::ALL {
            assert_ne!(dir.code(), 0);
            assert_eq!(Direction::from_code(dir.code()), Some(dir));
        }
        assert_eq!(Direction::from_code(0), None);
        assert_eq!(Direction::from_code(200), None);
    }

    #[test]
    fn test_names() {
        assert_eq!(Direction::Left.key_name(), "left");
        assert_eq!(Direction::Down.to_string(), "DOWN");
        assert_eq!(command_label(None), "NONE");
        assert_eq!(command_label(Some(Direction::Up)), "UP");
    }
}
