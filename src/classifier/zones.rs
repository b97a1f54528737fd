//! Fixed screen-fraction zones
//!
//! The frame is split into bands at `low` and `high` fractions of each axis.
//! Horizontal bands are checked before vertical ones, so a point in a corner
//! (e.g. both the LEFT and UP bands) resolves to the horizontal direction.

use crate::config::ZonesConfig;
use crate::gesture::Direction;
use crate::input::ReferencePoint;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneClassifier {
    low: f64,
    high: f64,
}

impl ZoneClassifier {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn from_config(config: &ZonesConfig) -> Self {
        Self::new(config.low, config.high)
    }

    /// Classify a point within a `width` x `height` frame
    pub fn classify(&self, point: ReferencePoint, width: u32, height: u32) -> Option<Direction> {
        let (x, y) = (point.x as f64, point.y as f64);
        let (w, h) = (width as f64, height as f64);

        if x < w * self.low {
            Some(Direction::Left)
        } else if x > w * self.high {
            Some(Direction::Right)
        } else if y < h * self.low {
            Some(Direction::Up)
        } else if y > h * self.high {
            Some(Direction::Down)
        } else {
            None
        }
    }
}

impl Default for ZoneClassifier {
    fn default() -> Self {
        Self::from_config(&ZonesConfig::default())
    }
}
