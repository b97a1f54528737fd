//! Gesture classifiers
//!
//! - [`ZoneClassifier`]: absolute position against fixed frame fractions
//! - [`CalibratedClassifier`]: offset from a calibrated neutral point

pub mod calibrated;
pub mod zones;

pub use calibrated::{CalibratedClassifier, Observation};
pub use zones::ZoneClassifier;
