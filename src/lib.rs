//! Hand Joystick - hand positions from a webcam turned into directional commands
//!
//! An external landmark detector streams one JSON report per video frame.
//! Two modes consume that stream:
//!
//! - **game**: the index fingertip is classified against fixed screen zones,
//!   rate limited by a cooldown and handed to a small runner game through a
//!   single-slot cell.
//! - **keys**: the wrist is compared with a calibrated neutral point; gestures
//!   that change (and respect a delay) become arrow key presses.

pub mod classifier;
pub mod config;
pub mod debounce;
pub mod dispatch;
pub mod error;
pub mod game;
pub mod gesture;
pub mod input;
pub mod paths;
pub mod pipeline;
pub mod shutdown;

pub use gesture::Direction;
