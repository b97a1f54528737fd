//! Command dispatch
//!
//! Game mode hands commands to the game loop through a [`CommandSlot`];
//! keys mode presses them immediately through a [`KeySink`].

pub mod keys;
pub mod slot;

pub use keys::{ConsoleKeySink, EnigoKeySink, KeySink};
pub use slot::CommandSlot;
