//! Single-slot command handoff
//!
//! The detection task publishes accepted commands; the game loop takes at
//! most one per tick. Publishing overwrites a pending command (last writer
//! wins), so a stale command is never applied twice.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use crate::gesture::Direction;

const EMPTY: u8 = 0;

/// Shared cell holding at most one pending command
#[derive(Clone, Default)]
pub struct CommandSlot {
    pending: Arc<AtomicU8>,
}

impl CommandSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace any pending command with `command`
    pub fn publish(&self, command: Direction) {
        self.pending.store(command.code(), Ordering::Release);
    }

    /// Take the pending command, leaving the slot empty
    pub fn take(&self) -> Option<Direction> {
        Direction::from_code(self.pending.swap(EMPTY, Ordering::AcqRel))
    }

    /// Look at the pending command without consuming it
    pub fn peek(&self) -> Option<Direction> {
        Direction::from_code(self.pending.load(Ordering::Acquire))
    }
}

impl std::fmt::Debug for CommandSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandSlot").field("pending", &self.peek()).finish()
    }
}
