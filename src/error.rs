//! Error types for the frame source and command dispatch seams
//!
//! Application code wraps these in `anyhow::Error`; the typed variants exist
//! so pipelines can tell a dead detector apart from a bad report line.

use thiserror::Error;

/// Failure to obtain the next frame from a position source
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to spawn detector `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("detector process has no stdout pipe")]
    MissingStdout,

    #[error("failed to read frame: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed frame report on line {line}: {source}")]
    Parse {
        line: u64,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure to deliver a command to its sink
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("key sink unavailable: {0}")]
    Init(String),

    #[error("key press `{key}` failed: {reason}")]
    KeyPress { key: &'static str, reason: String },
}
