//! Hand position input
//!
//! Decodes detector frame reports into reference points and provides the
//! sources (detector process, stdin, replay file) that produce them.

pub mod report;
pub mod source;

pub use report::{ControlKey, DecodeOptions, HandFrame, Landmark, ReferencePoint};
pub use source::{open_source, DetectorSettings, FrameSource, ScriptedSource};
