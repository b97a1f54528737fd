//! Frame sources
//!
//! A [`FrameSource`] yields decoded [`HandFrame`]s one at a time. `Ok(None)`
//! marks the end of the stream; an error means the current frame could not
//! be read. Either way the caller stops its capture loop.
//!
//! `next_frame` is raced against config reloads and shutdown, so every
//! implementation must be cancel safe: dropping the future may not lose input.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::report::{DecodeOptions, FrameReport, HandFrame};
use crate::config::{SourceConfig, SourceKind};
use crate::error::SourceError;

/// Decoded frames buffered between the line reader task and the consumer
const FRAME_BUFFER: usize = 8;

/// Anything that can deliver hand frames
#[async_trait]
pub trait FrameSource: Send {
    /// Short description for logs
    fn describe(&self) -> String;

    /// Read the next frame; `Ok(None)` when the stream has ended
    async fn next_frame(&mut self) -> Result<Option<HandFrame>, SourceError>;
}

/// Settings handed to a spawned detector through its environment
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DetectorSettings {
    /// Frame size to request from the camera
    pub capture: Option<(u32, u32)>,
    /// MediaPipe `min_tracking_confidence`; the detector's own default when unset
    pub tracking_confidence: Option<f32>,
}

/// JSON-lines reader over any buffered async input
///
/// A background task owns the reader and decodes whole lines, so a consumer
/// that abandons `next_frame` halfway through a line loses nothing.
pub struct LineSource {
    name: String,
    frames: mpsc::Receiver<Result<HandFrame, SourceError>>,
    reader: JoinHandle<()>,
}

impl LineSource {
    pub fn spawn<R>(name: impl Into<String>, reader: R, options: DecodeOptions) -> Self
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        let name = name.into();
        let (tx, frames) = mpsc::channel(FRAME_BUFFER);
        let reader = tokio::spawn(read_reports(name.clone(), reader, options, tx));
        Self {
            name,
            frames,
            reader,
        }
    }

    /// Reports piped into standard input
    pub fn stdin(options: DecodeOptions) -> Self {
        Self::spawn("stdin", BufReader::new(tokio::io::stdin()), options)
    }
}

impl Drop for LineSource {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

#[async_trait]
impl FrameSource for LineSource {
    fn describe(&self) -> String {
        self.name.clone()
    }

    async fn next_frame(&mut self) -> Result<Option<HandFrame>, SourceError> {
        match self.frames.recv().await {
            Some(frame) => frame.map(Some),
            None => Ok(None),
        }
    }
}

/// Decode report lines until EOF, the first failure, or a dropped receiver
async fn read_reports<R>(
    name: String,
    mut reader: R,
    options: DecodeOptions,
    tx: mpsc::Sender<Result<HandFrame, SourceError>>,
) where
    R: AsyncBufRead + Unpin,
{
    let mut buf = String::new();
    let mut line_no: u64 = 0;

    loop {
        buf.clear();
        let decoded = match reader.read_line(&mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                line_no += 1;
                let line = buf.trim();
                if line.is_empty() {
                    continue;
                }
                serde_json::from_str::<FrameReport>(line)
                    .map(|report| report.into_frame(&options))
                    .map_err(|source| SourceError::Parse {
                        line: line_no,
                        source,
                    })
            }
            Err(e) => Err(SourceError::Io(e)),
        };

        let failed = decoded.is_err();
        if tx.send(decoded).await.is_err() || failed {
            break;
        }
    }

    debug!("Report reader for {} stopped after {} lines", name, line_no);
}

/// Detector helper process streaming reports on stdout
///
/// The child is killed when the source is dropped, which releases the camera.
pub struct DetectorProcess {
    _child: Child,
    lines: LineSource,
}

/// Build the detector command with the camera settings in its environment
fn detector_command(
    program: &str,
    args: &[String],
    camera_index: u32,
    settings: DetectorSettings,
) -> Command {
    let mut command = Command::new(program);
    command
        .args(args)
        .env("HAND_JOYSTICK_CAMERA", camera_index.to_string())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .kill_on_drop(true);

    if let Some((width, height)) = settings.capture {
        command
            .env("HAND_JOYSTICK_WIDTH", width.to_string())
            .env("HAND_JOYSTICK_HEIGHT", height.to_string());
    }
    if let Some(confidence) = settings.tracking_confidence {
        command.env("HAND_JOYSTICK_TRACKING_CONFIDENCE", confidence.to_string());
    }

    command
}

impl DetectorProcess {
    /// Spawn `program args...`, passing the camera settings through the environment
    pub fn spawn(
        program: &str,
        args: &[String],
        camera_index: u32,
        settings: DetectorSettings,
        options: DecodeOptions,
    ) -> Result<Self, SourceError> {
        let mut child = detector_command(program, args, camera_index, settings)
            .spawn()
            .map_err(|source| SourceError::Spawn {
                program: program.to_string(),
                source,
            })?;

        let stdout = child.stdout.take().ok_or(SourceError::MissingStdout)?;
        info!("Detector started: {} {} (camera {})", program, args.join(" "), camera_index);

        Ok(Self {
            _child: child,
            lines: LineSource::spawn(program, BufReader::new(stdout), options),
        })
    }
}

#[async_trait]
impl FrameSource for DetectorProcess {
    fn describe(&self) -> String {
        format!("detector `{}`", self.lines.describe())
    }

    async fn next_frame(&mut self) -> Result<Option<HandFrame>, SourceError> {
        self.lines.next_frame().await
    }
}

/// Recorded session replayed from a JSON-lines file
pub struct ReplaySource {
    lines: LineSource,
    pacing: Option<Interval>,
}

impl ReplaySource {
    pub async fn open(
        path: &Path,
        fps: Option<f32>,
        options: DecodeOptions,
    ) -> Result<Self, SourceError> {
        let file = tokio::fs::File::open(path).await?;
        let pacing = fps.and_then(frame_period).map(|period| {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });

        Ok(Self {
            lines: LineSource::spawn(path.display().to_string(), BufReader::new(file), options),
            pacing,
        })
    }
}

/// Interval between replayed frames; `None` (unpaced) when `fps` has no usable period
fn frame_period(fps: f32) -> Option<Duration> {
    match Duration::try_from_secs_f32(1.0 / fps) {
        Ok(period) if !period.is_zero() => Some(period),
        _ => {
            warn!("Replay rate {} fps is out of range, replaying unpaced", fps);
            None
        }
    }
}

#[async_trait]
impl FrameSource for ReplaySource {
    fn describe(&self) -> String {
        format!("replay {}", self.lines.describe())
    }

    async fn next_frame(&mut self) -> Result<Option<HandFrame>, SourceError> {
        if let Some(pacing) = self.pacing.as_mut() {
            pacing.tick().await;
        }
        self.lines.next_frame().await
    }
}

/// Pre-built frames, mainly for tests
pub struct ScriptedSource {
    frames: VecDeque<HandFrame>,
}

impl ScriptedSource {
    pub fn new(frames: impl IntoIterator<Item = HandFrame>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }
}

#[async_trait]
impl FrameSource for ScriptedSource {
    fn describe(&self) -> String {
        format!("script ({} frames left)", self.frames.len())
    }

    async fn next_frame(&mut self) -> Result<Option<HandFrame>, SourceError> {
        Ok(self.frames.pop_front())
    }
}

/// Open the source described by `config`
///
/// `settings` only matter when a detector process is spawned.
pub async fn open_source(
    config: &SourceConfig,
    settings: DetectorSettings,
) -> Result<Box<dyn FrameSource>, SourceError> {
    let options = DecodeOptions {
        mirror: config.mirror,
        min_hand_score: config.min_hand_score,
    };

    let source: Box<dyn FrameSource> = match config.kind {
        SourceKind::Command => Box::new(DetectorProcess::spawn(
            &config.program,
            &config.args,
            config.camera_index,
            settings,
            options,
        )?),
        SourceKind::Stdin => Box::new(LineSource::stdin(options)),
        SourceKind::File => {
            let path = config.path.as_deref().unwrap_or_else(|| Path::new(""));
            Box::new(ReplaySource::open(path, config.fps, options).await?)
        }
    };

    debug!("Opened frame source: {}", source.describe());
    Ok(source)
}
