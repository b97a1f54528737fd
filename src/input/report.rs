//! Frame reports emitted by the hand-landmark detector
//!
//! The detector writes one JSON object per captured frame:
//!
//! ```json
//! {"width":640,"height":480,"hands":[{"score":0.93,"landmarks":[{"x":0.51,"y":0.48}]}],"key":"c"}
//! ```
//!
//! Landmark coordinates are normalized to the frame (0.0..1.0) and follow the
//! MediaPipe 21-point hand layout. `score` is an optional detection
//! confidence; a hand without one counts as certain.

use serde::Deserialize;
use tracing::warn;

/// MediaPipe hand landmark indices used as reference points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Landmark {
    Wrist,
    IndexTip,
}

impl Landmark {
    pub fn index(self) -> usize {
        match self {
            Landmark::Wrist => 0,
            Landmark::IndexTip => 8,
        }
    }
}

/// Pixel position of the tracked landmark in the current frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReferencePoint {
    pub x: i32,
    pub y: i32,
}

impl ReferencePoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Control key forwarded from the detector window (or typed in the game window)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKey {
    Quit,
    Recalibrate,
}

impl ControlKey {
    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim() {
            "q" | "Q" => Some(ControlKey::Quit),
            "c" | "C" => Some(ControlKey::Recalibrate),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LandmarkReport {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HandReport {
    #[serde(default = "default_score")]
    pub score: f32,
    pub landmarks: Vec<LandmarkReport>,
}

/// One line of detector output
#[derive(Debug, Clone, Deserialize)]
pub struct FrameReport {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub hands: Vec<HandReport>,
    #[serde(default)]
    pub key: Option<String>,
}

fn default_score() -> f32 {
    1.0
}

/// Normalized landmarks of the single hand a frame is tracking
#[derive(Debug, Clone)]
pub struct Hand {
    pub score: f32,
    landmarks: Vec<(f32, f32)>,
}

impl Hand {
    /// Pixel position of `landmark`, or `None` when the hand lacks it
    pub fn reference_point(
        &self,
        landmark: Landmark,
        width: u32,
        height: u32,
    ) -> Option<ReferencePoint> {
        let (x, y) = *self.landmarks.get(landmark.index())?;
        Some(ReferencePoint {
            x: (x * width as f32) as i32,
            y: (y * height as f32) as i32,
        })
    }
}

/// Decoded frame handed to the classifiers
#[derive(Debug, Clone)]
pub struct HandFrame {
    pub width: u32,
    pub height: u32,
    pub hand: Option<Hand>,
    pub key: Option<ControlKey>,
}

impl HandFrame {
    /// Frame with no hand, for tests and replays
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            hand: None,
            key: None,
        }
    }

    /// Frame whose hand has `landmark` at the given pixel position
    pub fn with_point(width: u32, height: u32, landmark: Landmark, point: ReferencePoint) -> Self {
        let mut landmarks = vec![(0.5, 0.5); 21];
        landmarks[landmark.index()] = (
            (point.x as f32 + 0.5) / width as f32,
            (point.y as f32 + 0.5) / height as f32,
        );
        Self {
            width,
            height,
            hand: Some(Hand { score: 1.0, landmarks }),
            key: None,
        }
    }

    pub fn with_key(mut self, key: ControlKey) -> Self {
        self.key = Some(key);
        self
    }

    /// Reference point of the tracked hand, `None` when no hand is visible
    pub fn reference_point(&self, landmark: Landmark) -> Option<ReferencePoint> {
        self.hand
            .as_ref()
            .and_then(|hand| hand.reference_point(landmark, self.width, self.height))
    }
}

/// Options applied while decoding reports
#[derive(Debug, Clone, Copy)]
pub struct DecodeOptions {
    pub mirror: bool,
    pub min_hand_score: f32,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            mirror: true,
            min_hand_score: 0.7,
        }
    }
}

impl FrameReport {
    /// Keep the first qualifying hand, mirroring x when requested
    pub fn into_frame(self, options: &DecodeOptions) -> HandFrame {
        let hand = self
            .hands
            .into_iter()
            .find(|hand| hand.score >= options.min_hand_score)
            .and_then(|hand| {
                if hand.landmarks.len() < 21 {
                    warn!("Ignoring hand with {} landmarks (expected 21)", hand.landmarks.len());
                    return None;
                }
                let landmarks = hand
                    .landmarks
                    .iter()
                    .map(|lm| {
                        let x = if options.mirror { 1.0 - lm.x } else { lm.x };
                        (x, lm.y)
                    })
                    .collect();
                Some(Hand {
                    score: hand.score,
                    landmarks,
                })
            });

        HandFrame {
            width: self.width,
            height: self.height,
            hand,
            key: self.key.as_deref().and_then(ControlKey::from_key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report_json(x: f32, y: f32, score: f32) -> String {
        let mut landmarks: Vec<String> =
            (0..21).map(|_| r#"{"x":0.5,"y":0.5}"#.to_string()).collect();
        landmarks[8] = format!(r#"{{"x":{},"y":{}}}"#, x, y);
        format!(
            r#"{{"width":640,"height":480,"hands":[{{"score":{},"landmarks":[{}]}}]}}"#,
            score,
            landmarks.join(",")
        )
    }

    #[test]
    fn test_index_tip_to_pixels() {
        let report: FrameReport = serde_json::from_str(&report_json(0.25, 0.75, 0.9)).unwrap();
        let options = DecodeOptions {
            mirror: false,
            min_hand_score: 0.7,
        };
        let frame = report.into_frame(&options);
        assert_eq!(frame.reference_point(Landmark::IndexTip), Some(ReferencePoint::new(160, 360)));
        assert_eq!(frame.reference_point(Landmark::Wrist), Some(ReferencePoint::new(320, 240)));
    }

    #[test]
    fn test_mirror_flips_x() {
        let report: FrameReport = serde_json::from_str(&report_json(0.25, 0.75, 0.9)).unwrap();
        let frame = report.into_frame(&DecodeOptions::default());
        assert_eq!(frame.reference_point(Landmark::IndexTip), Some(ReferencePoint::new(480, 360)));
    }

    #[test]
    fn test_low_score_hand_is_ignored() {
        let report: FrameReport = serde_json::from_str(&report_json(0.25, 0.75, 0.4)).unwrap();
        let frame = report.into_frame(&DecodeOptions::default());
        assert!(frame.hand.is_none());
        assert_eq!(frame.reference_point(Landmark::IndexTip), None);
    }

    #[test]
    fn test_hand_without_score_passes_default_threshold() {
        let landmarks: Vec<&str> = (0..21).map(|_| r#"{"x":0.5,"y":0.5}"#).collect();
        let line = format!(
            r#"{{"width":640,"height":480,"hands":[{{"landmarks":[{}]}}]}}"#,
            landmarks.join(",")
        );
        let report: FrameReport = serde_json::from_str(&line).unwrap();
        let frame = report.into_frame(&DecodeOptions::default());
        assert_eq!(frame.hand.as_ref().map(|hand| hand.score), Some(1.0));
        assert_eq!(frame.reference_point(Landmark::Wrist), Some(ReferencePoint::new(320, 240)));
    }

    #[test]
    fn test_no_hands_and_key() {
        let report: FrameReport =
            serde_json::from_str(r#"{"width":640,"height":480,"key":"c"}"#).unwrap();
        let frame = report.into_frame(&DecodeOptions::default());
        assert!(frame.hand.is_none());
        assert_eq!(frame.key, Some(ControlKey::Recalibrate));
    }

    #[test]
    fn test_truncated_hand_counts_as_missing() {
        let report: FrameReport = serde_json::from_str(
            r#"{"width":640,"height":480,"hands":[{"landmarks":[{"x":0.1,"y":0.1}]}]}"#,
        )
        .unwrap();
        let frame = report.into_frame(&DecodeOptions::default());
        assert!(frame.hand.is_none());
    }

    #[test]
    fn test_with_point_round_trips_pixels() {
        let point = ReferencePoint::new(100, 100);
        let frame = HandFrame::with_point(640, 480, Landmark::Wrist, point);
        assert_eq!(frame.reference_point(Landmark::Wrist), Some(point));
    }

    #[test]
    fn test_unknown_key_ignored() {
        assert_eq!(ControlKey::from_key("x"), None);
        assert_eq!(ControlKey::from_key("q"), Some(ControlKey::Quit));
    }
}
