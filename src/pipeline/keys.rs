//! Keys-mode pipeline: calibrated dead zone and change gate into key presses

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::{drive, FrameHandler, FrameOutcome, RunSummary};
use crate::classifier::CalibratedClassifier;
use crate::config::{AppConfig, ConfigWatcher};
use crate::debounce::ChangeGate;
use crate::dispatch::KeySink;
use crate::input::{ControlKey, FrameSource, HandFrame, Landmark};
use crate::shutdown::ShutdownSignal;

/// Wrist tracking against a calibrated neutral point
pub struct KeysController {
    classifier: CalibratedClassifier,
    gate: ChangeGate,
}

impl KeysController {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            classifier: CalibratedClassifier::new(config.calibrated.deadzone_px),
            gate: ChangeGate::new(Duration::from_millis(config.calibrated.delay_ms)),
        }
    }

    pub fn classifier(&self) -> &CalibratedClassifier {
        &self.classifier
    }

    pub fn handle_frame(&mut self, frame: &HandFrame, now: Instant) -> FrameOutcome {
        let mut outcome = FrameOutcome::default();

        match frame.reference_point(Landmark::Wrist) {
            Some(point) => {
                outcome.gesture = self.classifier.observe(point).gesture();
                outcome.accepted = self.gate.accept(outcome.gesture, now);
            }
            None => self.gate.reset_previous(),
        }

        match frame.key {
            Some(ControlKey::Recalibrate) => self.classifier.recalibrate(),
            Some(ControlKey::Quit) => {
                info!("Quit key pressed");
                outcome.quit = true;
            }
            None => {}
        }

        outcome
    }

    pub fn apply_config(&mut self, config: &AppConfig) {
        self.classifier.set_deadzone(config.calibrated.deadzone_px);
        self.gate
            .set_delay(Duration::from_millis(config.calibrated.delay_ms));
        debug!(
            "Dead zone now {}px, delay {}ms",
            config.calibrated.deadzone_px, config.calibrated.delay_ms
        );
    }
}

/// Controller plus the sink its accepted commands are pressed on
pub struct KeysPipeline<S: KeySink> {
    controller: KeysController,
    sink: S,
}

impl<S: KeySink> KeysPipeline<S> {
    pub fn new(config: &AppConfig, sink: S) -> Self {
        Self {
            controller: KeysController::new(config),
            sink,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

impl<S: KeySink> FrameHandler for KeysPipeline<S> {
    fn name(&self) -> &'static str {
        "keys"
    }

    fn handle_frame(&mut self, frame: &HandFrame, now: Instant) -> FrameOutcome {
        let outcome = self.controller.handle_frame(frame, now);

        if let Some(direction) = outcome.accepted {
            info!("Gesture {} -> key '{}'", direction, direction.key_name());
            if let Err(e) = self.sink.press(direction) {
                warn!("{} sink failed to press key: {}", self.sink.name(), e);
            }
        }

        outcome
    }

    fn apply_config(&mut self, config: &AppConfig) {
        self.controller.apply_config(config);
    }
}

/// Keys-mode capture loop; presses happen inline, between frame reads
pub async fn run_keys<S: KeySink>(
    source: &mut dyn FrameSource,
    pipeline: &mut KeysPipeline<S>,
    watcher: &mut ConfigWatcher,
    shutdown: ShutdownSignal,
) -> RunSummary {
    info!(
        "Show your hand in the center to calibrate, 'c' recalibrates, 'q' quits (sink: {})",
        pipeline.sink.name()
    );
    drive(source, pipeline, watcher, shutdown).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::ConsoleKeySink;
    use crate::error::DispatchError;
    use crate::gesture::Direction;
    use crate::input::{DecodeOptions, ReferencePoint, ScriptedSource};
    use crate::input::report::FrameReport;
    use crate::pipeline::StopReason;
    use crate::shutdown::shutdown_channel;

    const MS: Duration = Duration::from_millis(1);

    fn wrist(x: i32, y: i32) -> HandFrame {
        HandFrame::with_point(640, 480, Landmark::Wrist, ReferencePoint::new(x, y))
    }

    fn no_hand() -> HandFrame {
        HandFrame::empty(640, 480)
    }

    #[test]
    fn test_first_hand_calibrates_without_gesture() {
        let mut controller = KeysController::new(&AppConfig::default());
        let t0 = Instant::now();

        let outcome = controller.handle_frame(&wrist(100, 100), t0);
        assert_eq!(outcome, FrameOutcome::default());
        assert_eq!(controller.classifier().neutral(), Some(ReferencePoint::new(100, 100)));

        assert_eq!(
            controller.handle_frame(&wrist(160, 105), t0 + MS).accepted,
            Some(Direction::Right)
        );
    }

    #[test]
    fn test_held_gesture_pressed_once_until_hand_lost() {
        let mut controller = KeysController::new(&AppConfig::default());
        let t0 = Instant::now();

        controller.handle_frame(&wrist(300, 240), t0);
        assert_eq!(
            controller.handle_frame(&wrist(300, 100), t0 + MS).accepted,
            Some(Direction::Up)
        );
        assert_eq!(controller.handle_frame(&wrist(300, 100), t0 + 2000 * MS).accepted, None);

        controller.handle_frame(&no_hand(), t0 + 2100 * MS);
        assert_eq!(
            controller.handle_frame(&wrist(300, 100), t0 + 2200 * MS).accepted,
            Some(Direction::Up)
        );
    }

    /// Detector line for a wrist at normalized (x, y), with no hand score
    fn detector_line(x: f32, y: f32) -> String {
        let mut landmarks = vec![r#"{"x":0.5,"y":0.5}"#.to_string(); 21];
        landmarks[0] = format!(r#"{{"x":{},"y":{}}}"#, x, y);
        format!(
            r#"{{"width":640,"height":480,"hands":[{{"landmarks":[{}]}}]}}"#,
            landmarks.join(",")
        )
    }

    #[test]
    fn test_held_gesture_from_detector_pressed_once() {
        let mut controller = KeysController::new(&AppConfig::default());
        let options = DecodeOptions::default();
        let t0 = Instant::now();

        // Mirrored: raw x 0.5 is the center, raw x 0.2 is well to the right
        let lines = std::iter::once(detector_line(0.5, 0.5))
            .chain(std::iter::repeat_with(|| detector_line(0.2, 0.5)).take(90));

        let mut presses = Vec::new();
        for (i, line) in lines.enumerate() {
            let report: FrameReport = serde_json::from_str(&line).unwrap();
            let frame = report.into_frame(&options);
            assert!(frame.hand.is_some(), "frame {} lost its hand", i);

            let outcome = controller.handle_frame(&frame, t0 + 33 * i as u32 * MS);
            presses.extend(outcome.accepted);
        }

        assert_eq!(presses, vec![Direction::Right]);
    }

    #[test]
    fn test_recalibrate_captures_next_point() {
        let mut controller = KeysController::new(&AppConfig::default());
        let t0 = Instant::now();

        controller.handle_frame(&wrist(100, 100), t0);
        controller.handle_frame(&no_hand().with_key(ControlKey::Recalibrate), t0 + MS);
        assert!(!controller.classifier().is_calibrated());

        // Far from the old neutral, but this frame only calibrates
        let outcome = controller.handle_frame(&wrist(400, 400), t0 + 2 * MS);
        assert_eq!(outcome.accepted, None);
        assert_eq!(controller.classifier().neutral(), Some(ReferencePoint::new(400, 400)));
    }

    #[test]
    fn test_reload_changes_deadzone() {
        let mut controller = KeysController::new(&AppConfig::default());
        let t0 = Instant::now();
        controller.handle_frame(&wrist(100, 100), t0);
        assert_eq!(controller.handle_frame(&wrist(130, 100), t0 + MS).gesture, None);

        let mut config = AppConfig::default();
        config.calibrated.deadzone_px = 20;
        controller.apply_config(&config);
        assert_eq!(
            controller.handle_frame(&wrist(130, 100), t0 + 2 * MS).gesture,
            Some(Direction::Right)
        );
    }

    #[tokio::test]
    async fn test_keys_loop_presses_and_quits() {
        let mut source = ScriptedSource::new(vec![
            wrist(320, 240),
            wrist(420, 240),
            wrist(420, 240),
            no_hand().with_key(ControlKey::Quit),
            wrist(200, 240),
        ]);
        let mut pipeline = KeysPipeline::new(&AppConfig::default(), ConsoleKeySink::new());
        let (_trigger, shutdown) = shutdown_channel();

        let summary =
            run_keys(&mut source, &mut pipeline, &mut ConfigWatcher::disabled(), shutdown).await;

        assert_eq!(summary.stop, StopReason::QuitKey);
        assert_eq!(summary.frames, 4);
        assert_eq!(pipeline.sink().history(), &[Direction::Right]);
    }

    struct BrokenSink {
        attempts: u32,
    }

    impl KeySink for BrokenSink {
        fn name(&self) -> &str {
            "broken"
        }

        fn press(&mut self, direction: Direction) -> Result<(), DispatchError> {
            self.attempts += 1;
            Err(DispatchError::KeyPress {
                key: direction.key_name(),
                reason: "no display".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_press_failure_keeps_running() {
        let mut source = ScriptedSource::new(vec![wrist(320, 240), wrist(420, 240), no_hand()]);
        let mut pipeline = KeysPipeline::new(&AppConfig::default(), BrokenSink { attempts: 0 });
        let (_trigger, shutdown) = shutdown_channel();

        let summary =
            run_keys(&mut source, &mut pipeline, &mut ConfigWatcher::disabled(), shutdown).await;

        assert_eq!(summary.stop, StopReason::EndOfStream);
        assert_eq!(summary.frames, 3);
        assert_eq!(pipeline.sink().attempts, 1);
    }
}
