//! Game-mode detection: fixed zones and cooldown into the command slot

use std::time::{Duration, Instant};

use tracing::{debug, info};

use super::{drive, FrameHandler, FrameOutcome, RunSummary, StopReason};
use crate::classifier::ZoneClassifier;
use crate::config::{AppConfig, ConfigWatcher};
use crate::debounce::Cooldown;
use crate::dispatch::CommandSlot;
use crate::game::SharedStatus;
use crate::input::{ControlKey, FrameSource, HandFrame, Landmark};
use crate::shutdown::ShutdownSignal;

/// Classifies the index fingertip and publishes commands past the cooldown
pub struct ZoneDetector {
    classifier: ZoneClassifier,
    cooldown: Cooldown,
    slot: CommandSlot,
    status: SharedStatus,
}

impl ZoneDetector {
    pub fn new(config: &AppConfig, slot: CommandSlot, status: SharedStatus) -> Self {
        status.write().running = true;
        Self {
            classifier: ZoneClassifier::from_config(&config.zones),
            cooldown: Cooldown::new(Duration::from_millis(config.zones.cooldown_ms)),
            slot,
            status,
        }
    }
}

impl FrameHandler for ZoneDetector {
    fn name(&self) -> &'static str {
        "game"
    }

    fn handle_frame(&mut self, frame: &HandFrame, now: Instant) -> FrameOutcome {
        let point = frame.reference_point(Landmark::IndexTip);
        let gesture =
            point.and_then(|point| self.classifier.classify(point, frame.width, frame.height));

        let accepted = self.cooldown.accept(gesture, now);
        if let Some(command) = accepted {
            self.slot.publish(command);
            info!("Detected gesture: {}", command);
        }

        {
            let mut status = self.status.write();
            status.frames += 1;
            status.hand_visible = point.is_some();
            status.zone = gesture;
            if accepted.is_some() {
                status.last_command = accepted;
            }
        }

        let quit = frame.key == Some(ControlKey::Quit);
        if quit {
            info!("Quit key from detector, stopping detection");
        }

        FrameOutcome {
            gesture,
            accepted,
            quit,
        }
    }

    fn apply_config(&mut self, config: &AppConfig) {
        self.classifier = ZoneClassifier::from_config(&config.zones);
        self.cooldown
            .set_period(Duration::from_millis(config.zones.cooldown_ms));
        debug!(
            "Zones now {:.2}/{:.2}, cooldown {}ms",
            config.zones.low, config.zones.high, config.zones.cooldown_ms
        );
    }

    fn finish(&mut self, _stop: &StopReason) {
        let mut status = self.status.write();
        status.running = false;
        status.hand_visible = false;
        status.zone = None;
    }
}

/// Detection task for game mode; runs until the source or shutdown stops it
pub async fn run_detection(
    mut source: Box<dyn FrameSource>,
    mut detector: ZoneDetector,
    mut watcher: ConfigWatcher,
    shutdown: ShutdownSignal,
) -> RunSummary {
    drive(source.as_mut(), &mut detector, &mut watcher, shutdown).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::shared_status;
    use crate::gesture::Direction;
    use crate::input::{ReferencePoint, ScriptedSource};
    use crate::shutdown::shutdown_channel;

    const MS: Duration = Duration::from_millis(1);

    fn tip(x: i32, y: i32) -> HandFrame {
        HandFrame::with_point(640, 480, Landmark::IndexTip, ReferencePoint::new(x, y))
    }

    fn detector() -> (ZoneDetector, CommandSlot, SharedStatus) {
        let slot = CommandSlot::new();
        let status = shared_status();
        let detector = ZoneDetector::new(&AppConfig::default(), slot.clone(), status.clone());
        (detector, slot, status)
    }

    #[test]
    fn test_cooldown_keeps_first_command() {
        let (mut detector, slot, status) = detector();
        let t0 = Instant::now();

        let first = detector.handle_frame(&tip(100, 240), t0);
        assert_eq!(first.accepted, Some(Direction::Left));

        let second = detector.handle_frame(&tip(500, 240), t0 + 200 * MS);
        assert_eq!(second.gesture, Some(Direction::Right));
        assert_eq!(second.accepted, None);

        assert_eq!(slot.take(), Some(Direction::Left));
        let status = status.read();
        assert_eq!(status.zone, Some(Direction::Right));
        assert_eq!(status.last_command, Some(Direction::Left));
        assert_eq!(status.frames, 2);
    }

    #[test]
    fn test_no_hand_is_neutral() {
        let (mut detector, slot, status) = detector();
        let outcome = detector.handle_frame(&HandFrame::empty(640, 480), Instant::now());

        assert_eq!(outcome, FrameOutcome::default());
        assert_eq!(slot.take(), None);
        assert!(!status.read().hand_visible);
    }

    #[test]
    fn test_center_box_is_neutral() {
        let (mut detector, slot, _) = detector();
        let outcome = detector.handle_frame(&tip(320, 240), Instant::now());
        assert_eq!(outcome.gesture, None);
        assert_eq!(slot.take(), None);
    }

    #[test]
    fn test_reload_changes_zones() {
        let (mut detector, _, _) = detector();
        let t0 = Instant::now();
        // x = 220 sits between 192 and 448, neutral with default zones
        assert_eq!(detector.handle_frame(&tip(220, 240), t0).gesture, None);

        let mut config = AppConfig::default();
        config.zones.low = 0.4;
        config.zones.high = 0.6;
        detector.apply_config(&config);
        assert_eq!(detector.handle_frame(&tip(220, 240), t0).gesture, Some(Direction::Left));
    }

    #[tokio::test]
    async fn test_detection_stops_on_quit_key() {
        let (detector, slot, status) = detector();
        let source = ScriptedSource::new(vec![
            tip(320, 50),
            HandFrame::empty(640, 480).with_key(ControlKey::Quit),
            tip(100, 240),
        ]);
        let (_trigger, shutdown) = shutdown_channel();

        let summary =
            run_detection(Box::new(source), detector, ConfigWatcher::disabled(), shutdown).await;

        assert_eq!(summary.stop, StopReason::QuitKey);
        assert_eq!(summary.frames, 2);
        assert_eq!(summary.accepted, 1);
        assert_eq!(slot.take(), Some(Direction::Up));
        assert!(!status.read().running);
    }

    #[tokio::test]
    async fn test_detection_stops_at_end_of_stream() {
        let (detector, _, _) = detector();
        let (_trigger, shutdown) = shutdown_channel();

        let summary = run_detection(
            Box::new(ScriptedSource::new(vec![tip(320, 240)])),
            detector,
            ConfigWatcher::disabled(),
            shutdown,
        )
        .await;

        assert_eq!(summary.stop, StopReason::EndOfStream);
        assert_eq!(summary.frames, 1);
    }

    #[tokio::test]
    async fn test_detection_honours_shutdown() {
        let (detector, _, _) = detector();
        let (trigger, shutdown) = shutdown_channel();
        trigger.trigger();

        // A stdin-like source that never yields
        struct Stalled;
        #[async_trait::async_trait]
        impl FrameSource for Stalled {
            fn describe(&self) -> String {
                "stalled".to_string()
            }
            async fn next_frame(
                &mut self,
            ) -> Result<Option<HandFrame>, crate::error::SourceError> {
                std::future::pending().await
            }
        }

        let summary =
            run_detection(Box::new(Stalled), detector, ConfigWatcher::disabled(), shutdown).await;
        assert_eq!(summary.stop, StopReason::Shutdown);
        assert_eq!(summary.frames, 0);
    }
}
