//! Calibrated dead-zone classifier
//!
//! The first hand seen after (re)calibration becomes the neutral point.
//! Later points are classified by their offset from it along the dominant
//! axis; offsets within the dead zone are neutral.

use tracing::info;

use crate::gesture::Direction;
use crate::input::ReferencePoint;

/// Result of feeding one reference point to the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// The point was captured as the new neutral point; no gesture this frame
    Calibrated(ReferencePoint),
    /// Gesture relative to the current neutral point
    Gesture(Option<Direction>),
}

impl Observation {
    pub fn gesture(self) -> Option<Direction> {
        match self {
            Observation::Calibrated(_) => None,
            Observation::Gesture(gesture) => gesture,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CalibratedClassifier {
    neutral: Option<ReferencePoint>,
    deadzone: i32,
}

impl CalibratedClassifier {
    pub fn new(deadzone: i32) -> Self {
        Self {
            neutral: None,
            deadzone,
        }
    }

    pub fn neutral(&self) -> Option<ReferencePoint> {
        self.neutral
    }

    pub fn is_calibrated(&self) -> bool {
        self.neutral.is_some()
    }

    pub fn deadzone(&self) -> i32 {
        self.deadzone
    }

    pub fn set_deadzone(&mut self, deadzone: i32) {
        self.deadzone = deadzone;
    }

    /// Forget the neutral point; the next observed hand is captured instead
    pub fn recalibrate(&mut self) {
        self.neutral = None;
        info!("Recalibrate: show your hand in the center");
    }

    pub fn observe(&mut self, point: ReferencePoint) -> Observation {
        let Some(neutral) = self.neutral else {
            self.neutral = Some(point);
            info!("Calibrated at ({}, {})", point.x, point.y);
            return Observation::Calibrated(point);
        };

        let dx = point.x - neutral.x;
        let dy = point.y - neutral.y;

        let gesture = if dx.abs() > dy.abs() {
            if dx > self.deadzone {
                Some(Direction::Right)
            } else if dx < -self.deadzone {
                Some(Direction::Left)
            } else {
                None
            }
        } else if dy > self.deadzone {
            Some(Direction::Down)
        } else if dy < -self.deadzone {
            Some(Direction::Up)
        } else {
            None
        };

        Observation::Gesture(gesture)
    }
}

impl Default for CalibratedClassifier {
    fn default() -> Self {
        Self::new(50)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calibrated_at(x: i32, y: i32) -> CalibratedClassifier {
        let mut classifier = CalibratedClassifier::default();
        classifier.observe(ReferencePoint::new(x, y));
        classifier
    }

    #[test]
    fn test_first_point_calibrates_without_gesture() {
        let mut classifier = CalibratedClassifier::default();
        assert!(!classifier.is_calibrated());

        let obs = classifier.observe(ReferencePoint::new(300, 200));
        assert_eq!(obs, Observation::Calibrated(ReferencePoint::new(300, 200)));
        assert_eq!(obs.gesture(), None);
        assert_eq!(classifier.neutral(), Some(ReferencePoint::new(300, 200)));
    }

    fn gesture_at(classifier: &mut CalibratedClassifier, x: i32, y: i32) -> Option<Direction> {
        classifier.observe(ReferencePoint::new(x, y)).gesture()
    }

    #[test]
    fn test_right_outside_deadzone() {
        let mut classifier = calibrated_at(100, 100);
        assert_eq!(
            classifier.observe(ReferencePoint::new(160, 105)),
            Observation::Gesture(Some(Direction::Right))
        );
        assert_eq!(classifier.observe(ReferencePoint::new(100, 100)), Observation::Gesture(None));
    }

    #[test]
    fn test_all_directions() {
        let mut classifier = calibrated_at(100, 100);
        assert_eq!(gesture_at(&mut classifier, 40, 110), Some(Direction::Left));
        assert_eq!(gesture_at(&mut classifier, 90, 40), Some(Direction::Up));
        assert_eq!(gesture_at(&mut classifier, 110, 170), Some(Direction::Down));
    }

    #[test]
    fn test_deadzone_is_exclusive() {
        let mut classifier = calibrated_at(100, 100);
        assert_eq!(gesture_at(&mut classifier, 150, 100), None);
        assert_eq!(gesture_at(&mut classifier, 151, 100), Some(Direction::Right));
        assert_eq!(gesture_at(&mut classifier, 100, 50), None);
    }

    #[test]
    fn test_diagonal_tie_uses_vertical_axis() {
        let mut classifier = calibrated_at(100, 100);
        assert_eq!(gesture_at(&mut classifier, 170, 170), Some(Direction::Down));
        // Horizontal dominant but within deadzone: no fallback to vertical
        assert_eq!(gesture_at(&mut classifier, 145, 60), None);
    }

    #[test]
    fn test_recalibrate_captures_next_point() {
        let mut classifier = calibrated_at(100, 100);
        classifier.recalibrate();
        assert!(!classifier.is_calibrated());

        let obs = classifier.observe(ReferencePoint::new(400, 300));
        assert_eq!(obs, Observation::Calibrated(ReferencePoint::new(400, 300)));
        assert_eq!(gesture_at(&mut classifier, 460, 300), Some(Direction::Right));
    }

    #[test]
    fn test_deadzone_update() {
        let mut classifier = calibrated_at(100, 100);
        classifier.set_deadzone(80);
        assert_eq!(gesture_at(&mut classifier, 160, 100), None);
    }
}
