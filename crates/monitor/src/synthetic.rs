//! Scripted landmark stream
//!
//! Deterministic stand-in for the external vision provider: an alert
//! stretch with periodic blinks, a distracted stretch with the gaze
//! parked outside the focus zone, then a drowsy stretch with the eyes
//! mostly shut.

use face_geometry::Point2;
use vision_frame::{HeadPose, VisionFrame};

const BLINK_PERIOD_MS: u64 = 4_000;
const BLINK_CLOSED_MS: u64 = 130;

/// Phase boundaries (elapsed milliseconds)
const FOCUSED_UNTIL_MS: u64 = 11_000;
const DISTRACTED_UNTIL_MS: u64 = 16_000;
const DROWSY_UNTIL_MS: u64 = 22_000;

pub struct SyntheticFace {
    start_ms: u64,
}

impl SyntheticFace {
    pub fn new(start_ms: u64) -> Self {
        Self { start_ms }
    }

    /// Frame for the given wall-clock instant
    pub fn frame(&self, now_ms: u64) -> VisionFrame {
        let elapsed = now_ms.saturating_sub(self.start_ms);

        if elapsed < FOCUSED_UNTIL_MS {
            self.focused_frame(now_ms, elapsed)
        } else if elapsed < DISTRACTED_UNTIL_MS {
            self.distracted_frame(now_ms, elapsed)
        } else if elapsed < DROWSY_UNTIL_MS {
            self.drowsy_frame(now_ms, elapsed)
        } else {
            self.focused_frame(now_ms, elapsed)
        }
    }

    /// Alert and forward-facing, blinking every few seconds
    fn focused_frame(&self, now_ms: u64, elapsed: u64) -> VisionFrame {
        let blinking = elapsed % BLINK_PERIOD_MS < BLINK_CLOSED_MS;
        let openness = if blinking { 0.1 } else { 1.0 };

        eyes_frame(now_ms, openness)
            .with_iris(Point2::new(0.40, 0.50), Point2::new(0.60, 0.50))
            .with_head_pose(HeadPose::new(0.0, 0.0, 0.0))
    }

    /// Gaze parked off to the side, head turned
    fn distracted_frame(&self, now_ms: u64, elapsed: u64) -> VisionFrame {
        let wobble = ((elapsed / 400) % 2) as f32;

        eyes_frame(now_ms, 1.0)
            .with_iris(Point2::new(0.92, 0.55), Point2::new(0.96, 0.55))
            .with_head_pose(HeadPose::new(25.0 + 4.0 * wobble, -5.0, 2.0))
    }

    /// Eyes shut apart from brief reopenings
    fn drowsy_frame(&self, now_ms: u64, elapsed: u64) -> VisionFrame {
        let briefly_open = elapsed % 3_000 < 200;
        let openness = if briefly_open { 0.8 } else { 0.05 };

        eyes_frame(now_ms, openness)
            .with_iris(Point2::new(0.40, 0.52), Point2::new(0.60, 0.52))
            .with_head_pose(HeadPose::new(0.0, -12.0, 0.0))
    }
}

/// Both eye contours at the given openness
fn eyes_frame(now_ms: u64, openness: f32) -> VisionFrame {
    VisionFrame::new(
        now_ms,
        0.92,
        eye_contour(Point2::new(0.36, 0.50), openness),
        eye_contour(Point2::new(0.64, 0.50), openness),
    )
}

/// 6-point eyelid contour around a center; openness 1.0 is a wide-open
/// eye (EAR around 0.33), 0.0 fully shut.
fn eye_contour(center: Point2, openness: f32) -> Vec<Point2> {
    let half_w = 0.030;
    let half_h = 0.010 * openness;

    vec![
        Point2::new(center.x - half_w, center.y),
        Point2::new(center.x - half_w / 3.0, center.y - half_h),
        Point2::new(center.x + half_w / 3.0, center.y - half_h),
        Point2::new(center.x + half_w, center.y),
        Point2::new(center.x + half_w / 3.0, center.y + half_h),
        Point2::new(center.x - half_w / 3.0, center.y + half_h),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use face_geometry::eye_aspect_ratio;

    #[test]
    fn test_open_and_shut_contours_separate_cleanly() {
        let open = eye_aspect_ratio(&eye_contour(Point2::new(0.5, 0.5), 1.0)).unwrap();
        let shut = eye_aspect_ratio(&eye_contour(Point2::new(0.5, 0.5), 0.05)).unwrap();
        assert!(open > 0.3);
        assert!(shut < 0.05);
    }

    #[test]
    fn test_phases_produce_expected_eye_state() {
        let face = SyntheticFace::new(0);

        let focused = face.frame(1_000);
        assert!(eye_aspect_ratio(&focused.left_eye).unwrap() > 0.3);

        let drowsy = face.frame(17_000);
        assert!(eye_aspect_ratio(&drowsy.left_eye).unwrap() < 0.05);
    }
}
