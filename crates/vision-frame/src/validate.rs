//! Frame validation gate
//!
//! Degraded input is a normal operating condition, never a panic: the
//! pipeline consults the gate and routes rejected frames down its
//! degraded path.

use crate::frame::{VisionFrame, EYE_CONTOUR_POINTS};
use thiserror::Error;

/// Reasons a frame is rejected by the gate
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum FrameError {
    #[error("frame flagged invalid by the vision provider")]
    Invalid,

    #[error("confidence {actual} below floor {floor}")]
    LowConfidence { actual: f32, floor: f32 },

    #[error("{side} eye contour has {actual} points, expected {expected}")]
    MalformedContour {
        side: &'static str,
        actual: usize,
        expected: usize,
    },
}

/// Validation gate applied before a frame enters the extraction path
#[derive(Debug, Clone)]
pub struct FrameCheck {
    /// Minimum acceptable detection confidence
    min_confidence: f32,
}

impl FrameCheck {
    pub fn new(min_confidence: f32) -> Self {
        Self { min_confidence }
    }

    /// Check a frame against the gate.
    ///
    /// Non-increasing or duplicate timestamps are deliberately not
    /// checked: the pipeline treats every frame as a fresh sample.
    pub fn check(&self, frame: &VisionFrame) -> Result<(), FrameError> {
        if !frame.valid {
            return Err(FrameError::Invalid);
        }

        if frame.confidence < self.min_confidence {
            return Err(FrameError::LowConfidence {
                actual: frame.confidence,
                floor: self.min_confidence,
            });
        }

        for (side, contour) in [("left", &frame.left_eye), ("right", &frame.right_eye)] {
            if contour.len() != EYE_CONTOUR_POINTS {
                return Err(FrameError::MalformedContour {
                    side,
                    actual: contour.len(),
                    expected: EYE_CONTOUR_POINTS,
                });
            }
        }

        Ok(())
    }
}

impl Default for FrameCheck {
    fn default() -> Self {
        Self::new(0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use face_geometry::Point2;

    fn contour() -> Vec<Point2> {
        (0..6).map(|i| Point2::new(i as f32 * 0.01, 0.5)).collect()
    }

    #[test]
    fn test_accepts_good_frame() {
        let frame = VisionFrame::new(0, 0.9, contour(), contour());
        assert!(FrameCheck::default().check(&frame).is_ok());
    }

    #[test]
    fn test_rejects_invalid_flag() {
        let frame = VisionFrame::invalid(0);
        assert_eq!(
            FrameCheck::default().check(&frame),
            Err(FrameError::Invalid)
        );
    }

    #[test]
    fn test_rejects_low_confidence() {
        let frame = VisionFrame::new(0, 0.3, contour(), contour());
        assert!(matches!(
            FrameCheck::default().check(&frame),
            Err(FrameError::LowConfidence { .. })
        ));
    }

    #[test]
    fn test_rejects_short_contour() {
        let mut short = contour();
        short.pop();
        let frame = VisionFrame::new(0, 0.9, contour(), short);
        assert!(matches!(
            FrameCheck::default().check(&frame),
            Err(FrameError::MalformedContour { side: "right", .. })
        ));
    }
}
