//! Frame types delivered once per observation cycle

use face_geometry::Point2;
use serde::{Deserialize, Serialize};

/// Number of eyelid landmarks per eye contour
pub const EYE_CONTOUR_POINTS: usize = 6;

/// Head pose (Euler angles)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HeadPose {
    /// Yaw (left-right rotation) in degrees
    pub yaw: f32,
    /// Pitch (up-down tilt) in degrees
    pub pitch: f32,
    /// Roll (side tilt) in degrees
    pub roll: f32,
}

impl HeadPose {
    pub fn new(yaw: f32, pitch: f32, roll: f32) -> Self {
        Self { yaw, pitch, roll }
    }

    /// Euclidean norm of the per-axis delta to another pose
    pub fn delta(&self, other: &HeadPose) -> f32 {
        let dy = self.yaw - other.yaw;
        let dp = self.pitch - other.pitch;
        let dr = self.roll - other.roll;
        (dy * dy + dp * dp + dr * dr).sqrt()
    }
}

/// One landmark observation from the vision provider.
///
/// Created once per observation cycle, consumed exactly once, never
/// mutated. Eye contours are ordered outer-corner, upper lid (x2),
/// inner-corner, lower lid (x2) so the EAR spans line up.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisionFrame {
    /// Capture timestamp (milliseconds since epoch)
    pub timestamp_ms: u64,
    /// Overall detection confidence (0.0 - 1.0)
    pub confidence: f32,
    /// Whether the provider considers the detection usable
    pub valid: bool,
    /// Left eyelid contour (6 points, normalized)
    pub left_eye: Vec<Point2>,
    /// Right eyelid contour (6 points, normalized)
    pub right_eye: Vec<Point2>,
    /// Left iris center, when the provider refines iris landmarks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left_iris: Option<Point2>,
    /// Right iris center
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right_iris: Option<Point2>,
    /// Head pose angles, when estimated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head_pose: Option<HeadPose>,
}

impl VisionFrame {
    /// Create a valid frame from both eye contours
    pub fn new(
        timestamp_ms: u64,
        confidence: f32,
        left_eye: Vec<Point2>,
        right_eye: Vec<Point2>,
    ) -> Self {
        Self {
            timestamp_ms,
            confidence,
            valid: true,
            left_eye,
            right_eye,
            left_iris: None,
            right_iris: None,
            head_pose: None,
        }
    }

    /// A frame on which detection failed entirely
    pub fn invalid(timestamp_ms: u64) -> Self {
        Self {
            timestamp_ms,
            valid: false,
            ..Default::default()
        }
    }

    /// Attach iris centers
    pub fn with_iris(mut self, left: Point2, right: Point2) -> Self {
        self.left_iris = Some(left);
        self.right_iris = Some(right);
        self
    }

    /// Attach head pose angles
    pub fn with_head_pose(mut self, pose: HeadPose) -> Self {
        self.head_pose = Some(pose);
        self
    }

    /// Averaged iris center across both eyes, when both are present
    pub fn iris_center(&self) -> Option<Point2> {
        match (self.left_iris, self.right_iris) {
            (Some(l), Some(r)) => Some(Point2::new((l.x + r.x) / 2.0, (l.y + r.y) / 2.0)),
            _ => None,
        }
    }
}
