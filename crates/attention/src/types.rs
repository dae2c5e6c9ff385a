//! Pipeline output records
//!
//! One `MetricsSnapshot` per processed frame; a `StateRecord` only on
//! confirmed transitions or periodic re-affirmations.

use face_geometry::GazeDirection;
use serde::{Deserialize, Serialize};

/// Discrete attentional state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttentionState {
    Focus,
    /// Initial, uncommitted state pending first classification
    #[default]
    Transition,
    Distract,
    Fatigue,
    Drowsy,
}

/// An accepted blink (closed-to-open transition of plausible duration)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlinkEvent {
    /// Timestamp of the reopening (milliseconds)
    pub timestamp_ms: u64,
    /// How long the eyes stayed closed (milliseconds)
    pub duration_ms: u64,
}

/// Per-frame derived metrics for the live display consumer.
///
/// All bounded fields are clamped to their domain. `perclos` is 0.0
/// whenever the window holds no valid samples.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Source frame timestamp (milliseconds)
    pub timestamp_ms: u64,

    /// Raw left-eye aspect ratio (last valid measurement)
    pub ear_left: f32,

    /// Raw right-eye aspect ratio (last valid measurement)
    pub ear_right: f32,

    /// Smoothed average eye aspect ratio
    pub ear_avg: f32,

    /// Whether the smoothed EAR is under the closure threshold
    pub eyes_closed: bool,

    /// Smoothed gaze deviation magnitude (0.0 - 1.0)
    pub gaze_deviation: f32,

    /// Dominant gaze offset direction
    pub gaze_direction: GazeDirection,

    /// Smoothed head-movement magnitude (degrees per frame)
    pub head_delta: f32,

    /// Fraction of the trailing window with eyes closed (0.0 - 1.0)
    pub perclos: f32,

    /// Accepted blinks in the trailing window (count per minute)
    pub blink_rate: u32,

    /// Blink completed on this frame, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blink: Option<BlinkEvent>,

    /// Focus-zone containment score (0.0 - 1.0)
    pub zone_score: f32,

    /// Composite attentiveness score (0.0 - 100.0)
    pub score: f32,

    /// Set when this frame took the degraded path (invalid/low confidence)
    pub degraded: bool,
}

/// A confirmed state transition or re-affirmation for the persistence
/// consumer. Timestamps never decrease across emitted records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateRecord {
    /// Confirmation timestamp (milliseconds)
    pub timestamp_ms: u64,

    /// Confirmed state
    pub state: AttentionState,

    /// Composite score at confirmation time
    pub score: f32,

    /// Signals that triggered the classification
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub reasons: Vec<String>,
}
