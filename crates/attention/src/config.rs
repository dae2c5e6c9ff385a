//! Pipeline configuration
//!
//! Every threshold, weight, and smoothing factor lives here. Source
//! history showed the same constants tuned differently across
//! snapshots, so nothing is hard-coded in the pipeline logic.

use crate::zone::FocusZone;
use serde::{Deserialize, Serialize};

/// Attention pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttentionConfig {
    /// Detection confidence floor; frames below it take the degraded path
    pub min_confidence: f32,

    /// Eye-closure calibration parameters
    pub calibration: CalibrationConfig,

    /// Per-signal EMA weights
    pub smoothing: SmoothingConfig,

    /// Normalization radius for gaze deviation (normalized coordinates)
    pub gaze_norm_radius: f32,

    /// PERCLOS sliding window length (milliseconds)
    pub perclos_window_ms: u64,

    /// Blink acceptance bounds
    pub blink: BlinkConfig,

    /// Composite score weights
    pub weights: ScoreWeights,

    /// Soft caps mapping raw signals onto 0-1 sub-scores
    pub caps: SoftCaps,

    /// Classifier state thresholds
    pub thresholds: StateThresholds,

    /// Debounce and emission pacing
    pub debounce: DebounceConfig,

    /// Focus zone scoring parameters (rect is optional)
    pub zone: ZoneConfig,
}

impl Default for AttentionConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.5,
            calibration: CalibrationConfig::default(),
            smoothing: SmoothingConfig::default(),
            gaze_norm_radius: 0.05,
            perclos_window_ms: 60_000,
            blink: BlinkConfig::default(),
            weights: ScoreWeights::default(),
            caps: SoftCaps::default(),
            thresholds: StateThresholds::default(),
            debounce: DebounceConfig::default(),
            zone: ZoneConfig::default(),
        }
    }
}

impl AttentionConfig {
    /// Stricter variant: flags fatigue and distraction earlier
    pub fn strict() -> Self {
        Self {
            thresholds: StateThresholds {
                drowsy_perclos: 0.30,
                fatigue_perclos: 0.18,
                distract_score: 50.0,
                transition_score: 70.0,
                ..Default::default()
            },
            debounce: DebounceConfig {
                hold_frames: 15,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// More lenient variant: tolerates longer lapses before flagging
    pub fn lenient() -> Self {
        Self {
            thresholds: StateThresholds {
                drowsy_perclos: 0.50,
                fatigue_perclos: 0.35,
                distract_score: 30.0,
                transition_score: 55.0,
                ..Default::default()
            },
            debounce: DebounceConfig {
                hold_frames: 45,
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

/// Calibration parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// Sampling window (milliseconds of wall-clock time)
    pub duration_ms: u64,

    /// Closure threshold as a fraction of the calibrated baseline EAR
    pub ratio: f32,

    /// Lower clamp for the derived threshold
    pub threshold_floor: f32,

    /// Upper clamp for the derived threshold
    pub threshold_ceil: f32,

    /// Fixed threshold used before any calibration or bootstrap data
    pub default_threshold: f32,

    /// Length of the bootstrap running average used until calibration lands
    pub bootstrap_ms: u64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            duration_ms: 10_000,
            ratio: 0.72,
            threshold_floor: 0.08,
            threshold_ceil: 0.30,
            default_threshold: 0.22,
            bootstrap_ms: 2_000,
        }
    }
}

/// EMA weight applied to the current sample, per signal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmoothingConfig {
    pub ear_alpha: f32,
    pub gaze_alpha: f32,
    pub head_alpha: f32,
    pub score_alpha: f32,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            ear_alpha: 0.4,
            gaze_alpha: 0.2,
            head_alpha: 0.2,
            score_alpha: 0.2,
        }
    }
}

/// Blink acceptance bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlinkConfig {
    /// Shortest closure accepted as a blink (filters 1-frame noise)
    pub min_duration_ms: u64,

    /// Longest closure accepted as a blink (longer is sustained closure)
    pub max_duration_ms: u64,

    /// Trailing window for the blink rate (milliseconds)
    pub window_ms: u64,
}

impl Default for BlinkConfig {
    fn default() -> Self {
        Self {
            min_duration_ms: 50,
            max_duration_ms: 800,
            window_ms: 60_000,
        }
    }
}

/// Composite score weights; normalized before use
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub eye_open: f32,
    pub gaze: f32,
    pub zone: f32,
    pub head_stability: f32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            eye_open: 0.40,
            gaze: 0.20,
            zone: 0.25,
            head_stability: 0.15,
        }
    }
}

impl ScoreWeights {
    /// Sum of all weights
    pub fn total(&self) -> f32 {
        self.eye_open + self.gaze + self.zone + self.head_stability
    }
}

/// Raw signal values at which a sub-score bottoms out
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoftCaps {
    /// PERCLOS at which the eye-open sub-score reaches 0
    pub perclos: f32,

    /// Gaze deviation at which the gaze sub-score reaches 0
    pub gaze: f32,

    /// Head-movement magnitude (degrees) at which stability reaches 0
    pub head: f32,
}

impl Default for SoftCaps {
    fn default() -> Self {
        Self {
            perclos: 0.35,
            gaze: 0.60,
            head: 8.0,
        }
    }
}

/// Classifier thresholds, priority order drowsy > fatigue > distract
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateThresholds {
    /// PERCLOS at or above which the state is drowsy
    pub drowsy_perclos: f32,

    /// PERCLOS at or above which the state is fatigue
    pub fatigue_perclos: f32,

    /// Composite score below which the state is distract
    pub distract_score: f32,

    /// Composite score below which the state is transition
    pub transition_score: f32,

    /// Zone score below which wandering gaze reads as distraction
    pub zone_floor: f32,

    /// Gaze deviation above which gaze counts as wandering
    pub gaze_wander: f32,
}

impl Default for StateThresholds {
    fn default() -> Self {
        Self {
            drowsy_perclos: 0.40,
            fatigue_perclos: 0.25,
            distract_score: 40.0,
            transition_score: 65.0,
            zone_floor: 0.40,
            gaze_wander: 0.25,
        }
    }
}

/// Debounce and emission pacing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebounceConfig {
    /// Consecutive frames a candidate must hold before confirmation
    /// (30 frames is about 2 seconds at the 15 Hz sensor target)
    pub hold_frames: u32,

    /// Minimum spacing between unchanged-state re-affirmations;
    /// `None` suppresses them entirely
    pub reaffirm_interval_ms: Option<u64>,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            hold_frames: 30,
            reaffirm_interval_ms: Some(1_000),
        }
    }
}

/// Focus-zone scoring parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneConfig {
    /// The intended on-screen area; absence scores neutrally
    pub rect: Option<FocusZone>,

    /// EMA rate toward 1.0 while the gaze point is inside
    pub rise_inside: f32,

    /// EMA rate toward `outside_target` while outside
    pub rise_outside: f32,

    /// EMA rate toward neutral 0.5 when no zone or no gaze point
    pub drift_neutral: f32,

    /// Target value while outside the zone
    pub outside_target: f32,

    /// Multiplier applied when outside and simultaneously moving away
    pub away_penalty: f32,

    /// Gaze deviation above which outside movement is penalized
    pub gaze_threshold: f32,

    /// Head delta (degrees) above which outside movement is penalized
    pub head_threshold: f32,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            rect: None,
            rise_inside: 0.06,
            rise_outside: 0.02,
            drift_neutral: 0.01,
            outside_target: 0.65,
            away_penalty: 0.85,
            gaze_threshold: 0.15,
            head_threshold: 2.0,
        }
    }
}
