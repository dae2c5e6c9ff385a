//! Focus-zone containment scoring
//!
//! Scores whether gaze stays inside the user's intended work area.
//! The response is deliberately asymmetric: a brief glance outside
//! barely moves the score, while sustained outside movement pulls it
//! down sharply.

use crate::config::ZoneConfig;
use face_geometry::Point2;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in normalized screen coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FocusZone {
    pub x_min: f32,
    pub y_min: f32,
    pub x_max: f32,
    pub y_max: f32,
}

impl FocusZone {
    /// Create a zone, normalizing a flipped rectangle
    pub fn new(x_min: f32, y_min: f32, x_max: f32, y_max: f32) -> Self {
        Self {
            x_min: x_min.min(x_max),
            y_min: y_min.min(y_max),
            x_max: x_min.max(x_max),
            y_max: y_min.max(y_max),
        }
    }

    /// Binary containment test
    pub fn contains(&self, p: Point2) -> bool {
        p.x >= self.x_min && p.x <= self.x_max && p.y >= self.y_min && p.y <= self.y_max
    }
}

/// Stateful containment score (0.0 - 1.0), neutral at 0.5
#[derive(Debug)]
pub struct ZoneScorer {
    value: f32,
}

const NEUTRAL: f32 = 0.5;

impl ZoneScorer {
    pub fn new() -> Self {
        Self { value: NEUTRAL }
    }

    /// Advance the score one frame.
    ///
    /// Without a configured zone or a gaze point, the score drifts
    /// slowly back to neutral so absence neither rewards nor punishes.
    pub fn update(
        &mut self,
        cfg: &ZoneConfig,
        gaze_point: Option<Point2>,
        gaze_deviation: f32,
        head_delta: f32,
    ) -> f32 {
        match (cfg.rect, gaze_point) {
            (Some(zone), Some(point)) => {
                if zone.contains(point) {
                    self.value += (1.0 - self.value) * cfg.rise_inside;
                } else {
                    self.value += (cfg.outside_target - self.value) * cfg.rise_outside;

                    let moving_away =
                        gaze_deviation > cfg.gaze_threshold || head_delta > cfg.head_threshold;
                    if moving_away {
                        self.value *= cfg.away_penalty;
                    }
                }
            }
            _ => {
                self.value += (NEUTRAL - self.value) * cfg.drift_neutral;
            }
        }

        self.value = self.value.clamp(0.0, 1.0);
        self.value
    }

    /// Current score without advancing
    pub fn get(&self) -> f32 {
        self.value
    }

    pub fn reset(&mut self) {
        self.value = NEUTRAL;
    }
}

impl Default for ZoneScorer {
    fn default() -> Self {
        Self::new()
    }
}
