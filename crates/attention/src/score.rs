//! Composite focus score
//!
//! Folds the smoothed sub-signals into a single 0-100 attentiveness
//! score. Each raw signal maps onto a 0-1 sub-score through a soft
//! cap, the weighted sum is clamped, and the composite is EMA-smoothed
//! before classification.

use crate::config::AttentionConfig;
use crate::signal::Ema;

/// Stateful score composer; smoothing persists across frames
#[derive(Debug)]
pub struct ScoreComposer {
    ema: Ema,
}

fn clamp01(v: f32) -> f32 {
    v.clamp(0.0, 1.0)
}

impl ScoreComposer {
    pub fn new(cfg: &AttentionConfig) -> Self {
        Self {
            ema: Ema::new(cfg.smoothing.score_alpha),
        }
    }

    /// Compose and smooth the score for one frame
    pub fn compose(
        &mut self,
        perclos: f32,
        gaze_deviation: f32,
        head_delta: f32,
        zone_score: f32,
        cfg: &AttentionConfig,
    ) -> f32 {
        let eye_open = 1.0 - clamp01(perclos / cfg.caps.perclos);
        let gaze = 1.0 - clamp01(gaze_deviation / cfg.caps.gaze);
        let head = 1.0 - clamp01(head_delta / cfg.caps.head);
        let zone = clamp01(zone_score);

        let w = &cfg.weights;
        let total = w.total().max(1e-6);
        let weighted = (w.eye_open * eye_open + w.gaze * gaze + w.zone * zone
            + w.head_stability * head)
            / total;

        let raw = 100.0 * clamp01(weighted);
        self.ema.update(raw).clamp(0.0, 100.0)
    }

    /// Degraded frame: the face is gone, so the composite may not keep
    /// coasting on residual smoothing. Forces the score to zero.
    pub fn degrade(&mut self) -> f32 {
        self.ema.force(0.0);
        0.0
    }

    /// Last composed score
    pub fn current(&self) -> f32 {
        self.ema.get().unwrap_or(0.0)
    }

    pub fn reset(&mut self) {
        self.ema.reset();
    }
}
