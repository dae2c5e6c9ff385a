//! Per-user eye-closure calibration
//!
//! A short sampling phase collects EAR from valid frames while the user
//! is assumed alert and forward-facing, then derives a personalized
//! closure threshold. The phase listens to the same frame stream as the
//! main path and commits its baseline at a single point; it never
//! blocks frame processing.

use crate::config::CalibrationConfig;
use face_geometry::eye_aspect_ratio;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use vision_frame::VisionFrame;

/// Calibration failure conditions. Both are recoverable: the pipeline
/// keeps operating on its previous or default threshold.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationError {
    #[error("no valid samples collected in the calibration window")]
    InsufficientSamples,

    #[error("calibration aborted before the sampling window elapsed")]
    Timeout,
}

/// Calibrated eye-aperture baseline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    /// Mean EAR while alert
    pub ear0: f32,

    /// Personalized closure threshold, clamped to the safety band
    pub closure_threshold: f32,
}

impl Baseline {
    /// Derive a baseline from a mean alert EAR.
    ///
    /// The clamp keeps a degenerate calibration from producing an
    /// always-closed or never-closed threshold.
    pub fn from_ear0(ear0: f32, cfg: &CalibrationConfig) -> Self {
        let closure_threshold =
            (ear0 * cfg.ratio).clamp(cfg.threshold_floor, cfg.threshold_ceil);
        Self {
            ear0,
            closure_threshold,
        }
    }
}

/// Time-bounded EAR sampling phase.
///
/// Anchored to the first observed frame timestamp; completion is by
/// elapsed wall-clock time, not frame count.
#[derive(Debug)]
pub struct Calibrator {
    duration_ms: u64,
    min_confidence: f32,
    started_ms: Option<u64>,
    samples: Vec<f32>,
}

impl Calibrator {
    pub fn new(duration_ms: u64, min_confidence: f32) -> Self {
        Self {
            duration_ms,
            min_confidence,
            started_ms: None,
            samples: Vec::new(),
        }
    }

    /// Feed one frame. Every frame anchors the clock; only valid,
    /// sufficiently-confident frames with both eyes measurable
    /// contribute a sample.
    pub fn observe(&mut self, frame: &VisionFrame) {
        self.started_ms.get_or_insert(frame.timestamp_ms);

        if !frame.valid || frame.confidence < self.min_confidence {
            return;
        }

        let left = eye_aspect_ratio(&frame.left_eye);
        let right = eye_aspect_ratio(&frame.right_eye);
        if let (Some(l), Some(r)) = (left, right) {
            self.samples.push((l + r) / 2.0);
        }
    }

    /// Whether the sampling window has elapsed
    pub fn is_complete(&self, now_ms: u64) -> bool {
        match self.started_ms {
            Some(start) => now_ms.saturating_sub(start) >= self.duration_ms,
            None => false,
        }
    }

    /// Number of samples collected so far
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Conclude the phase: mean of the collected samples, or
    /// `InsufficientSamples` when nothing valid was observed.
    pub fn finish(self, cfg: &CalibrationConfig) -> Result<Baseline, CalibrationError> {
        if self.samples.is_empty() {
            return Err(CalibrationError::InsufficientSamples);
        }

        let ear0 = self.samples.iter().sum::<f32>() / self.samples.len() as f32;
        Ok(Baseline::from_ear0(ear0, cfg))
    }
}
