//! Per-frame signal extraction
//!
//! Turns a gated frame into smoothed physiological signals: eye
//! aspect ratios, closure flag, gaze deviation, and head-movement
//! magnitude. All smoothing state persists across frames and is only
//! cleared on explicit reset.

use crate::calibration::Baseline;
use crate::config::{AttentionConfig, CalibrationConfig};
use face_geometry::{centroid, direction_label, eye_aspect_ratio, GazeDirection, Point2};
use vision_frame::{HeadPose, VisionFrame};

/// Exponential moving average with an unseeded initial state
#[derive(Debug, Clone)]
pub struct Ema {
    alpha: f32,
    value: Option<f32>,
}

impl Ema {
    /// Create a new EMA weighting the current sample by `alpha`
    pub fn new(alpha: f32) -> Self {
        Self { alpha, value: None }
    }

    /// Fold in a sample and return the smoothed value
    pub fn update(&mut self, sample: f32) -> f32 {
        let next = match self.value {
            Some(prev) => self.alpha * sample + (1.0 - self.alpha) * prev,
            None => sample,
        };
        self.value = Some(next);
        next
    }

    /// Current smoothed value, if any sample has been seen
    pub fn get(&self) -> Option<f32> {
        self.value
    }

    /// Overwrite the smoothed value directly
    pub fn force(&mut self, value: f32) {
        self.value = Some(value);
    }

    /// Clear the accumulator
    pub fn reset(&mut self) {
        self.value = None;
    }
}

/// Running average of alert EAR over the first seconds of valid frames,
/// used as a stand-in threshold until calibration completes.
#[derive(Debug)]
pub struct BootstrapThreshold {
    window_ms: u64,
    started_ms: Option<u64>,
    sum: f32,
    count: u32,
}

impl BootstrapThreshold {
    pub fn new(window_ms: u64) -> Self {
        Self {
            window_ms,
            started_ms: None,
            sum: 0.0,
            count: 0,
        }
    }

    /// Accumulate a raw EAR sample while inside the bootstrap window
    pub fn observe(&mut self, timestamp_ms: u64, ear: f32) {
        let start = *self.started_ms.get_or_insert(timestamp_ms);
        if timestamp_ms.saturating_sub(start) <= self.window_ms {
            self.sum += ear;
            self.count += 1;
        }
    }

    /// Derived closure threshold, or the fixed default with no data yet
    pub fn threshold(&self, cfg: &CalibrationConfig) -> f32 {
        if self.count == 0 {
            return cfg.default_threshold;
        }
        let mean = self.sum / self.count as f32;
        (mean * cfg.ratio).clamp(cfg.threshold_floor, cfg.threshold_ceil)
    }

    pub fn reset(&mut self) {
        self.started_ms = None;
        self.sum = 0.0;
        self.count = 0;
    }
}

/// Signals derived from one gated frame
#[derive(Debug, Clone, Default)]
pub struct ExtractedSignals {
    /// Last valid raw left-eye EAR
    pub ear_left: f32,
    /// Last valid raw right-eye EAR
    pub ear_right: f32,
    /// Unsmoothed average of the valid per-eye EARs (bootstrap input)
    pub ear_raw_avg: f32,
    /// Smoothed average EAR
    pub ear_avg: f32,
    /// Smoothed EAR under the closure threshold
    pub eyes_closed: bool,
    /// Smoothed gaze deviation magnitude (0.0 - 1.0)
    pub gaze_deviation: f32,
    /// Dominant gaze offset direction
    pub gaze_direction: GazeDirection,
    /// Averaged iris center for zone containment, when available
    pub gaze_point: Option<Point2>,
    /// Smoothed head-movement magnitude (degrees per frame)
    pub head_delta: f32,
}

/// Stateful extractor; one instance per pipeline
#[derive(Debug)]
pub struct SignalExtractor {
    ear_ema: Ema,
    gaze_ema: Ema,
    head_ema: Ema,
    prev_pose: Option<HeadPose>,
    last_ear_left: f32,
    last_ear_right: f32,
}

impl SignalExtractor {
    pub fn new(cfg: &AttentionConfig) -> Self {
        Self {
            ear_ema: Ema::new(cfg.smoothing.ear_alpha),
            gaze_ema: Ema::new(cfg.smoothing.gaze_alpha),
            head_ema: Ema::new(cfg.smoothing.head_alpha),
            prev_pose: None,
            last_ear_left: 0.0,
            last_ear_right: 0.0,
        }
    }

    /// Extract signals from a frame that already passed the gate.
    ///
    /// A degenerate eye (collapsed horizontal span) falls back to the
    /// other eye; with both degenerate the last smoothed value stands.
    pub fn extract(
        &mut self,
        frame: &VisionFrame,
        closure_threshold: f32,
        cfg: &AttentionConfig,
    ) -> ExtractedSignals {
        let ear_l = eye_aspect_ratio(&frame.left_eye);
        let ear_r = eye_aspect_ratio(&frame.right_eye);

        if let Some(l) = ear_l {
            self.last_ear_left = l;
        }
        if let Some(r) = ear_r {
            self.last_ear_right = r;
        }

        let raw_avg = match (ear_l, ear_r) {
            (Some(l), Some(r)) => (l + r) / 2.0,
            (Some(l), None) => l,
            (None, Some(r)) => r,
            (None, None) => self.ear_ema.get().unwrap_or(closure_threshold),
        };

        let ear_avg = self.ear_ema.update(raw_avg);
        let eyes_closed = ear_avg < closure_threshold;

        let (gaze_deviation, gaze_direction, gaze_point) = self.extract_gaze(frame, cfg);
        let head_delta = self.extract_head(frame);

        ExtractedSignals {
            ear_left: self.last_ear_left,
            ear_right: self.last_ear_right,
            ear_raw_avg: raw_avg,
            ear_avg,
            eyes_closed,
            gaze_deviation,
            gaze_direction,
            gaze_point,
            head_delta,
        }
    }

    /// Gaze offset: per-eye iris center minus eyelid centroid, averaged
    /// across eyes, magnitude normalized by the configured radius.
    fn extract_gaze(
        &mut self,
        frame: &VisionFrame,
        cfg: &AttentionConfig,
    ) -> (f32, GazeDirection, Option<Point2>) {
        let left = Self::eye_offset(frame.left_iris, &frame.left_eye);
        let right = Self::eye_offset(frame.right_iris, &frame.right_eye);

        let offset = match (left, right) {
            (Some(l), Some(r)) => Some(((l.0 + r.0) / 2.0, (l.1 + r.1) / 2.0)),
            (Some(l), None) => Some(l),
            (None, Some(r)) => Some(r),
            (None, None) => None,
        };

        match offset {
            Some((dx, dy)) => {
                let magnitude =
                    ((dx * dx + dy * dy).sqrt() / cfg.gaze_norm_radius).clamp(0.0, 1.0);
                let smoothed = self.gaze_ema.update(magnitude);
                (smoothed, direction_label(dx, dy), frame.iris_center())
            }
            // No iris this frame: hold the smoothed value
            None => (self.gaze_ema.get().unwrap_or(0.0), GazeDirection::Center, None),
        }
    }

    fn eye_offset(iris: Option<Point2>, contour: &[Point2]) -> Option<(f32, f32)> {
        let iris = iris?;
        let center = centroid(contour)?;
        Some((iris.x - center.x, iris.y - center.y))
    }

    /// Head-movement magnitude between consecutive valid frames
    fn extract_head(&mut self, frame: &VisionFrame) -> f32 {
        match (frame.head_pose, self.prev_pose) {
            (Some(pose), Some(prev)) => {
                let delta = pose.delta(&prev);
                self.prev_pose = Some(pose);
                self.head_ema.update(delta)
            }
            (Some(pose), None) => {
                self.prev_pose = Some(pose);
                self.head_ema.update(0.0)
            }
            (None, _) => self.head_ema.get().unwrap_or(0.0),
        }
    }

    /// Clear gaze smoothing and pose continuity after a degraded frame.
    /// A face that disappears must not leave stale gaze state behind.
    pub fn clear_transients(&mut self) {
        self.gaze_ema.reset();
        self.prev_pose = None;
    }

    /// Clear all extractor state
    pub fn reset(&mut self) {
        self.ear_ema.reset();
        self.gaze_ema.reset();
        self.head_ema.reset();
        self.prev_pose = None;
        self.last_ear_left = 0.0;
        self.last_ear_right = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eye(openness: f32) -> Vec<Point2> {
        vec![
            Point2::new(0.30, 0.50),
            Point2::new(0.34, 0.50 - 0.04 * openness),
            Point2::new(0.38, 0.50 - 0.04 * openness),
            Point2::new(0.42, 0.50),
            Point2::new(0.38, 0.50 + 0.04 * openness),
            Point2::new(0.34, 0.50 + 0.04 * openness),
        ]
    }

    fn frame(ts: u64, openness: f32) -> VisionFrame {
        VisionFrame::new(ts, 0.9, eye(openness), eye(openness))
    }

    #[test]
    fn test_ema_seeds_on_first_sample() {
        let mut ema = Ema::new(0.2);
        assert_eq!(ema.update(10.0), 10.0);
        let second = ema.update(0.0);
        assert!((second - 8.0).abs() < 1e-6);
    }

    #[test]
    fn test_closure_flag_tracks_threshold() {
        let cfg = AttentionConfig::default();
        let mut extractor = SignalExtractor::new(&cfg);

        let open = extractor.extract(&frame(0, 1.0), 0.22, &cfg);
        assert!(!open.eyes_closed);
        assert!(open.ear_avg > 0.5);

        let mut extractor = SignalExtractor::new(&cfg);
        let shut = extractor.extract(&frame(0, 0.05), 0.22, &cfg);
        assert!(shut.eyes_closed);
    }

    #[test]
    fn test_gaze_deviation_normalized_and_smoothed() {
        let cfg = AttentionConfig::default();
        let mut extractor = SignalExtractor::new(&cfg);

        // Iris well off the eyelid centroid: saturates at 1.0
        let f = frame(0, 1.0).with_iris(Point2::new(0.6, 0.5), Point2::new(0.6, 0.5));
        let signals = extractor.extract(&f, 0.22, &cfg);
        assert!((signals.gaze_deviation - 1.0).abs() < 1e-6);

        // Centered iris pulls the EMA back down, but not instantly
        let centered = frame(33, 1.0).with_iris(Point2::new(0.36, 0.50), Point2::new(0.36, 0.50));
        let signals = extractor.extract(&centered, 0.22, &cfg);
        assert!(signals.gaze_deviation < 1.0);
        assert!(signals.gaze_deviation > 0.5);
    }

    #[test]
    fn test_head_delta_needs_consecutive_poses() {
        let cfg = AttentionConfig::default();
        let mut extractor = SignalExtractor::new(&cfg);

        let first = frame(0, 1.0).with_head_pose(HeadPose::new(0.0, 0.0, 0.0));
        assert_eq!(extractor.extract(&first, 0.22, &cfg).head_delta, 0.0);

        let second = frame(33, 1.0).with_head_pose(HeadPose::new(10.0, 0.0, 0.0));
        let signals = extractor.extract(&second, 0.22, &cfg);
        assert!(signals.head_delta > 0.0);
    }

    #[test]
    fn test_clear_transients_drops_pose_continuity() {
        let cfg = AttentionConfig::default();
        let mut extractor = SignalExtractor::new(&cfg);

        let first = frame(0, 1.0).with_head_pose(HeadPose::new(0.0, 0.0, 0.0));
        extractor.extract(&first, 0.22, &cfg);
        extractor.clear_transients();

        // After the gap the next pose re-anchors instead of producing a spike
        let jumped = frame(500, 1.0).with_head_pose(HeadPose::new(40.0, 0.0, 0.0));
        let signals = extractor.extract(&jumped, 0.22, &cfg);
        assert!(signals.head_delta < 1.0);
    }

    #[test]
    fn test_bootstrap_threshold_defaults_then_tracks() {
        let cal = CalibrationConfig::default();
        let mut bootstrap = BootstrapThreshold::new(cal.bootstrap_ms);
        assert!((bootstrap.threshold(&cal) - cal.default_threshold).abs() < 1e-6);

        bootstrap.observe(0, 0.30);
        bootstrap.observe(100, 0.30);
        // 0.30 * 0.72 = 0.216
        assert!((bootstrap.threshold(&cal) - 0.216).abs() < 1e-3);
    }

    #[test]
    fn test_bootstrap_ignores_samples_past_window() {
        let cal = CalibrationConfig::default();
        let mut bootstrap = BootstrapThreshold::new(cal.bootstrap_ms);
        bootstrap.observe(0, 0.30);
        bootstrap.observe(10_000, 0.90);
        assert!((bootstrap.threshold(&cal) - 0.216).abs() < 1e-3);
    }
}
