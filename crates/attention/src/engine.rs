//! Pipeline engine
//!
//! Owns every accumulator, window, and the calibration baseline; no
//! ambient globals. Each frame flows strictly one direction: gate ->
//! extract -> aggregate -> compose -> classify -> emit, fully
//! processed before the next frame is accepted.

use crate::calibration::{Baseline, CalibrationError, Calibrator};
use crate::classifier::{ClassifierInput, StateClassifier};
use crate::config::AttentionConfig;
use crate::emission::EmissionBus;
use crate::score::ScoreComposer;
use crate::signal::{BootstrapThreshold, SignalExtractor};
use crate::types::{AttentionState, MetricsSnapshot, StateRecord};
use crate::window::{BlinkDetector, PerclosWindow};
use crate::zone::{FocusZone, ZoneScorer};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use vision_frame::{FrameCheck, VisionFrame};

/// Result of processing one frame: the snapshot always, a state record
/// only on confirmed change or re-affirmation.
#[derive(Debug, Clone)]
pub struct FrameOutput {
    pub snapshot: MetricsSnapshot,
    pub state_change: Option<StateRecord>,
}

/// The metrics-and-classification pipeline
pub struct AttentionEngine {
    config: AttentionConfig,
    gate: FrameCheck,
    calibrator: Option<Calibrator>,
    last_calibration: Option<Result<Baseline, CalibrationError>>,
    baseline: Option<Baseline>,
    bootstrap: BootstrapThreshold,
    extractor: SignalExtractor,
    perclos: PerclosWindow,
    blinks: BlinkDetector,
    zone: ZoneScorer,
    composer: ScoreComposer,
    classifier: StateClassifier,
    bus: EmissionBus,
}

impl AttentionEngine {
    /// Create an engine with the given configuration
    pub fn new(config: AttentionConfig) -> Self {
        Self {
            gate: FrameCheck::new(config.min_confidence),
            bootstrap: BootstrapThreshold::new(config.calibration.bootstrap_ms),
            extractor: SignalExtractor::new(&config),
            perclos: PerclosWindow::new(config.perclos_window_ms),
            blinks: BlinkDetector::new(config.blink.clone()),
            zone: ZoneScorer::new(),
            composer: ScoreComposer::new(&config),
            classifier: StateClassifier::new(
                config.thresholds.clone(),
                config.debounce.clone(),
            ),
            bus: EmissionBus::default(),
            calibrator: None,
            last_calibration: None,
            baseline: None,
            config,
        }
    }

    /// Process one frame end to end and publish the results
    pub fn process_frame(&mut self, frame: &VisionFrame) -> FrameOutput {
        self.feed_calibration(frame);

        let output = match self.gate.check(frame) {
            Ok(()) => self.process_valid(frame),
            Err(err) => {
                debug!(error = %err, timestamp = frame.timestamp_ms, "frame degraded");
                self.process_degraded(frame)
            }
        };

        self.bus.publish_snapshot(output.snapshot.clone());
        if let Some(record) = &output.state_change {
            self.bus.publish_state(record.clone());
        }

        output
    }

    fn process_valid(&mut self, frame: &VisionFrame) -> FrameOutput {
        let threshold = self.closure_threshold();
        let signals = self.extractor.extract(frame, threshold, &self.config);

        if self.baseline.is_none() {
            self.bootstrap.observe(frame.timestamp_ms, signals.ear_raw_avg);
        }

        self.perclos.push(frame.timestamp_ms, signals.eyes_closed, true);
        let blink = self.blinks.update(frame.timestamp_ms, signals.eyes_closed);

        let perclos = self.perclos.perclos();
        let zone_score = self.zone.update(
            &self.config.zone,
            signals.gaze_point,
            signals.gaze_deviation,
            signals.head_delta,
        );

        let score = self.composer.compose(
            perclos,
            signals.gaze_deviation,
            signals.head_delta,
            zone_score,
            &self.config,
        );

        let state_change = self.classifier.classify(ClassifierInput {
            timestamp_ms: frame.timestamp_ms,
            score,
            perclos,
            zone_score,
            gaze_deviation: signals.gaze_deviation,
        });

        let snapshot = MetricsSnapshot {
            timestamp_ms: frame.timestamp_ms,
            ear_left: signals.ear_left,
            ear_right: signals.ear_right,
            ear_avg: signals.ear_avg,
            eyes_closed: signals.eyes_closed,
            gaze_deviation: signals.gaze_deviation,
            gaze_direction: signals.gaze_direction,
            head_delta: signals.head_delta,
            perclos,
            blink_rate: self.blinks.rate(),
            blink,
            zone_score,
            score,
            degraded: false,
        };

        FrameOutput {
            snapshot,
            state_change,
        }
    }

    /// Invalid or low-confidence frame: zeroed scores, a distract bias,
    /// and no residual smoothing that could keep reporting focus.
    fn process_degraded(&mut self, frame: &VisionFrame) -> FrameOutput {
        self.perclos.push(frame.timestamp_ms, false, false);
        self.extractor.clear_transients();
        self.zone.reset();

        let score = self.composer.degrade();
        let perclos = self.perclos.perclos();
        let zone_score = self.zone.get();

        let state_change = self.classifier.classify(ClassifierInput {
            timestamp_ms: frame.timestamp_ms,
            score,
            perclos,
            zone_score,
            gaze_deviation: 0.0,
        });

        let snapshot = MetricsSnapshot {
            timestamp_ms: frame.timestamp_ms,
            perclos,
            blink_rate: self.blinks.rate(),
            zone_score,
            degraded: true,
            ..Default::default()
        };

        FrameOutput {
            snapshot,
            state_change,
        }
    }

    /// Active closure threshold: calibrated baseline if committed,
    /// otherwise the bootstrap running average (or fixed default).
    pub fn closure_threshold(&self) -> f32 {
        match &self.baseline {
            Some(baseline) => baseline.closure_threshold,
            None => self.bootstrap.threshold(&self.config.calibration),
        }
    }

    /// Start (or restart) a calibration sampling phase. Frame
    /// processing continues; the baseline commits when the wall-clock
    /// window elapses.
    pub fn begin_calibration(&mut self, duration_ms: u64) {
        if self.calibrator.is_some() {
            debug!("restarting calibration; previous phase discarded");
        }
        info!(duration_ms, "calibration started");
        self.calibrator = Some(Calibrator::new(duration_ms, self.config.min_confidence));
        self.last_calibration = None;
    }

    /// Abort an active calibration phase; resolves as a failure rather
    /// than leaving a caller hanging.
    pub fn abort_calibration(&mut self) {
        if self.calibrator.take().is_some() {
            warn!("calibration aborted");
            self.last_calibration = Some(Err(CalibrationError::Timeout));
        }
    }

    /// Whether a calibration phase is currently sampling
    pub fn calibration_active(&self) -> bool {
        self.calibrator.is_some()
    }

    /// Outcome of the most recently concluded calibration phase
    pub fn last_calibration(&self) -> Option<Result<Baseline, CalibrationError>> {
        self.last_calibration
    }

    /// Committed baseline, if any
    pub fn baseline(&self) -> Option<Baseline> {
        self.baseline
    }

    fn feed_calibration(&mut self, frame: &VisionFrame) {
        let complete = match &mut self.calibrator {
            Some(calibrator) => {
                calibrator.observe(frame);
                calibrator.is_complete(frame.timestamp_ms)
            }
            None => false,
        };

        if !complete {
            return;
        }

        if let Some(calibrator) = self.calibrator.take() {
            let samples = calibrator.sample_count();
            let result = calibrator.finish(&self.config.calibration);
            match &result {
                Ok(baseline) => {
                    info!(
                        ear0 = baseline.ear0,
                        threshold = baseline.closure_threshold,
                        samples,
                        "calibration committed"
                    );
                    self.baseline = Some(*baseline);
                }
                Err(err) => {
                    warn!(error = %err, "calibration failed; keeping existing threshold");
                }
            }
            self.last_calibration = Some(result);
        }
    }

    /// Replace the focus zone at runtime
    pub fn set_zone(&mut self, zone: Option<FocusZone>) {
        self.config.zone.rect = zone;
    }

    /// Last confirmed state (queryable even when emission suppresses)
    pub fn current_state(&self) -> AttentionState {
        self.classifier.current_state()
    }

    /// Most recent composite score
    pub fn current_score(&self) -> f32 {
        self.classifier.current_score()
    }

    /// Subscribe to per-frame snapshots
    pub fn subscribe_snapshots(&self) -> broadcast::Receiver<MetricsSnapshot> {
        self.bus.subscribe_snapshots()
    }

    /// Subscribe to confirmed state records
    pub fn subscribe_states(&self) -> broadcast::Receiver<StateRecord> {
        self.bus.subscribe_states()
    }

    /// Active configuration
    pub fn config(&self) -> &AttentionConfig {
        &self.config
    }

    /// Clear all windows, smoothing state, and the classifier back to
    /// the initial uncommitted state. The committed baseline survives;
    /// only recalibration overwrites it.
    pub fn reset(&mut self) {
        info!("pipeline reset");
        self.calibrator = None;
        self.bootstrap.reset();
        self.extractor.reset();
        self.perclos.reset();
        self.blinks.reset();
        self.zone.reset();
        self.composer.reset();
        self.classifier.reset();
    }
}
