//! Attention Metrics & Classification Pipeline
//!
//! Turns noisy per-frame facial-landmark observations into smoothed
//! physiological signals, a composite attentiveness score, and a
//! debounced discrete state:
//! - Per-user eye-closure calibration
//! - EAR / gaze-deviation / head-movement extraction with smoothing
//! - PERCLOS and blink detection over sliding time windows
//! - Focus-zone containment scoring
//! - Weighted score composition and a priority state machine
//!
//! Input degradation is never fatal; the worst outcome is a forced
//! distract/neutral reading until valid frames resume.

pub mod calibration;
pub mod classifier;
pub mod config;
pub mod emission;
pub mod engine;
pub mod runtime;
pub mod score;
pub mod signal;
pub mod types;
pub mod window;
pub mod zone;

pub use calibration::{Baseline, CalibrationError, Calibrator};
pub use classifier::{ClassifierInput, StateClassifier};
pub use config::AttentionConfig;
pub use emission::EmissionBus;
pub use engine::{AttentionEngine, FrameOutput};
pub use runtime::{run, PipelineCommand};
pub use types::{AttentionState, BlinkEvent, MetricsSnapshot, StateRecord};
pub use zone::FocusZone;
