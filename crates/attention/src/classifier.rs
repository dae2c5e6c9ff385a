//! State classification and debounce
//!
//! Maps the composite score plus raw PERCLOS onto a discrete state
//! with a fixed priority ladder, then debounces with a hold counter: a
//! candidate must be the raw classification for N consecutive frames
//! before it replaces the confirmed state, so single-frame flicker
//! never reaches consumers.

use crate::config::{DebounceConfig, StateThresholds};
use crate::types::{AttentionState, StateRecord};
use tracing::{debug, info};

/// Inputs the classifier consumes each frame
#[derive(Debug, Clone, Copy)]
pub struct ClassifierInput {
    pub timestamp_ms: u64,
    pub score: f32,
    pub perclos: f32,
    pub zone_score: f32,
    pub gaze_deviation: f32,
}

/// Debounced attention state machine
#[derive(Debug)]
pub struct StateClassifier {
    thresholds: StateThresholds,
    debounce: DebounceConfig,
    confirmed: AttentionState,
    candidate: Option<(AttentionState, u32)>,
    last_emit_ms: Option<u64>,
    current_score: f32,
}

impl StateClassifier {
    pub fn new(thresholds: StateThresholds, debounce: DebounceConfig) -> Self {
        Self {
            thresholds,
            debounce,
            confirmed: AttentionState::default(),
            candidate: None,
            last_emit_ms: None,
            current_score: 0.0,
        }
    }

    /// Classify one frame; returns a record only on confirmed change
    /// or a paced re-affirmation.
    pub fn classify(&mut self, input: ClassifierInput) -> Option<StateRecord> {
        let raw = self.raw_state(&input);
        self.current_score = input.score;

        let changed = self.debounce(raw);

        // Emitted timestamps never decrease, even if the sensor clock
        // stutters backwards.
        let emit_ts = input.timestamp_ms.max(self.last_emit_ms.unwrap_or(0));

        if changed {
            info!(
                state = ?self.confirmed,
                score = input.score,
                perclos = input.perclos,
                "attention state changed"
            );
            self.last_emit_ms = Some(emit_ts);
            return Some(StateRecord {
                timestamp_ms: emit_ts,
                state: self.confirmed,
                score: input.score,
                reasons: self.reasons(&input),
            });
        }

        // Unchanged state: at most one re-affirmation per interval
        if let Some(interval) = self.debounce.reaffirm_interval_ms {
            let due = match self.last_emit_ms {
                Some(last) => input.timestamp_ms.saturating_sub(last) >= interval,
                None => true,
            };
            if due {
                self.last_emit_ms = Some(emit_ts);
                return Some(StateRecord {
                    timestamp_ms: emit_ts,
                    state: self.confirmed,
                    score: input.score,
                    reasons: Vec::new(),
                });
            }
        }

        None
    }

    /// Priority ladder, high to low: drowsy > fatigue > distract >
    /// transition > focus.
    fn raw_state(&self, input: &ClassifierInput) -> AttentionState {
        let t = &self.thresholds;

        if input.perclos >= t.drowsy_perclos {
            AttentionState::Drowsy
        } else if input.perclos >= t.fatigue_perclos {
            AttentionState::Fatigue
        } else if input.score < t.distract_score
            || (input.zone_score < t.zone_floor && input.gaze_deviation > t.gaze_wander)
        {
            AttentionState::Distract
        } else if input.score < t.transition_score {
            AttentionState::Transition
        } else {
            AttentionState::Focus
        }
    }

    /// Hold-counter debounce; returns whether the confirmed state
    /// changed this frame.
    fn debounce(&mut self, raw: AttentionState) -> bool {
        if raw == self.confirmed {
            self.candidate = None;
            return false;
        }

        let count = match self.candidate {
            Some((state, n)) if state == raw => n + 1,
            _ => 1,
        };

        if count >= self.debounce.hold_frames {
            self.confirmed = raw;
            self.candidate = None;
            true
        } else {
            debug!(candidate = ?raw, held = count, "candidate state pending confirmation");
            self.candidate = Some((raw, count));
            false
        }
    }

    fn reasons(&self, input: &ClassifierInput) -> Vec<String> {
        let t = &self.thresholds;
        let mut reasons = Vec::new();

        match self.confirmed {
            AttentionState::Drowsy => reasons.push(format!(
                "perclos {:.2} at or above drowsy threshold {:.2}",
                input.perclos, t.drowsy_perclos
            )),
            AttentionState::Fatigue => reasons.push(format!(
                "perclos {:.2} at or above fatigue threshold {:.2}",
                input.perclos, t.fatigue_perclos
            )),
            AttentionState::Distract => {
                if input.score < t.distract_score {
                    reasons.push(format!(
                        "score {:.0} below distract threshold {:.0}",
                        input.score, t.distract_score
                    ));
                }
                if input.zone_score < t.zone_floor && input.gaze_deviation > t.gaze_wander {
                    reasons.push("gaze wandering outside the focus zone".to_string());
                }
            }
            AttentionState::Transition => reasons.push(format!(
                "score {:.0} below focus threshold {:.0}",
                input.score, t.transition_score
            )),
            AttentionState::Focus => reasons.push(format!(
                "score {:.0} at or above focus threshold {:.0}",
                input.score, t.transition_score
            )),
        }

        reasons
    }

    /// Last confirmed state
    pub fn current_state(&self) -> AttentionState {
        self.confirmed
    }

    /// Score at the most recent classification
    pub fn current_score(&self) -> f32 {
        self.current_score
    }

    /// Back to the initial uncommitted state
    pub fn reset(&mut self) {
        self.confirmed = AttentionState::default();
        self.candidate = None;
        self.last_emit_ms = None;
        self.current_score = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier(hold: u32, reaffirm: Option<u64>) -> StateClassifier {
        StateClassifier::new(
            StateThresholds::default(),
            DebounceConfig {
                hold_frames: hold,
                reaffirm_interval_ms: reaffirm,
            },
        )
    }

    fn input(ts: u64, score: f32, perclos: f32) -> ClassifierInput {
        ClassifierInput {
            timestamp_ms: ts,
            score,
            perclos,
            zone_score: 0.8,
            gaze_deviation: 0.0,
        }
    }

    #[test]
    fn test_drowsy_priority_beats_high_score() {
        let mut c = classifier(1, None);
        let record = c.classify(input(0, 95.0, 0.5)).unwrap();
        assert_eq!(record.state, AttentionState::Drowsy);
    }

    #[test]
    fn test_fatigue_between_moderate_and_high_perclos() {
        let mut c = classifier(1, None);
        let record = c.classify(input(0, 95.0, 0.30)).unwrap();
        assert_eq!(record.state, AttentionState::Fatigue);
    }

    #[test]
    fn test_zone_wander_reads_as_distract() {
        let mut c = classifier(1, None);
        let record = c
            .classify(ClassifierInput {
                timestamp_ms: 0,
                score: 80.0,
                perclos: 0.0,
                zone_score: 0.2,
                gaze_deviation: 0.5,
            })
            .unwrap();
        assert_eq!(record.state, AttentionState::Distract);
    }

    #[test]
    fn test_single_frame_flicker_never_reaches_consumers() {
        let mut c = classifier(3, None);

        // Confirm focus
        for i in 0..3 {
            c.classify(input(i * 66, 90.0, 0.0));
        }
        assert_eq!(c.current_state(), AttentionState::Focus);

        // One bad frame, then back to focus: nothing emitted
        assert!(c.classify(input(300, 10.0, 0.0)).is_none());
        assert!(c.classify(input(366, 90.0, 0.0)).is_none());
        assert_eq!(c.current_state(), AttentionState::Focus);
    }

    #[test]
    fn test_confirmed_changes_respect_hold_duration() {
        let mut c = classifier(3, None);
        let mut confirmations = Vec::new();

        // 3 focus frames, then 6 distract frames
        for i in 0u64..9 {
            let score = if i < 3 { 90.0 } else { 10.0 };
            if let Some(r) = c.classify(input(i * 66, score, 0.0)) {
                confirmations.push((i, r.state));
            }
        }

        assert_eq!(
            confirmations,
            vec![(2, AttentionState::Focus), (5, AttentionState::Distract)]
        );
    }

    #[test]
    fn test_reaffirmation_paced_by_interval() {
        let mut c = classifier(1, Some(1_000));

        // First frame confirms focus and emits
        assert!(c.classify(input(0, 90.0, 0.0)).is_some());

        // Unchanged frames inside the interval are suppressed
        assert!(c.classify(input(300, 91.0, 0.0)).is_none());
        assert!(c.classify(input(600, 92.0, 0.0)).is_none());

        // Past the interval: one re-affirmation, no reasons
        let record = c.classify(input(1_100, 93.0, 0.0)).unwrap();
        assert_eq!(record.state, AttentionState::Focus);
        assert!(record.reasons.is_empty());
    }

    #[test]
    fn test_emitted_timestamps_never_decrease() {
        let mut c = classifier(1, None);
        let first = c.classify(input(5_000, 90.0, 0.0)).unwrap();

        // Sensor clock stutters backwards; emitted timestamp holds
        let second = c.classify(input(4_000, 10.0, 0.0)).unwrap();
        assert!(second.timestamp_ms >= first.timestamp_ms);
    }

    #[test]
    fn test_state_queryable_without_emission() {
        let mut c = classifier(1, None);
        c.classify(input(0, 90.0, 0.0));
        c.classify(input(66, 91.5, 0.0));
        assert_eq!(c.current_state(), AttentionState::Focus);
        assert!((c.current_score() - 91.5).abs() < 1e-6);
    }

    #[test]
    fn test_reset_returns_to_transition() {
        let mut c = classifier(1, None);
        c.classify(input(0, 90.0, 0.0));
        assert_eq!(c.current_state(), AttentionState::Focus);

        c.reset();
        assert_eq!(c.current_state(), AttentionState::Transition);
        assert_eq!(c.current_score(), 0.0);
    }
}
