//! Windowed aggregators
//!
//! PERCLOS over a sliding time window and duration-filtered blink
//! detection. Both windows are timestamp-pruned on every insert, so
//! stale samples age out naturally after a pause.

use crate::config::BlinkConfig;
use crate::types::BlinkEvent;
use std::collections::VecDeque;

/// One eye-closure observation
#[derive(Debug, Clone, Copy)]
struct EyeSample {
    timestamp_ms: u64,
    closed: bool,
    valid: bool,
}

/// PERCLOS: fraction of the trailing window with eyes classified closed.
///
/// Invalid frames are recorded but excluded from the denominator, so a
/// dropout neither raises nor lowers the ratio.
#[derive(Debug)]
pub struct PerclosWindow {
    window_ms: u64,
    samples: VecDeque<EyeSample>,
}

impl PerclosWindow {
    pub fn new(window_ms: u64) -> Self {
        Self {
            window_ms,
            samples: VecDeque::with_capacity(1024),
        }
    }

    /// Record one frame and evict everything older than the window
    pub fn push(&mut self, timestamp_ms: u64, closed: bool, valid: bool) {
        self.samples.push_back(EyeSample {
            timestamp_ms,
            closed,
            valid,
        });

        let cutoff = timestamp_ms.saturating_sub(self.window_ms);
        while let Some(front) = self.samples.front() {
            if front.timestamp_ms < cutoff {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    /// Closed-count over valid-count within the window; 0.0 with no
    /// valid entries.
    pub fn perclos(&self) -> f32 {
        let mut valid = 0u32;
        let mut closed = 0u32;
        for sample in &self.samples {
            if sample.valid {
                valid += 1;
                if sample.closed {
                    closed += 1;
                }
            }
        }

        if valid == 0 {
            0.0
        } else {
            closed as f32 / valid as f32
        }
    }

    /// Samples currently held (valid and invalid)
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn reset(&mut self) {
        self.samples.clear();
    }
}

/// Blink detection: a closed-to-open transition whose closure duration
/// falls inside the plausible band. Sustained closure (PERCLOS
/// territory) and single-frame noise are both filtered out.
#[derive(Debug)]
pub struct BlinkDetector {
    cfg: BlinkConfig,
    closed_since: Option<u64>,
    blinks: VecDeque<BlinkEvent>,
}

impl BlinkDetector {
    pub fn new(cfg: BlinkConfig) -> Self {
        Self {
            cfg,
            closed_since: None,
            blinks: VecDeque::new(),
        }
    }

    /// Feed one closure observation; returns the blink completed on
    /// this frame, if the reopening qualified.
    pub fn update(&mut self, timestamp_ms: u64, closed: bool) -> Option<BlinkEvent> {
        let event = match (closed, self.closed_since) {
            (true, None) => {
                self.closed_since = Some(timestamp_ms);
                None
            }
            (false, Some(start)) => {
                self.closed_since = None;
                let duration_ms = timestamp_ms.saturating_sub(start);
                if (self.cfg.min_duration_ms..=self.cfg.max_duration_ms).contains(&duration_ms) {
                    let blink = BlinkEvent {
                        timestamp_ms,
                        duration_ms,
                    };
                    self.blinks.push_back(blink);
                    Some(blink)
                } else {
                    None
                }
            }
            _ => None,
        };

        let cutoff = timestamp_ms.saturating_sub(self.cfg.window_ms);
        while let Some(front) = self.blinks.front() {
            if front.timestamp_ms < cutoff {
                self.blinks.pop_front();
            } else {
                break;
            }
        }

        event
    }

    /// Accepted blinks in the trailing window (count per minute when
    /// the window is 60 s)
    pub fn rate(&self) -> u32 {
        self.blinks.len() as u32
    }

    pub fn reset(&mut self) {
        self.closed_since = None;
        self.blinks.clear();
    }
}
