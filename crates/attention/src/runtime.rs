//! Async pipeline runtime
//!
//! Drives an engine from a frame channel plus a command channel. One
//! frame is fully processed before the next is accepted; there is no
//! internal frame queueing beyond the channel itself (rate limiting is
//! the sensor's job). A calibration command that never sees its
//! sampling window elapse is force-resolved as a timeout instead of
//! hanging its caller.

use crate::calibration::{Baseline, CalibrationError};
use crate::engine::AttentionEngine;
use crate::zone::FocusZone;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};
use vision_frame::VisionFrame;

/// Extra wall-clock slack granted past the sampling window before a
/// calibration is declared stalled
const CALIBRATION_GRACE_MS: u64 = 2_000;

/// Commands accepted by the running pipeline
#[derive(Debug)]
pub enum PipelineCommand {
    /// Run a calibration phase and reply with its outcome
    Calibrate {
        duration_ms: u64,
        reply: oneshot::Sender<Result<Baseline, CalibrationError>>,
    },

    /// Clear all windows and smoothing state
    Reset,

    /// Replace the focus zone
    SetZone(Option<FocusZone>),
}

/// Run the pipeline until the frame channel closes
pub async fn run(
    mut engine: AttentionEngine,
    mut frames: mpsc::Receiver<VisionFrame>,
    mut commands: mpsc::Receiver<PipelineCommand>,
) {
    info!("attention pipeline running");

    let mut pending_reply: Option<oneshot::Sender<Result<Baseline, CalibrationError>>> = None;
    let mut deadline = Box::pin(tokio::time::sleep(Duration::from_secs(3600)));
    let mut deadline_armed = false;
    let mut commands_open = true;

    loop {
        tokio::select! {
            maybe_frame = frames.recv() => {
                match maybe_frame {
                    Some(frame) => {
                        engine.process_frame(&frame);

                        // Calibration concluded during this frame?
                        if pending_reply.is_some() && !engine.calibration_active() {
                            let result = engine
                                .last_calibration()
                                .unwrap_or(Err(CalibrationError::InsufficientSamples));
                            if let Some(reply) = pending_reply.take() {
                                let _ = reply.send(result);
                            }
                            deadline_armed = false;
                        }
                    }
                    None => break,
                }
            }

            maybe_cmd = commands.recv(), if commands_open => {
                match maybe_cmd {
                    Some(PipelineCommand::Calibrate { duration_ms, reply }) => {
                        // A newer calibration displaces a pending one
                        if let Some(stale) = pending_reply.take() {
                            let _ = stale.send(Err(CalibrationError::Timeout));
                        }
                        engine.begin_calibration(duration_ms);
                        pending_reply = Some(reply);
                        deadline.as_mut().reset(
                            tokio::time::Instant::now()
                                + Duration::from_millis(duration_ms + CALIBRATION_GRACE_MS),
                        );
                        deadline_armed = true;
                    }
                    Some(PipelineCommand::Reset) => engine.reset(),
                    Some(PipelineCommand::SetZone(zone)) => engine.set_zone(zone),
                    None => {
                        debug!("command channel closed");
                        commands_open = false;
                    }
                }
            }

            () = deadline.as_mut(), if deadline_armed => {
                engine.abort_calibration();
                if let Some(reply) = pending_reply.take() {
                    let _ = reply.send(Err(CalibrationError::Timeout));
                }
                deadline_armed = false;
            }
        }
    }

    info!("frame channel closed; attention pipeline stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AttentionConfig;
    use face_geometry::Point2;

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

    fn frame(ts: u64) -> VisionFrame {
        VisionFrame::new(ts, 0.9, eye(1.0), eye(1.0))
    }

    #[tokio::test]
    async fn test_calibrate_command_round_trips() {
        let engine = AttentionEngine::new(AttentionConfig::default());
        let (frame_tx, frame_rx) = mpsc::channel(32);
        let (cmd_tx, cmd_rx) = mpsc::channel(8);

        let pipeline = tokio::spawn(run(engine, frame_rx, cmd_rx));

        let (reply_tx, reply_rx) = oneshot::channel();
        cmd_tx
            .send(PipelineCommand::Calibrate {
                duration_ms: 500,
                reply: reply_tx,
            })
            .await
            .unwrap();

        // Let the idle pipeline pick up the command before frames land
        tokio::time::sleep(Duration::from_millis(50)).await;

        // Frame timestamps walk past the sampling window
        for ts in (0..700u64).step_by(66) {
            frame_tx.send(frame(ts)).await.unwrap();
        }

        let baseline = reply_rx.await.unwrap().unwrap();
        assert!(baseline.closure_threshold > 0.0);

        drop(frame_tx);
        pipeline.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_calibration_times_out() {
        let engine = AttentionEngine::new(AttentionConfig::default());
        let (frame_tx, frame_rx) = mpsc::channel::<VisionFrame>(8);
        let (cmd_tx, cmd_rx) = mpsc::channel(8);

        let pipeline = tokio::spawn(run(engine, frame_rx, cmd_rx));

        let (reply_tx, reply_rx) = oneshot::channel();
        cmd_tx
            .send(PipelineCommand::Calibrate {
                duration_ms: 500,
                reply: reply_tx,
            })
            .await
            .unwrap();

        // No frames arrive; the grace deadline resolves the command
        assert_eq!(reply_rx.await.unwrap(), Err(CalibrationError::Timeout));

        drop(frame_tx);
        pipeline.await.unwrap();
    }

    #[tokio::test]
    async fn test_reset_command_applies() {
        let engine = AttentionEngine::new(AttentionConfig::default());
        let (frame_tx, frame_rx) = mpsc::channel(32);
        let (cmd_tx, cmd_rx) = mpsc::channel(8);

        let pipeline = tokio::spawn(run(engine, frame_rx, cmd_rx));

        for ts in (0..500u64).step_by(66) {
            frame_tx.send(frame(ts)).await.unwrap();
        }
        cmd_tx.send(PipelineCommand::Reset).await.unwrap();

        drop(cmd_tx);
        drop(frame_tx);
        pipeline.await.unwrap();
    }
}
